use crate::error::{RecError, Result};
use crate::models::{RatingRecord, RawId};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Reads a MovieLens-style `ratings.csv` (`userId,movieId,rating,timestamp`).
///
/// The first non-blank line must be the header. Columns after the rating are
/// ignored.
pub fn load_ratings_csv(path: &Path) -> Result<Vec<RatingRecord>> {
    let contents = std::fs::read_to_string(path)?;
    let records = parse_ratings_csv(&contents)?;
    info!("Loaded {} ratings from {}", records.len(), path.display());
    Ok(records)
}

pub fn parse_ratings_csv(contents: &str) -> Result<Vec<RatingRecord>> {
    let mut records = Vec::new();
    let mut lines = contents
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    if let Some((line_no, header)) = lines.next() {
        let first = header.split(',').next().unwrap_or_default().trim();
        if !first.eq_ignore_ascii_case("userId") {
            return Err(RecError::DataLoad {
                line: line_no,
                reason: format!("Missing userId,movieId,rating header, found {:?}", header),
            });
        }
    }

    for (line_no, line) in lines {
        let mut parts = line.split(',').map(str::trim);
        let user_id: RawId = parse_field(parts.next(), "userId", line_no)?;
        let item_id: RawId = parse_field(parts.next(), "movieId", line_no)?;
        let rating: f32 = parse_field(parts.next(), "rating", line_no)?;

        records.push(RatingRecord::new(user_id, item_id, rating));
    }

    Ok(records)
}

fn parse_field<T: FromStr>(field: Option<&str>, name: &str, line: usize) -> Result<T> {
    let raw = field.ok_or_else(|| RecError::DataLoad {
        line,
        reason: format!("Missing {}", name),
    })?;

    raw.parse().map_err(|_| RecError::DataLoad {
        line,
        reason: format!("Invalid {}: {:?}", name, raw),
    })
}

/// The small ratings table the service falls back to when no file is configured.
pub fn sample_ratings() -> Vec<RatingRecord> {
    vec![
        RatingRecord::new(1, 1, 4.0),
        RatingRecord::new(1, 2, 2.0),
        RatingRecord::new(1, 3, 5.0),
        RatingRecord::new(2, 1, 5.0),
        RatingRecord::new(2, 2, 4.0),
        RatingRecord::new(3, 2, 5.0),
        RatingRecord::new(3, 3, 4.0),
    ]
}
