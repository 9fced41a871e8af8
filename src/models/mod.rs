use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier as it appears in the source ratings (user id or movie id).
pub type RawId = i64;

/// One row of the ratings table handed over by the ETL side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub user_id: RawId,
    pub item_id: RawId,
    pub rating: f32,
}

/// A rating expressed in dense indices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user: usize,
    pub item: usize,
    pub rating: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_id: RawId,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub user_id: RawId,
    pub recommendations: Vec<Recommendation>,
    pub generated_at: DateTime<Utc>,
}

impl RatingRecord {
    pub fn new(user_id: RawId, item_id: RawId, rating: f32) -> Self {
        Self {
            user_id,
            item_id,
            rating,
        }
    }
}

impl RecommendationResponse {
    pub fn new(user_id: RawId, recommendations: Vec<Recommendation>) -> Self {
        Self {
            user_id,
            recommendations,
            generated_at: Utc::now(),
        }
    }
}
