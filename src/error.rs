use crate::data::encoder::EntityKind;
use crate::models::RawId;
use thiserror::Error;

/// Errors raised while building, training or querying a recommender.
#[derive(Error, Debug)]
pub enum RecError {
    /// A query referenced an identifier that was not present at fit time.
    #[error("Unknown {kind} id: {raw_id}")]
    UnknownId { kind: EntityKind, raw_id: RawId },

    /// Fitting was attempted on zero interactions.
    #[error("Cannot train on an empty interaction dataset")]
    EmptyDataset,

    #[error("Invalid k: {0} (must be greater than 0)")]
    InvalidK(i64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid rating {rating} for user {user_id} and item {item_id}")]
    InvalidRating {
        user_id: RawId,
        item_id: RawId,
        rating: f32,
    },

    #[error("Parse error at line {line}: {reason}")]
    DataLoad { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Numerical failure: {0}")]
    Numerical(String),

    /// The encoders and the model were built from different vocabularies.
    #[error("{kind} encoder knows {encoder} ids but the model has {model} rows")]
    DimensionMismatch {
        kind: EntityKind,
        encoder: usize,
        model: usize,
    },
}

pub type Result<T> = std::result::Result<T, RecError>;
