pub mod als;
pub mod initializer;
pub mod neural;
pub mod optimizer;

pub use als::AlternatingLeastSquares;
pub use neural::EmbeddingNetwork;

use crate::config::ModelConfig;
use crate::data::InteractionDataset;
use crate::error::Result;
use crate::services::training::{TrainingLoop, TrainingReport};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which backend learns `score(user, item)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Factorization,
    EmbeddingNetwork,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Factorization => write!(f, "factorization"),
            Strategy::EmbeddingNetwork => write!(f, "embedding_network"),
        }
    }
}

/// What a query for an identifier unseen at training time produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColdStartPolicy {
    /// The entity is left out of candidate generation: an empty result.
    Drop,
    /// The unknown identifier is reported to the caller.
    Error,
}

/// A trained scoring function over dense user and item indices.
///
/// Implementations are immutable once fitted and may be shared across
/// threads without locking.
pub trait LatentFactorModel: Send + Sync {
    fn strategy(&self) -> Strategy;

    fn cold_start_policy(&self) -> ColdStartPolicy;

    fn num_users(&self) -> usize;

    fn num_items(&self) -> usize;

    fn score(&self, user: usize, item: usize) -> f32;

    /// Scores for every item index, in index order.
    fn score_items(&self, user: usize) -> Vec<f32> {
        (0..self.num_items())
            .map(|item| self.score(user, item))
            .collect()
    }
}

/// Fits the configured strategy on `dataset`.
pub fn fit_model(
    config: &ModelConfig,
    dataset: &InteractionDataset,
) -> Result<(Box<dyn LatentFactorModel>, TrainingReport)> {
    match config.strategy {
        Strategy::Factorization => {
            let (model, report) =
                AlternatingLeastSquares::fit(dataset, &config.factorization, config.seed)?;
            Ok((Box::new(model), report))
        }
        Strategy::EmbeddingNetwork => {
            let training_loop = TrainingLoop::new(config.embedding.clone());
            let (model, report) = training_loop.run(dataset, config.seed)?;
            Ok((Box::new(model), report))
        }
    }
}
