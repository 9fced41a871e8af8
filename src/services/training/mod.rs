use crate::algorithms::neural::{EmbeddingNetwork, Gradients};
use crate::algorithms::optimizer::Adam;
use crate::algorithms::{fit_model, initializer, Strategy};
use crate::config::{Config, EmbeddingConfig};
use crate::data::loader::{load_ratings_csv, sample_ratings};
use crate::data::InteractionDataset;
use crate::error::{RecError, Result};
use crate::models::{Interaction, RatingRecord};
use crate::services::recommendation::RankingService;
use crate::utils::metrics;
use crate::utils::validation::validate_embedding_config;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Where the numeric work of a training run executes. Both backends fit the
/// same model; `Accelerated` spreads row solves and gradient chunks over the
/// rayon thread pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeBackend {
    #[default]
    Default,
    Accelerated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub strategy: Strategy,
    /// One entry per pass. Embedding network: training MSE measured before
    /// that epoch's Adam step. ALS: training RMSE after each iteration.
    pub loss_history: Vec<f64>,
    pub training_rmse: f64,
    pub elapsed: Duration,
}

impl TrainingReport {
    pub fn new(
        strategy: Strategy,
        loss_history: Vec<f64>,
        training_rmse: f64,
        elapsed: Duration,
    ) -> Self {
        Self {
            strategy,
            loss_history,
            training_rmse,
            elapsed,
        }
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.loss_history.last().copied()
    }
}

/// Full-batch Adam training for [`EmbeddingNetwork`].
///
/// Runs exactly `epochs` steps; there is no early stopping and no validation
/// split. The loss logged for an epoch is the MSE before that epoch's step.
#[derive(Debug, Clone)]
pub struct TrainingLoop {
    config: EmbeddingConfig,
}

impl TrainingLoop {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self { config }
    }

    pub fn run(
        &self,
        dataset: &InteractionDataset,
        seed: Option<u64>,
    ) -> Result<(EmbeddingNetwork, TrainingReport)> {
        if dataset.is_empty() {
            return Err(RecError::EmptyDataset);
        }
        validate_embedding_config(&self.config)?;

        let started = Instant::now();
        info!(
            "Training embedding network: {} users, {} items, {} ratings, dim {}, \
             {} epochs, backend {:?}",
            dataset.num_users(),
            dataset.num_items(),
            dataset.len(),
            self.config.dim,
            self.config.epochs,
            self.config.backend
        );

        let mut rng = initializer::training_rng(seed);
        let mut network = EmbeddingNetwork::new(
            &mut rng,
            dataset.num_users(),
            dataset.num_items(),
            self.config.dim,
            self.config.hidden_dims,
        );
        let mut optimizer = Adam::with_learning_rate(self.config.learning_rate);
        let interactions = dataset.interactions();
        let mut loss_history = Vec::with_capacity(self.config.epochs);

        for epoch in 0..self.config.epochs {
            let (gradients, squared_error) = self.full_batch_gradients(&network, interactions);
            let loss = squared_error / interactions.len() as f64;
            if !loss.is_finite() {
                warn!("Epoch {} produced a non-finite loss", epoch + 1);
            }

            info!("Epoch {}/{}, loss: {:.4}", epoch + 1, self.config.epochs, loss);
            debug!("Epoch {} gradient norm {:.6}", epoch + 1, gradients.norm());

            network.apply_gradients(&mut optimizer, &gradients);
            loss_history.push(loss);
        }

        let report = TrainingReport::new(
            Strategy::EmbeddingNetwork,
            loss_history,
            metrics::root_mean_squared_error(&network, interactions),
            started.elapsed(),
        );
        info!(
            "Embedding network trained in {:?}, training rmse {:.4}",
            report.elapsed, report.training_rmse
        );

        Ok((network, report))
    }

    fn full_batch_gradients(
        &self,
        network: &EmbeddingNetwork,
        interactions: &[Interaction],
    ) -> (Gradients, f64) {
        let total = interactions.len();
        match self.config.backend {
            ComputeBackend::Default => network.gradients(interactions, total),
            ComputeBackend::Accelerated => interactions
                .par_chunks(self.config.chunk_size.max(1))
                .map(|chunk| network.gradients(chunk, total))
                .reduce_with(|(a, loss_a), (b, loss_b)| (a.merge(b), loss_a + loss_b))
                .unwrap_or_else(|| (Gradients::zeros_like(network), 0.0)),
        }
    }
}

/// Builds a servable [`RankingService`] from a ratings snapshot.
pub struct TrainingService {
    config: Arc<Config>,
}

impl TrainingService {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Ratings from the configured CSV, or the bundled sample when none is set.
    pub fn load_records(&self) -> Result<Vec<RatingRecord>> {
        match &self.config.data.ratings_path {
            Some(path) => load_ratings_csv(Path::new(path)),
            None => {
                info!("No ratings path configured, using bundled sample ratings");
                Ok(sample_ratings())
            }
        }
    }

    pub fn train(&self, records: &[RatingRecord]) -> Result<(RankingService, TrainingReport)> {
        let dataset = InteractionDataset::from_records(records)?;
        info!(
            "Training {} model on {} ratings",
            self.config.model.strategy,
            dataset.len()
        );

        let (model, report) = fit_model(&self.config.model, &dataset)?;
        let (users, items) = dataset.into_encoders();
        let default_k = self.config.recommendation.default_k;
        let service = RankingService::new(users, items, model, default_k)?;

        Ok((service, report))
    }
}
