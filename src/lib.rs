pub mod algorithms;
pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{RecError, Result};
pub use models::*;

use services::recommendation::RankingService;
use services::training::{TrainingReport, TrainingService};
use std::sync::Arc;

/// Read-only state shared by every request handler. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ranking_service: Arc<RankingService>,
}

impl AppState {
    /// Loads the ratings snapshot and trains the configured model to completion.
    pub fn new(config: Config) -> anyhow::Result<(Self, TrainingReport)> {
        let config = Arc::new(config);
        let training_service = TrainingService::new(config.clone());

        let records = training_service.load_records()?;
        let (ranking_service, report) = training_service.train(&records)?;

        Ok((
            Self {
                config,
                ranking_service: Arc::new(ranking_service),
            },
            report,
        ))
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
