use crate::algorithms::Strategy;
use crate::services::training::ComputeBackend;
use serde::{Deserialize, Serialize};
use std::net::{AddrParseError, SocketAddr};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub model: ModelConfig,
    pub recommendation: RecommendationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Ratings CSV produced by the ETL job. The bundled sample is used when unset.
    pub ratings_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub strategy: Strategy,
    /// Fixes the random initialization of factor tables and network weights.
    pub seed: Option<u64>,
    pub factorization: FactorizationConfig,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorizationConfig {
    pub rank: usize,
    pub iterations: usize,
    pub regularization: f64,
    pub backend: ComputeBackend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub dim: usize,
    pub hidden_dims: [usize; 2],
    pub epochs: usize,
    pub learning_rate: f64,
    pub backend: ComputeBackend,
    /// Interactions per gradient chunk when the accelerated backend is active.
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub default_k: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            workers: num_cpus::get(),
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self { default_k: 10 }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Factorization,
            seed: None,
            factorization: FactorizationConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl Default for FactorizationConfig {
    fn default() -> Self {
        Self {
            rank: 10,
            iterations: 5,
            regularization: 0.01,
            backend: ComputeBackend::Default,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dim: 32,
            hidden_dims: [64, 32],
            epochs: 10,
            learning_rate: 0.001,
            backend: ComputeBackend::Default,
            chunk_size: 4096,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("MOVIEREC")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        crate::utils::validation::validate_config(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hyperparameters() {
        let config = Config::default();
        assert_eq!(config.model.strategy, Strategy::Factorization);
        assert_eq!(config.model.factorization.iterations, 5);
        assert_eq!(config.model.factorization.rank, 10);
        assert!((config.model.factorization.regularization - 0.01).abs() < 1e-12);
        assert_eq!(config.model.embedding.dim, 32);
        assert_eq!(config.model.embedding.epochs, 10);
        assert_eq!(config.recommendation.default_k, 10);
    }

    #[test]
    fn test_from_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
        let config = Config::from_file(path).unwrap();
        assert_eq!(config.model.embedding.hidden_dims, [64, 32]);
        assert_eq!(config.model.factorization.backend, ComputeBackend::Default);
        assert!(config.data.ratings_path.is_none());
    }

    #[test]
    fn test_socket_addr() {
        let config = Config::default();
        assert_eq!(config.server.socket_addr().unwrap().port(), 8000);
    }
}
