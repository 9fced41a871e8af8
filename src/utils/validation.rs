use crate::config::{Config, EmbeddingConfig, FactorizationConfig};
use crate::error::{RecError, Result};
use crate::models::RatingRecord;

fn invalid(message: impl Into<String>) -> RecError {
    RecError::InvalidConfig(message.into())
}

pub fn validate_config(config: &Config) -> Result<()> {
    validate_factorization_config(&config.model.factorization)?;
    validate_embedding_config(&config.model.embedding)?;

    if config.recommendation.default_k == 0 {
        return Err(invalid("recommendation.default_k must be greater than 0"));
    }

    if config.server.workers == 0 {
        return Err(invalid("server.workers must be greater than 0"));
    }

    Ok(())
}

pub fn validate_factorization_config(config: &FactorizationConfig) -> Result<()> {
    if config.rank == 0 {
        return Err(invalid("factorization.rank must be greater than 0"));
    }

    if !config.regularization.is_finite() || config.regularization < 0.0 {
        return Err(invalid("factorization.regularization must be a non-negative number"));
    }

    Ok(())
}

pub fn validate_embedding_config(config: &EmbeddingConfig) -> Result<()> {
    if config.dim == 0 {
        return Err(invalid("embedding.dim must be greater than 0"));
    }

    if config.hidden_dims.iter().any(|&h| h == 0) {
        return Err(invalid("embedding.hidden_dims must all be greater than 0"));
    }

    if config.epochs == 0 {
        return Err(invalid("embedding.epochs must be greater than 0"));
    }

    if !config.learning_rate.is_finite() || config.learning_rate <= 0.0 {
        return Err(invalid("embedding.learning_rate must be a positive number"));
    }

    if config.chunk_size == 0 {
        return Err(invalid("embedding.chunk_size must be greater than 0"));
    }

    Ok(())
}

pub fn validate_rating_record(record: &RatingRecord) -> Result<()> {
    if !record.rating.is_finite() {
        return Err(RecError::InvalidRating {
            user_id: record.user_id,
            item_id: record.item_id,
            rating: record.rating,
        });
    }

    Ok(())
}
