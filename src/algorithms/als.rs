use crate::algorithms::{initializer, ColdStartPolicy, LatentFactorModel, Strategy};
use crate::config::FactorizationConfig;
use crate::data::InteractionDataset;
use crate::error::{RecError, Result};
use crate::services::training::{ComputeBackend, TrainingReport};
use crate::utils::metrics;
use crate::utils::validation::validate_factorization_config;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Explicit-feedback matrix factorization fitted by alternating least squares.
///
/// `score(u, i) = dot(user_factors[u], item_factors[i])`. Each half-step
/// solves one ridge regression per row with weighted-lambda regularization
/// (`regularization * n_ratings(row)`).
#[derive(Debug, Clone)]
pub struct AlternatingLeastSquares {
    user_factors: DMatrix<f32>,
    item_factors: DMatrix<f32>,
}

impl AlternatingLeastSquares {
    pub fn fit(
        dataset: &InteractionDataset,
        config: &FactorizationConfig,
        seed: Option<u64>,
    ) -> Result<(Self, TrainingReport)> {
        if dataset.is_empty() {
            return Err(RecError::EmptyDataset);
        }
        validate_factorization_config(config)?;

        let started = Instant::now();
        info!(
            "Fitting ALS: {} users, {} items, {} ratings, rank {}, {} iterations",
            dataset.num_users(),
            dataset.num_items(),
            dataset.len(),
            config.rank,
            config.iterations
        );

        let mut rng = initializer::training_rng(seed);
        let mut model = Self {
            user_factors: initializer::unit_norm_rows(&mut rng, dataset.num_users(), config.rank),
            item_factors: initializer::unit_norm_rows(&mut rng, dataset.num_items(), config.rank),
        };

        let by_user = dataset.by_user();
        let by_item = dataset.by_item();
        let mut loss_history = Vec::with_capacity(config.iterations);

        for iteration in 0..config.iterations {
            model.item_factors = solve_rows(&by_item, &model.user_factors, config)?;
            model.user_factors = solve_rows(&by_user, &model.item_factors, config)?;

            let rmse = metrics::root_mean_squared_error(&model, dataset.interactions());
            debug!("ALS iteration {}: training rmse {:.6}", iteration + 1, rmse);
            loss_history.push(rmse);
        }

        let training_rmse = match loss_history.last() {
            Some(&rmse) => rmse,
            None => metrics::root_mean_squared_error(&model, dataset.interactions()),
        };
        let report = TrainingReport::new(
            Strategy::Factorization,
            loss_history,
            training_rmse,
            started.elapsed(),
        );
        info!(
            "ALS fitted in {:?}, training rmse {:.4}",
            report.elapsed, report.training_rmse
        );

        Ok((model, report))
    }
}

/// Solves every row of one side while the other side's factors stay fixed.
fn solve_rows(
    rows: &[Vec<(usize, f32)>],
    fixed: &DMatrix<f32>,
    config: &FactorizationConfig,
) -> Result<DMatrix<f32>> {
    let solve = |ratings: &Vec<(usize, f32)>| solve_row(ratings, fixed, config.regularization);

    let solved: Vec<DVector<f32>> = match config.backend {
        ComputeBackend::Default => rows.iter().map(solve).collect::<Result<_>>()?,
        ComputeBackend::Accelerated => rows.par_iter().map(solve).collect::<Result<_>>()?,
    };

    let rank = fixed.ncols();
    Ok(DMatrix::from_fn(solved.len(), rank, |r, c| solved[r][c]))
}

/// `(Y^T Y + lambda * n * I) x = Y^T r` over the rows of `fixed` this row rated.
fn solve_row(
    ratings: &[(usize, f32)],
    fixed: &DMatrix<f32>,
    regularization: f64,
) -> Result<DVector<f32>> {
    let rank = fixed.ncols();
    if ratings.is_empty() {
        return Ok(DVector::zeros(rank));
    }

    let mut gram = DMatrix::<f64>::zeros(rank, rank);
    let mut rhs = DVector::<f64>::zeros(rank);

    for &(other, rating) in ratings {
        let factors: DVector<f64> = fixed.row(other).transpose().map(f64::from);
        gram.ger(1.0, &factors, &factors, 1.0);
        rhs.axpy(f64::from(rating), &factors, 1.0);
    }

    let ridge = regularization * ratings.len() as f64;
    for d in 0..rank {
        gram[(d, d)] += ridge;
    }

    let solution = match gram.clone().cholesky() {
        Some(cholesky) => cholesky.solve(&rhs),
        None => gram.lu().solve(&rhs).ok_or_else(|| {
            RecError::Numerical("singular normal equations in ALS row solve".to_string())
        })?,
    };

    Ok(solution.map(|x| x as f32))
}

impl LatentFactorModel for AlternatingLeastSquares {
    fn strategy(&self) -> Strategy {
        Strategy::Factorization
    }

    fn cold_start_policy(&self) -> ColdStartPolicy {
        ColdStartPolicy::Drop
    }

    fn num_users(&self) -> usize {
        self.user_factors.nrows()
    }

    fn num_items(&self) -> usize {
        self.item_factors.nrows()
    }

    fn score(&self, user: usize, item: usize) -> f32 {
        self.user_factors.row(user).dot(&self.item_factors.row(item))
    }

    fn score_items(&self, user: usize) -> Vec<f32> {
        let user_vector = self.user_factors.row(user).transpose();
        (&self.item_factors * user_vector).iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RatingRecord;

    fn sample_dataset() -> InteractionDataset {
        let records = vec![
            RatingRecord::new(1, 1, 4.0),
            RatingRecord::new(1, 2, 2.0),
            RatingRecord::new(1, 3, 5.0),
            RatingRecord::new(2, 1, 5.0),
            RatingRecord::new(2, 2, 4.0),
            RatingRecord::new(3, 2, 5.0),
            RatingRecord::new(3, 3, 4.0),
        ];
        InteractionDataset::from_records(&records).unwrap()
    }

    #[test]
    fn test_fit_reduces_training_error() {
        let dataset = sample_dataset();
        let config = FactorizationConfig {
            rank: 4,
            iterations: 10,
            ..FactorizationConfig::default()
        };
        let (model, report) =
            AlternatingLeastSquares::fit(&dataset, &config, Some(11)).unwrap();

        assert_eq!(model.user_factors.ncols(), 4);
        assert_eq!(model.num_users(), 3);
        assert_eq!(model.num_items(), 3);
        assert_eq!(report.loss_history.len(), 10);
        assert!(report.training_rmse < 0.5, "rmse {}", report.training_rmse);
    }

    #[test]
    fn test_loss_history_is_rmse_per_iteration() {
        let dataset = sample_dataset();
        let (model, report) =
            AlternatingLeastSquares::fit(&dataset, &FactorizationConfig::default(), Some(3))
                .unwrap();

        let mse = metrics::mean_squared_error(&model, dataset.interactions());
        assert_eq!(report.final_loss(), Some(report.training_rmse));
        assert!((report.training_rmse - mse.sqrt()).abs() < 1e-9);
        assert!(report.loss_history.iter().all(|rmse| rmse.is_finite() && *rmse >= 0.0));
    }

    #[test]
    fn test_score_items_matches_score() {
        let dataset = sample_dataset();
        let (model, _) =
            AlternatingLeastSquares::fit(&dataset, &FactorizationConfig::default(), Some(5))
                .unwrap();

        let batch = model.score_items(1);
        for (item, score) in batch.iter().enumerate() {
            assert!((score - model.score(1, item)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_backends_agree() {
        let dataset = sample_dataset();
        let default = FactorizationConfig::default();
        let accelerated = FactorizationConfig {
            backend: ComputeBackend::Accelerated,
            ..FactorizationConfig::default()
        };
        let (a, _) = AlternatingLeastSquares::fit(&dataset, &default, Some(3)).unwrap();
        let (b, _) = AlternatingLeastSquares::fit(&dataset, &accelerated, Some(3)).unwrap();
        assert_eq!(a.user_factors, b.user_factors);
        assert_eq!(a.item_factors, b.item_factors);
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = InteractionDataset::from_records(&[]).unwrap();
        let result = AlternatingLeastSquares::fit(&dataset, &FactorizationConfig::default(), None);
        assert!(matches!(result, Err(RecError::EmptyDataset)));
    }

    #[test]
    fn test_zero_rank_rejected() {
        let config = FactorizationConfig {
            rank: 0,
            ..FactorizationConfig::default()
        };
        let result = AlternatingLeastSquares::fit(&sample_dataset(), &config, None);
        assert!(matches!(result, Err(RecError::InvalidConfig(_))));
    }
}
