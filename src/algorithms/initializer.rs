use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

/// Builds the RNG used for one training run.
pub fn training_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Box-Muller standard normal sample.
fn standard_normal(rng: &mut StdRng) -> f32 {
    let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
    let u2: f32 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

pub fn normal(rng: &mut StdRng, rows: usize, cols: usize, mean: f32, std_dev: f32) -> DMatrix<f32> {
    DMatrix::from_fn(rows, cols, |_, _| standard_normal(rng) * std_dev + mean)
}

pub fn uniform(rng: &mut StdRng, rows: usize, cols: usize, low: f32, high: f32) -> DMatrix<f32> {
    DMatrix::from_fn(rows, cols, |_, _| rng.gen_range(low..high))
}

/// `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`, the usual default for dense layers.
pub fn fan_in_uniform(rng: &mut StdRng, fan_in: usize, fan_out: usize) -> DMatrix<f32> {
    let limit = 1.0 / (fan_in.max(1) as f32).sqrt();
    uniform(rng, fan_in, fan_out, -limit, limit)
}

pub fn fan_in_uniform_bias(rng: &mut StdRng, fan_in: usize, fan_out: usize) -> DMatrix<f32> {
    let limit = 1.0 / (fan_in.max(1) as f32).sqrt();
    uniform(rng, 1, fan_out, -limit, limit)
}

/// Gaussian rows scaled to unit length.
pub fn unit_norm_rows(rng: &mut StdRng, rows: usize, cols: usize) -> DMatrix<f32> {
    let mut matrix = normal(rng, rows, cols, 0.0, 1.0);
    for mut row in matrix.row_iter_mut() {
        let norm = row.norm();
        if norm > 1e-8 {
            row /= norm;
        }
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let a = normal(&mut training_rng(Some(7)), 4, 3, 0.0, 1.0);
        let b = normal(&mut training_rng(Some(7)), 4, 3, 0.0, 1.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fan_in_uniform_range() {
        let weights = fan_in_uniform(&mut training_rng(Some(1)), 64, 32);
        assert_eq!(weights.shape(), (64, 32));
        let limit = 1.0 / 8.0;
        assert!(weights.iter().all(|w| *w >= -limit && *w <= limit));
    }

    #[test]
    fn test_unit_norm_rows() {
        let matrix = unit_norm_rows(&mut training_rng(Some(3)), 5, 8);
        for row in matrix.row_iter() {
            assert!((row.norm() - 1.0).abs() < 1e-5);
        }
    }
}
