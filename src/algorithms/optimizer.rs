use nalgebra::DMatrix;
use std::collections::HashMap;

/// Adam over a set of named parameter matrices.
///
/// Call [`Adam::begin_step`] once per optimization step, then
/// [`Adam::update`] for every parameter. Moment buffers are created lazily
/// per key.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: i32,
    m: HashMap<String, DMatrix<f32>>,
    v: HashMap<String, DMatrix<f32>>,
}

impl Adam {
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            t: 0,
            m: HashMap::new(),
            v: HashMap::new(),
        }
    }

    pub fn with_learning_rate(learning_rate: f64) -> Self {
        Self::new(learning_rate, 0.9, 0.999, 1e-8)
    }

    pub fn begin_step(&mut self) {
        self.t += 1;
    }

    pub fn update(&mut self, key: &str, params: &mut DMatrix<f32>, gradients: &DMatrix<f32>) {
        let (rows, cols) = params.shape();
        let beta1 = self.beta1 as f32;
        let beta2 = self.beta2 as f32;
        let t = self.t.max(1);

        let m = self
            .m
            .entry(key.to_string())
            .or_insert_with(|| DMatrix::zeros(rows, cols));
        *m = m.scale(beta1) + gradients.scale(1.0 - beta1);

        let v = self
            .v
            .entry(key.to_string())
            .or_insert_with(|| DMatrix::zeros(rows, cols));
        *v = v.scale(beta2) + gradients.component_mul(gradients).scale(1.0 - beta2);

        let m_correction = 1.0 / (1.0 - beta1.powi(t));
        let v_correction = 1.0 / (1.0 - beta2.powi(t));
        let lr = self.learning_rate as f32;
        let epsilon = self.epsilon as f32;

        params.zip_zip_apply(m, v, |p, m, v| {
            let m_hat = m * m_correction;
            let v_hat = v * v_correction;
            *p -= lr * m_hat / (v_hat.sqrt() + epsilon);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_step_moves_by_learning_rate() {
        let mut adam = Adam::with_learning_rate(0.1);
        let mut params = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        let gradients = DMatrix::from_row_slice(1, 3, &[0.5, -2.0, 0.0]);

        adam.begin_step();
        adam.update("w", &mut params, &gradients);

        // Bias-corrected first step is lr * sign(g).
        assert!((params[(0, 0)] - 0.9).abs() < 1e-4);
        assert!((params[(0, 1)] - 2.1).abs() < 1e-4);
        assert!((params[(0, 2)] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_minimizes_quadratic() {
        let mut adam = Adam::with_learning_rate(0.05);
        let mut x = DMatrix::from_element(1, 1, 4.0f32);
        for _ in 0..500 {
            let grad = x.scale(2.0);
            adam.begin_step();
            adam.update("x", &mut x, &grad);
        }
        assert!(x[(0, 0)].abs() < 0.1);
    }

    #[test]
    fn test_moment_buffers_are_per_key() {
        let mut adam = Adam::with_learning_rate(0.001);
        let mut a = DMatrix::from_element(2, 2, 1.0f32);
        let mut b = DMatrix::from_element(1, 3, 1.0f32);

        adam.begin_step();
        adam.update("a", &mut a, &DMatrix::from_element(2, 2, 1.0));
        adam.update("b", &mut b, &DMatrix::from_element(1, 3, -1.0));

        assert!(a.iter().all(|x| (x - 0.999).abs() < 1e-5));
        assert!(b.iter().all(|x| (x - 1.001).abs() < 1e-5));
    }
}
