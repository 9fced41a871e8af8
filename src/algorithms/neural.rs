use crate::algorithms::optimizer::Adam;
use crate::algorithms::{initializer, ColdStartPolicy, LatentFactorModel, Strategy};
use crate::models::Interaction;
use nalgebra::DMatrix;
use rand::rngs::StdRng;

/// Learned user and item embeddings scored by a small feed-forward head:
/// `score(u, i) = head(concat(user_emb[u], item_emb[i]))`.
///
/// The head is `Linear(2d, h1) -> ReLU -> Linear(h1, h2) -> ReLU -> Linear(h2, 1)`.
/// Weight matrices are stored `(fan_in, fan_out)` so a batch is `inputs * w + b`.
#[derive(Debug, Clone)]
pub struct EmbeddingNetwork {
    user_embeddings: DMatrix<f32>,
    item_embeddings: DMatrix<f32>,
    head: ScoringHead,
}

#[derive(Debug, Clone, PartialEq)]
struct ScoringHead {
    w1: DMatrix<f32>,
    b1: DMatrix<f32>,
    w2: DMatrix<f32>,
    b2: DMatrix<f32>,
    w3: DMatrix<f32>,
    b3: DMatrix<f32>,
}

/// Gradients for every parameter of an [`EmbeddingNetwork`], same shapes.
#[derive(Debug, Clone)]
pub struct Gradients {
    user_embeddings: DMatrix<f32>,
    item_embeddings: DMatrix<f32>,
    head: ScoringHead,
}

struct Activations {
    z1: DMatrix<f32>,
    h1: DMatrix<f32>,
    z2: DMatrix<f32>,
    h2: DMatrix<f32>,
    output: DMatrix<f32>,
}

impl EmbeddingNetwork {
    pub fn new(
        rng: &mut StdRng,
        num_users: usize,
        num_items: usize,
        dim: usize,
        hidden_dims: [usize; 2],
    ) -> Self {
        let [h1, h2] = hidden_dims;
        let input = 2 * dim;

        Self {
            user_embeddings: initializer::normal(rng, num_users, dim, 0.0, 1.0),
            item_embeddings: initializer::normal(rng, num_items, dim, 0.0, 1.0),
            head: ScoringHead {
                w1: initializer::fan_in_uniform(rng, input, h1),
                b1: initializer::fan_in_uniform_bias(rng, input, h1),
                w2: initializer::fan_in_uniform(rng, h1, h2),
                b2: initializer::fan_in_uniform_bias(rng, h1, h2),
                w3: initializer::fan_in_uniform(rng, h2, 1),
                b3: initializer::fan_in_uniform_bias(rng, h2, 1),
            },
        }
    }

    pub fn embedding_dim(&self) -> usize {
        self.user_embeddings.ncols()
    }

    /// Concatenated `[user_emb | item_emb]` rows, one per pair.
    fn gather_inputs(&self, pairs: &[(usize, usize)]) -> DMatrix<f32> {
        let dim = self.embedding_dim();
        DMatrix::from_fn(pairs.len(), 2 * dim, |r, c| {
            let (user, item) = pairs[r];
            if c < dim {
                self.user_embeddings[(user, c)]
            } else {
                self.item_embeddings[(item, c - dim)]
            }
        })
    }

    fn forward(&self, inputs: &DMatrix<f32>) -> Activations {
        let head = &self.head;

        let mut z1 = inputs * &head.w1;
        add_bias(&mut z1, &head.b1);
        let h1 = relu(&z1);

        let mut z2 = &h1 * &head.w2;
        add_bias(&mut z2, &head.b2);
        let h2 = relu(&z2);

        let mut output = &h2 * &head.w3;
        add_bias(&mut output, &head.b3);

        Activations {
            z1,
            h1,
            z2,
            h2,
            output,
        }
    }

    /// Predicted ratings for a batch of `(user, item)` pairs.
    pub fn predict(&self, pairs: &[(usize, usize)]) -> Vec<f32> {
        if pairs.is_empty() {
            return Vec::new();
        }
        let inputs = self.gather_inputs(pairs);
        self.forward(&inputs).output.iter().copied().collect()
    }

    /// Gradients of the mean squared error over `total` interactions,
    /// restricted to the contribution of `batch`. Summing the results of
    /// disjoint batches that cover the dataset gives the full-batch gradient.
    ///
    /// Also returns the batch's sum of squared errors.
    pub fn gradients(&self, batch: &[Interaction], total: usize) -> (Gradients, f64) {
        let mut grads = Gradients::zeros_like(self);
        if batch.is_empty() || total == 0 {
            return (grads, 0.0);
        }

        let pairs: Vec<(usize, usize)> = batch.iter().map(|x| (x.user, x.item)).collect();
        let inputs = self.gather_inputs(&pairs);
        let acts = self.forward(&inputs);

        let scale = 2.0 / total as f32;
        let mut squared_error = 0.0f64;
        let d_output = DMatrix::from_fn(batch.len(), 1, |r, _| {
            let error = acts.output[(r, 0)] - batch[r].rating;
            squared_error += f64::from(error) * f64::from(error);
            scale * error
        });

        let head = &self.head;
        grads.head.w3 = acts.h2.transpose() * &d_output;
        grads.head.b3 = column_sums(&d_output);

        let d_z2 = (&d_output * head.w3.transpose()).component_mul(&relu_mask(&acts.z2));
        grads.head.w2 = acts.h1.transpose() * &d_z2;
        grads.head.b2 = column_sums(&d_z2);

        let d_z1 = (&d_z2 * head.w2.transpose()).component_mul(&relu_mask(&acts.z1));
        grads.head.w1 = inputs.transpose() * &d_z1;
        grads.head.b1 = column_sums(&d_z1);

        let d_inputs = &d_z1 * head.w1.transpose();
        let dim = self.embedding_dim();
        for (r, &(user, item)) in pairs.iter().enumerate() {
            for c in 0..dim {
                grads.user_embeddings[(user, c)] += d_inputs[(r, c)];
                grads.item_embeddings[(item, c)] += d_inputs[(r, c + dim)];
            }
        }

        (grads, squared_error)
    }

    /// Applies one optimizer step to every parameter.
    pub fn apply_gradients(&mut self, optimizer: &mut Adam, grads: &Gradients) {
        optimizer.begin_step();
        optimizer.update("user_embeddings", &mut self.user_embeddings, &grads.user_embeddings);
        optimizer.update("item_embeddings", &mut self.item_embeddings, &grads.item_embeddings);

        let head = &mut self.head;
        optimizer.update("head.w1", &mut head.w1, &grads.head.w1);
        optimizer.update("head.b1", &mut head.b1, &grads.head.b1);
        optimizer.update("head.w2", &mut head.w2, &grads.head.w2);
        optimizer.update("head.b2", &mut head.b2, &grads.head.b2);
        optimizer.update("head.w3", &mut head.w3, &grads.head.w3);
        optimizer.update("head.b3", &mut head.b3, &grads.head.b3);
    }
}

impl Gradients {
    pub fn zeros_like(network: &EmbeddingNetwork) -> Self {
        let zeros = |m: &DMatrix<f32>| -> DMatrix<f32> { DMatrix::zeros(m.nrows(), m.ncols()) };
        let head = &network.head;
        Self {
            user_embeddings: zeros(&network.user_embeddings),
            item_embeddings: zeros(&network.item_embeddings),
            head: ScoringHead {
                w1: zeros(&head.w1),
                b1: zeros(&head.b1),
                w2: zeros(&head.w2),
                b2: zeros(&head.b2),
                w3: zeros(&head.w3),
                b3: zeros(&head.b3),
            },
        }
    }

    /// Element-wise sum, used to reduce per-chunk gradients.
    pub fn merge(mut self, other: Gradients) -> Self {
        self.user_embeddings += other.user_embeddings;
        self.item_embeddings += other.item_embeddings;
        self.head.w1 += other.head.w1;
        self.head.b1 += other.head.b1;
        self.head.w2 += other.head.w2;
        self.head.b2 += other.head.b2;
        self.head.w3 += other.head.w3;
        self.head.b3 += other.head.b3;
        self
    }

    pub fn norm(&self) -> f32 {
        [
            &self.user_embeddings,
            &self.item_embeddings,
            &self.head.w1,
            &self.head.b1,
            &self.head.w2,
            &self.head.b2,
            &self.head.w3,
            &self.head.b3,
        ]
        .iter()
        .map(|m| m.norm_squared())
        .sum::<f32>()
        .sqrt()
    }
}

fn add_bias(z: &mut DMatrix<f32>, bias: &DMatrix<f32>) {
    for c in 0..z.ncols() {
        let b = bias[(0, c)];
        for r in 0..z.nrows() {
            z[(r, c)] += b;
        }
    }
}

fn relu(z: &DMatrix<f32>) -> DMatrix<f32> {
    z.map(|v| v.max(0.0))
}

fn relu_mask(z: &DMatrix<f32>) -> DMatrix<f32> {
    z.map(|v| if v > 0.0 { 1.0 } else { 0.0 })
}

fn column_sums(m: &DMatrix<f32>) -> DMatrix<f32> {
    DMatrix::from_fn(1, m.ncols(), |_, c| m.column(c).sum())
}

impl LatentFactorModel for EmbeddingNetwork {
    fn strategy(&self) -> Strategy {
        Strategy::EmbeddingNetwork
    }

    fn cold_start_policy(&self) -> ColdStartPolicy {
        ColdStartPolicy::Error
    }

    fn num_users(&self) -> usize {
        self.user_embeddings.nrows()
    }

    fn num_items(&self) -> usize {
        self.item_embeddings.nrows()
    }

    fn score(&self, user: usize, item: usize) -> f32 {
        self.predict(&[(user, item)])[0]
    }

    fn score_items(&self, user: usize) -> Vec<f32> {
        let pairs: Vec<(usize, usize)> = (0..self.num_items()).map(|item| (user, item)).collect();
        self.predict(&pairs)
    }
}
