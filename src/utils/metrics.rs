use crate::algorithms::LatentFactorModel;
use crate::models::{Interaction, RawId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Mean squared error of `model` over `interactions`; 0.0 when there are none.
pub fn mean_squared_error<M>(model: &M, interactions: &[Interaction]) -> f64
where
    M: LatentFactorModel + ?Sized,
{
    if interactions.is_empty() {
        return 0.0;
    }

    let total: f64 = interactions
        .iter()
        .map(|interaction| {
            let predicted = model.score(interaction.user, interaction.item);
            let error = f64::from(predicted - interaction.rating);
            error * error
        })
        .sum();

    total / interactions.len() as f64
}

pub fn root_mean_squared_error<M>(model: &M, interactions: &[Interaction]) -> f64
where
    M: LatentFactorModel + ?Sized,
{
    mean_squared_error(model, interactions).sqrt()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankingMetrics {
    pub precision_at_k: f64,
    pub recall_at_k: f64,
    pub users_evaluated: usize,
}

#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    k: usize,
}

impl MetricsCalculator {
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    pub fn calculate_precision_at_k(&self, recommended: &[RawId], relevant: &[RawId]) -> f64 {
        if recommended.is_empty() || self.k == 0 {
            return 0.0;
        }

        let relevant_set: HashSet<_> = relevant.iter().collect();
        let hits = recommended
            .iter()
            .take(self.k)
            .filter(|item| relevant_set.contains(item))
            .count();

        hits as f64 / self.k.min(recommended.len()) as f64
    }

    pub fn calculate_recall_at_k(&self, recommended: &[RawId], relevant: &[RawId]) -> f64 {
        if relevant.is_empty() {
            return 0.0;
        }

        let relevant_set: HashSet<_> = relevant.iter().collect();
        let hits = recommended
            .iter()
            .take(self.k)
            .filter(|item| relevant_set.contains(item))
            .count();

        hits as f64 / relevant_set.len() as f64
    }

    /// Averages precision and recall over `(recommended, relevant)` pairs,
    /// skipping users with nothing relevant.
    pub fn evaluate<'a, I>(&self, per_user: I) -> RankingMetrics
    where
        I: IntoIterator<Item = (&'a [RawId], &'a [RawId])>,
    {
        let mut metrics = RankingMetrics::default();

        for (recommended, relevant) in per_user {
            if relevant.is_empty() {
                continue;
            }
            metrics.precision_at_k += self.calculate_precision_at_k(recommended, relevant);
            metrics.recall_at_k += self.calculate_recall_at_k(recommended, relevant);
            metrics.users_evaluated += 1;
        }

        if metrics.users_evaluated > 0 {
            metrics.precision_at_k /= metrics.users_evaluated as f64;
            metrics.recall_at_k /= metrics.users_evaluated as f64;
        }

        metrics
    }
}
