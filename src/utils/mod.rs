use std::cmp::Ordering;

pub mod metrics;
pub mod validation;

/// Indices of the `k` highest scores, best first.
///
/// Equal scores are ordered by ascending `tie_key(index)`, so the result is
/// fully determined by the inputs. NaN scores are never selected.
pub fn top_k_by_score<K, F>(scores: &[f32], k: usize, tie_key: F) -> Vec<usize>
where
    K: Ord,
    F: Fn(usize) -> K,
{
    // Only non-NaN scores reach the comparator, so `partial_cmp` is total here
    // and treats -0.0 and 0.0 as equal.
    let compare = |a: &usize, b: &usize| -> Ordering {
        scores[*b]
            .partial_cmp(&scores[*a])
            .unwrap_or(Ordering::Equal)
            .then_with(|| tie_key(*a).cmp(&tie_key(*b)))
    };

    if k == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<usize> = (0..scores.len())
        .filter(|&i| !scores[i].is_nan())
        .collect();
    if k < candidates.len() {
        candidates.select_nth_unstable_by(k - 1, compare);
        candidates.truncate(k);
    }
    candidates.sort_by(compare);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_k_indices() {
        let scores = vec![0.1, 0.5, 0.3, 0.9, 0.2];
        assert_eq!(top_k_by_score(&scores, 2, |i| i), vec![3, 1]);
    }

    #[test]
    fn test_fewer_candidates_than_k() {
        let scores = vec![0.2, 0.7];
        assert_eq!(top_k_by_score(&scores, 10, |i| i), vec![1, 0]);
    }

    #[test]
    fn test_ties_use_key() {
        let scores = vec![1.0, 1.0, 1.0, 2.0];
        let keys = [30, 10, 20, 99];
        assert_eq!(top_k_by_score(&scores, 3, |i| keys[i]), vec![3, 1, 2]);
    }

    #[test]
    fn test_signed_zeros_tie() {
        assert_eq!(top_k_by_score(&[0.0, -0.0], 2, |i| [20, 10][i]), vec![1, 0]);
        assert_eq!(top_k_by_score(&[-0.0, 0.0, -1.0], 1, |i| [5, 3, 1][i]), vec![1]);
    }

    #[test]
    fn test_skips_nan() {
        let scores = vec![f32::NAN, 0.1, f32::NAN];
        assert_eq!(top_k_by_score(&scores, 5, |i| i), vec![1]);
    }

    #[test]
    fn test_zero_k() {
        assert!(top_k_by_score(&[1.0, 2.0], 0, |i| i).is_empty());
    }
}
