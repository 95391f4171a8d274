use crate::classifiers::hoeffding_tree::split_criteria::SplitCriterion;
use crate::utils::math::entropy;
use crate::utils::memory::MemorySized;
use std::any::Any;
use std::mem::size_of;

pub const DEFAULT_MIN_BRANCH_FRACTION: f64 = 0.01;

/// Entropy reduction of a split.
///
/// Candidates that leave fewer than two branches with at least
/// `min_branch_fraction` of the weight score `-inf`, so they never win.
#[derive(Clone, Copy, Debug)]
pub struct InfoGainSplitCriterion {
    min_branch_fraction: f64,
}

impl Default for InfoGainSplitCriterion {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_BRANCH_FRACTION)
    }
}

impl InfoGainSplitCriterion {
    pub fn new(min_branch_fraction: f64) -> Self {
        Self {
            min_branch_fraction,
        }
    }

    fn post_split_entropy(post_split_dists: &[Vec<f64>]) -> f64 {
        let weights: Vec<f64> = post_split_dists.iter().map(|d| d.iter().sum()).collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return 0.0;
        }
        post_split_dists
            .iter()
            .zip(&weights)
            .map(|(dist, w)| w * entropy(dist))
            .sum::<f64>()
            / total
    }

    fn branches_above_fraction(&self, post_split_dists: &[Vec<f64>]) -> usize {
        let weights: Vec<f64> = post_split_dists.iter().map(|d| d.iter().sum()).collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return 0;
        }
        weights
            .iter()
            .filter(|&&w| w / total > self.min_branch_fraction)
            .count()
    }
}

impl SplitCriterion for InfoGainSplitCriterion {
    fn get_range_of_merit(&self, pre_split_distribution: &[f64]) -> f64 {
        (pre_split_distribution.len().max(2) as f64).log2()
    }

    fn get_merit_of_split(
        &self,
        pre_split_distribution: &[f64],
        post_split_dists: &[Vec<f64>],
    ) -> f64 {
        if self.branches_above_fraction(post_split_dists) < 2 {
            return f64::NEG_INFINITY;
        }
        entropy(pre_split_distribution) - Self::post_split_entropy(post_split_dists)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl MemorySized for InfoGainSplitCriterion {
    fn inline_size(&self) -> usize {
        size_of::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn perfect_binary_split_gains_one_bit() {
        let c = InfoGainSplitCriterion::default();
        let merit = c.get_merit_of_split(&[4.0, 4.0], &[vec![4.0, 0.0], vec![0.0, 4.0]]);
        assert!((merit - 1.0).abs() < EPS);
    }

    #[test]
    fn uninformative_split_gains_nothing() {
        let c = InfoGainSplitCriterion::default();
        let merit = c.get_merit_of_split(&[4.0, 4.0], &[vec![2.0, 2.0], vec![2.0, 2.0]]);
        assert!(merit.abs() < EPS);
    }

    #[test]
    fn split_with_a_single_populated_branch_is_rejected() {
        let c = InfoGainSplitCriterion::default();
        let merit = c.get_merit_of_split(&[4.0, 4.0], &[vec![4.0, 4.0], vec![0.0, 0.0]]);
        assert_eq!(merit, f64::NEG_INFINITY);
    }

    #[test]
    fn range_grows_with_class_count() {
        let c = InfoGainSplitCriterion::default();
        assert!((c.get_range_of_merit(&[1.0]) - 1.0).abs() < EPS);
        assert!((c.get_range_of_merit(&[1.0, 1.0]) - 1.0).abs() < EPS);
        assert!((c.get_range_of_merit(&[1.0, 1.0, 1.0, 1.0]) - 2.0).abs() < EPS);
    }
}
