use crate::classifiers::hoeffding_tree::split_criteria::SplitCriterion;
use crate::utils::memory::MemorySized;
use std::any::Any;
use std::mem::size_of;

#[derive(Clone, Copy, Debug, Default)]
pub struct GiniSplitCriterion;

impl GiniSplitCriterion {
    pub fn new() -> Self {
        Self
    }

    pub fn compute_gini(&self, distribution: &[f64], distribution_sum_of_weights: f64) -> f64 {
        let mut gini = 1.0;
        for w in distribution {
            let rel_freq = w / distribution_sum_of_weights;
            gini -= rel_freq * rel_freq;
        }
        gini
    }
}

impl SplitCriterion for GiniSplitCriterion {
    fn get_range_of_merit(&self, _pre_split_distribution: &[f64]) -> f64 {
        1.0
    }

    fn get_merit_of_split(
        &self,
        _pre_split_distribution: &[f64],
        post_split_dists: &[Vec<f64>],
    ) -> f64 {
        let dist_weights: Vec<f64> = post_split_dists
            .iter()
            .map(|dist| dist.iter().sum())
            .collect();
        let total_weight: f64 = dist_weights.iter().sum();
        if total_weight <= 0.0 {
            return 0.0;
        }

        let mut gini = 0.0;
        for (dist, &w) in post_split_dists.iter().zip(&dist_weights) {
            if w > 0.0 {
                gini += (w / total_weight) * self.compute_gini(dist, w);
            }
        }

        1.0 - gini
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl MemorySized for GiniSplitCriterion {
    fn inline_size(&self) -> usize {
        size_of::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_branches_score_one() {
        let c = GiniSplitCriterion::new();
        let merit = c.get_merit_of_split(&[5.0, 5.0], &[vec![5.0, 0.0], vec![0.0, 5.0]]);
        assert!((merit - 1.0).abs() < 1e-12);
    }

    #[test]
    fn uninformative_split_scores_half_for_binary() {
        let c = GiniSplitCriterion::new();
        let merit = c.get_merit_of_split(&[4.0, 4.0], &[vec![2.0, 2.0], vec![2.0, 2.0]]);
        assert!((merit - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_branches_are_ignored() {
        let c = GiniSplitCriterion::new();
        let merit = c.get_merit_of_split(&[3.0, 0.0], &[vec![3.0, 0.0], vec![0.0, 0.0]]);
        assert!((merit - 1.0).abs() < 1e-12);
        assert_eq!(c.get_merit_of_split(&[], &[vec![0.0], vec![0.0]]), 0.0);
    }

    #[test]
    fn range_is_one() {
        assert_eq!(GiniSplitCriterion::new().get_range_of_merit(&[1.0, 2.0, 3.0]), 1.0);
    }
}
