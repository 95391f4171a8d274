use crate::classifiers::attribute_class_observers::AttributeClassObserver;
use crate::classifiers::attribute_class_observers::attribute_class_observer::keep_better;
use crate::classifiers::conditional_tests::AttributeSplitSuggestion;
use crate::classifiers::hoeffding_tree::instance_conditional_test::NumericAttributeBinaryTest;
use crate::classifiers::hoeffding_tree::split_criteria::SplitCriterion;
use crate::core::estimators::GaussianEstimator;
use crate::utils::memory::{MemoryMeter, MemorySized};
use std::any::Any;
use std::mem::size_of;

const DEFAULT_THRESHOLDS: usize = 10;

#[derive(Clone, Debug, PartialEq)]
struct ClassSummary {
    estimator: GaussianEstimator,
    min: f64,
    max: f64,
}

impl ClassSummary {
    fn starting_at(value: f64) -> Self {
        Self {
            estimator: GaussianEstimator::new(),
            min: value,
            max: value,
        }
    }

    /// Estimated `[<= threshold, > threshold]` weight of this class.
    fn partition(&self, threshold: f64) -> (f64, f64) {
        let weight = self.estimator.weight();
        if threshold < self.min {
            (0.0, weight)
        } else if threshold >= self.max {
            (weight, 0.0)
        } else {
            let [below, at, above] = self.estimator.weight_around(threshold);
            (below + at, above)
        }
    }
}

/// A Gaussian per class plus the range each class was seen in. Splits are
/// proposed at equally spaced thresholds across the overall range.
///
/// The range only ever widens: forgetting a value updates the Gaussian but
/// leaves `min`/`max` where they were.
#[derive(Clone, Debug, PartialEq)]
pub struct GaussianNumericAttributeClassObserver {
    per_class: Vec<Option<ClassSummary>>,
    thresholds: usize,
}

impl Default for GaussianNumericAttributeClassObserver {
    fn default() -> Self {
        Self::with_thresholds(DEFAULT_THRESHOLDS)
    }
}

impl GaussianNumericAttributeClassObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: usize) -> Self {
        Self {
            per_class: Vec::new(),
            thresholds,
        }
    }

    fn summary(&self, class: usize) -> Option<&ClassSummary> {
        self.per_class.get(class).and_then(Option::as_ref)
    }

    /// Smallest and largest value seen across all classes.
    pub fn observed_range(&self) -> Option<(f64, f64)> {
        self.per_class
            .iter()
            .flatten()
            .map(|s| (s.min, s.max))
            .reduce(|(lo, hi), (min, max)| (lo.min(min), hi.max(max)))
    }

    /// Interior thresholds, evenly spaced strictly inside the observed range.
    pub fn candidate_thresholds(&self) -> Vec<f64> {
        let Some((min, max)) = self.observed_range() else {
            return Vec::new();
        };
        let step = (max - min) / (self.thresholds as f64 + 1.0);
        (1..=self.thresholds)
            .map(|i| min + step * i as f64)
            .filter(|t| *t > min && *t < max)
            .collect()
    }

    /// `[<= threshold, > threshold]` class distributions.
    pub fn binary_split(&self, threshold: f64) -> Vec<Vec<f64>> {
        let mut left = vec![0.0; self.per_class.len()];
        let mut right = vec![0.0; self.per_class.len()];
        for (class, summary) in self.per_class.iter().enumerate() {
            if let Some(summary) = summary {
                (left[class], right[class]) = summary.partition(threshold);
            }
        }
        vec![left, right]
    }

    pub fn class_weight(&self, class: usize) -> f64 {
        self.summary(class).map_or(0.0, |s| s.estimator.weight())
    }
}

impl AttributeClassObserver for GaussianNumericAttributeClassObserver {
    fn update(&mut self, value: f64, class: usize, weight: f64) {
        if !value.is_finite() || !weight.is_finite() || weight == 0.0 {
            return;
        }
        if weight < 0.0 {
            if let Some(Some(summary)) = self.per_class.get_mut(class) {
                summary.estimator.update(value, weight);
            }
            return;
        }

        if class >= self.per_class.len() {
            self.per_class.resize(class + 1, None);
        }
        let summary = self.per_class[class].get_or_insert_with(|| ClassSummary::starting_at(value));
        summary.min = summary.min.min(value);
        summary.max = summary.max.max(value);
        summary.estimator.update(value, weight);
    }

    fn likelihood(&self, value: f64, class: usize) -> Option<f64> {
        if value.is_nan() {
            return None;
        }
        let summary = self.summary(class)?;
        (summary.estimator.weight() > 0.0).then(|| summary.estimator.density(value))
    }

    fn best_split(
        &self,
        criterion: &dyn SplitCriterion,
        pre_split: &[f64],
        attribute: usize,
        _binary_only: bool,
    ) -> Option<AttributeSplitSuggestion> {
        self.candidate_thresholds()
            .into_iter()
            .fold(None, |best, threshold| {
                let branches = self.binary_split(threshold);
                let merit = criterion.get_merit_of_split(pre_split, &branches);
                keep_better(
                    best,
                    AttributeSplitSuggestion::new(
                        Some(Box::new(NumericAttributeBinaryTest::new(
                            attribute, threshold, true,
                        ))),
                        branches,
                        merit,
                    ),
                )
            })
    }

    fn calc_memory_size(&self) -> usize {
        MemoryMeter::measure_root(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl MemorySized for ClassSummary {
    fn inline_size(&self) -> usize {
        size_of::<Self>()
    }
}

impl MemorySized for GaussianNumericAttributeClassObserver {
    fn inline_size(&self) -> usize {
        size_of::<Self>()
    }

    fn extra_heap_size(&self, meter: &mut MemoryMeter) -> usize {
        meter.measure_field(&self.per_class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifiers::hoeffding_tree::split_criteria::InfoGainSplitCriterion;

    fn observe(obs: &mut GaussianNumericAttributeClassObserver, values: &[f64], class: usize) {
        for &v in values {
            obs.update(v, class, 1.0);
        }
    }

    #[test]
    fn density_peaks_at_the_class_mean() {
        let mut obs = GaussianNumericAttributeClassObserver::new();
        observe(&mut obs, &[1.0, 2.0, 3.0], 0);
        let center = obs.likelihood(2.0, 0).unwrap();
        assert!(center > obs.likelihood(0.0, 0).unwrap());
        assert!(center > obs.likelihood(5.0, 0).unwrap());
        assert!(obs.likelihood(2.0, 1).is_none());
        assert!(obs.likelihood(f64::NAN, 0).is_none());
    }

    #[test]
    fn invalid_updates_are_ignored() {
        let mut obs = GaussianNumericAttributeClassObserver::new();
        obs.update(f64::NAN, 0, 1.0);
        obs.update(1.0, 0, 0.0);
        obs.update(1.0, 2, -1.0);
        assert_eq!(obs, GaussianNumericAttributeClassObserver::new());
    }

    #[test]
    fn thresholds_span_the_union_of_class_ranges() {
        let mut obs = GaussianNumericAttributeClassObserver::with_thresholds(3);
        observe(&mut obs, &[0.0, 1.0], 0);
        observe(&mut obs, &[3.0, 4.0], 1);
        assert_eq!(obs.observed_range(), Some((0.0, 4.0)));
        assert_eq!(obs.candidate_thresholds(), vec![1.0, 2.0, 3.0]);

        let mut single = GaussianNumericAttributeClassObserver::new();
        observe(&mut single, &[5.0, 5.0], 0);
        assert!(single.candidate_thresholds().is_empty());
    }

    #[test]
    fn split_outside_a_class_range_sends_it_whole() {
        let mut obs = GaussianNumericAttributeClassObserver::with_thresholds(3);
        observe(&mut obs, &[0.0, 1.0], 0);
        observe(&mut obs, &[3.0, 4.0], 1);
        assert_eq!(obs.binary_split(2.0), vec![vec![2.0, 0.0], vec![0.0, 2.0]]);
    }

    #[test]
    fn best_split_separates_the_classes() {
        let mut obs = GaussianNumericAttributeClassObserver::new();
        observe(&mut obs, &[0.0, 0.5, 1.0, 1.5], 0);
        observe(&mut obs, &[8.0, 8.5, 9.0, 9.5], 1);
        let best = obs
            .best_split(&InfoGainSplitCriterion::default(), &[4.0, 4.0], 2, false)
            .unwrap();
        assert!((best.get_merit() - 1.0).abs() < 1e-9);
        assert_eq!(best.split_attribute(), Some(2));
    }

    #[test]
    fn forgetting_restores_the_class_gaussian_but_not_the_range() {
        let mut obs = GaussianNumericAttributeClassObserver::new();
        observe(&mut obs, &[1.0, 3.0], 0);
        let before = obs.likelihood(2.0, 0).unwrap();

        obs.update(10.0, 0, 1.0);
        obs.update(10.0, 0, -1.0);
        assert!((obs.likelihood(2.0, 0).unwrap() - before).abs() < 1e-12);
        assert_eq!(obs.class_weight(0), 2.0);
        assert_eq!(obs.observed_range(), Some((1.0, 10.0)));
    }
}
