use crate::classifiers::attribute_class_observers::AttributeClassObserver;
use crate::classifiers::attribute_class_observers::attribute_class_observer::keep_better;
use crate::classifiers::conditional_tests::AttributeSplitSuggestion;
use crate::classifiers::hoeffding_tree::instance_conditional_test::{
    NominalAttributeBinaryTest, NominalAttributeMultiwayTest,
};
use crate::classifiers::hoeffding_tree::split_criteria::SplitCriterion;
use crate::utils::memory::{MemoryMeter, MemorySized};
use std::any::Any;
use std::mem::size_of;

/// Weighted class counts for every value of a nominal attribute.
///
/// Rows are indexed by attribute value and grow as new values show up, so
/// the observer needs no header.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NominalAttributeClassObserver {
    /// `counts[value][class]`
    counts: Vec<Vec<f64>>,
    class_totals: Vec<f64>,
    missing: f64,
}

impl NominalAttributeClassObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weight seen so far, missing values included.
    pub fn weight_seen(&self) -> f64 {
        self.class_totals.iter().sum::<f64>() + self.missing
    }

    pub fn missing_weight(&self) -> f64 {
        self.missing
    }

    /// Number of distinct attribute values observed (highest index + 1).
    pub fn values_seen(&self) -> usize {
        self.counts.len()
    }

    /// Weight of each attribute value within `class`.
    pub fn value_counts(&self, class: usize) -> Vec<f64> {
        self.counts
            .iter()
            .map(|row| row.get(class).copied().unwrap_or(0.0))
            .collect()
    }

    fn class_row(&self, value: usize) -> Vec<f64> {
        let mut row = vec![0.0; self.class_totals.len()];
        if let Some(counts) = self.counts.get(value) {
            row[..counts.len()].copy_from_slice(counts);
        }
        row
    }

    /// One class distribution per observed value.
    pub fn multiway_split(&self) -> Vec<Vec<f64>> {
        (0..self.counts.len()).map(|v| self.class_row(v)).collect()
    }

    /// `[value == v, value != v]` class distributions.
    pub fn binary_split(&self, value: usize) -> Vec<Vec<f64>> {
        let equal = self.class_row(value);
        let other = self
            .class_totals
            .iter()
            .zip(&equal)
            .map(|(total, eq)| total - eq)
            .collect();
        vec![equal, other]
    }
}

impl AttributeClassObserver for NominalAttributeClassObserver {
    fn update(&mut self, value: f64, class: usize, weight: f64) {
        if !weight.is_finite() || weight == 0.0 {
            return;
        }
        if value.is_nan() {
            self.missing += weight;
            return;
        }

        let value = value as usize;
        if value >= self.counts.len() {
            self.counts.resize_with(value + 1, Vec::new);
        }
        let row = &mut self.counts[value];
        if class >= row.len() {
            row.resize(class + 1, 0.0);
        }
        row[class] += weight;

        if class >= self.class_totals.len() {
            self.class_totals.resize(class + 1, 0.0);
        }
        self.class_totals[class] += weight;
    }

    /// Laplace-smoothed frequency of `value` within `class`.
    fn likelihood(&self, value: f64, class: usize) -> Option<f64> {
        if value.is_nan() || class >= self.class_totals.len() {
            return None;
        }
        let count = self
            .counts
            .get(value as usize)
            .and_then(|row| row.get(class))
            .copied()
            .unwrap_or(0.0);
        let values = self.counts.len().max(value as usize + 1) as f64;
        Some((count + 1.0) / (self.class_totals[class] + values))
    }

    fn best_split(
        &self,
        criterion: &dyn SplitCriterion,
        pre_split: &[f64],
        attribute: usize,
        binary_only: bool,
    ) -> Option<AttributeSplitSuggestion> {
        let mut best = None;
        if !binary_only {
            let branches = self.multiway_split();
            let merit = criterion.get_merit_of_split(pre_split, &branches);
            best = keep_better(
                best,
                AttributeSplitSuggestion::new(
                    Some(Box::new(NominalAttributeMultiwayTest::new(attribute))),
                    branches,
                    merit,
                ),
            );
        }
        for value in 0..self.counts.len() {
            let branches = self.binary_split(value);
            let merit = criterion.get_merit_of_split(pre_split, &branches);
            best = keep_better(
                best,
                AttributeSplitSuggestion::new(
                    Some(Box::new(NominalAttributeBinaryTest::new(attribute, value))),
                    branches,
                    merit,
                ),
            );
        }
        best
    }

    fn calc_memory_size(&self) -> usize {
        MemoryMeter::measure_root(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl MemorySized for NominalAttributeClassObserver {
    fn inline_size(&self) -> usize {
        size_of::<Self>()
    }

    fn extra_heap_size(&self, meter: &mut MemoryMeter) -> usize {
        meter.measure_field(&self.counts) + meter.measure_field(&self.class_totals)
    }
}
