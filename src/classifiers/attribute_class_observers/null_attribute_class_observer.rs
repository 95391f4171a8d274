use crate::classifiers::attribute_class_observers::AttributeClassObserver;
use crate::classifiers::conditional_tests::AttributeSplitSuggestion;
use crate::classifiers::hoeffding_tree::split_criteria::SplitCriterion;
use std::any::Any;
use std::mem::size_of;

/// Placeholder for an attribute dropped from split evaluation. It keeps no
/// statistics, never proposes a split and is neutral in naive-Bayes votes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullAttributeClassObserver;

impl NullAttributeClassObserver {
    pub fn new() -> Self {
        Self
    }
}

impl AttributeClassObserver for NullAttributeClassObserver {
    fn update(&mut self, _value: f64, _class: usize, _weight: f64) {}

    fn likelihood(&self, _value: f64, _class: usize) -> Option<f64> {
        Some(1.0)
    }

    fn best_split(
        &self,
        _criterion: &dyn SplitCriterion,
        _pre_split: &[f64],
        _attribute: usize,
        _binary_only: bool,
    ) -> Option<AttributeSplitSuggestion> {
        None
    }

    fn calc_memory_size(&self) -> usize {
        size_of::<Self>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
