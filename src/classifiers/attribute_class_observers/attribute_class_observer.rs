use crate::classifiers::conditional_tests::AttributeSplitSuggestion;
use crate::classifiers::hoeffding_tree::split_criteria::SplitCriterion;
use crate::utils::memory::{MemoryMeter, MemorySized};
use std::any::Any;

/// Per-attribute sufficient statistics kept at a node.
///
/// Forgetting replays an instance through [`update`](Self::update) with its
/// weight negated, so every implementation must accept negative weights and
/// undo exactly what the positive update added.
pub trait AttributeClassObserver: Any + Send + Sync {
    fn update(&mut self, value: f64, class: usize, weight: f64);

    /// `P(value | class)` for naive-Bayes voting, or `None` when the class
    /// has not been seen with this attribute.
    fn likelihood(&self, value: f64, class: usize) -> Option<f64>;

    /// The highest-merit split this attribute offers under `criterion`.
    fn best_split(
        &self,
        criterion: &dyn SplitCriterion,
        pre_split: &[f64],
        attribute: usize,
        binary_only: bool,
    ) -> Option<AttributeSplitSuggestion>;

    fn calc_memory_size(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
}

/// Keeps the higher-merit of `best` and `candidate`; the earlier one wins ties.
pub(super) fn keep_better(
    best: Option<AttributeSplitSuggestion>,
    candidate: AttributeSplitSuggestion,
) -> Option<AttributeSplitSuggestion> {
    match best {
        Some(b) if b.get_merit() >= candidate.get_merit() => Some(b),
        _ => Some(candidate),
    }
}

impl MemorySized for dyn AttributeClassObserver {
    fn inline_size(&self) -> usize {
        std::mem::size_of_val(self)
    }

    fn extra_heap_size(&self, _meter: &mut MemoryMeter) -> usize {
        self.calc_memory_size()
            .saturating_sub(std::mem::size_of_val(self))
    }
}
