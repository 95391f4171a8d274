use crate::classifiers::attribute_class_observers::{
    AttributeClassObserver, GaussianNumericAttributeClassObserver, NominalAttributeClassObserver,
    NullAttributeClassObserver,
};
use crate::classifiers::conditional_tests::AttributeSplitSuggestion;
use crate::classifiers::hoeffding_tree::nodes::{LearningNode, NodeRef, SplitNode};
use crate::classifiers::hoeffding_tree::split_criteria::SplitCriterion;
use crate::core::estimators::adwin::Adwin;
use crate::core::instance_header::InstanceHeader;
use crate::core::instances::Instance;
use crate::utils::memory::{MemoryMeter, MemorySized};
use std::mem::size_of;

pub enum NodeKind {
    Leaf(LearningNode),
    Split(SplitNode),
}

/// A tree node as stored in the arena.
///
/// Leaves and split nodes share the class distribution, the per-attribute
/// observers and the error estimator; a leaf keeps all three when it is
/// converted into a split node.
pub struct Node {
    pub(crate) id: u64,
    pub(crate) parent: Option<NodeRef>,
    pub(crate) is_alternate: bool,
    /// For the root of an alternate subtree: the split node it shadows.
    pub(crate) mainline_attachment: Option<NodeRef>,
    pub(crate) observed_class_distribution: Vec<f64>,
    pub(crate) attribute_observers: Vec<Option<Box<dyn AttributeClassObserver>>>,
    /// Sequence number of the first instance the observers saw.
    pub(crate) observers_since: Option<u64>,
    pub(crate) error_estimator: Option<Adwin>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub fn new_leaf(
        id: u64,
        mut observed_class_distribution: Vec<f64>,
        num_classes: usize,
        is_alternate: bool,
        parent: Option<NodeRef>,
    ) -> Self {
        if observed_class_distribution.len() < num_classes {
            observed_class_distribution.resize(num_classes, 0.0);
        }
        Self {
            id,
            parent,
            is_alternate,
            mainline_attachment: None,
            observed_class_distribution,
            attribute_observers: Vec::new(),
            observers_since: None,
            error_estimator: None,
            kind: NodeKind::Leaf(LearningNode::new()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn parent(&self) -> Option<NodeRef> {
        self.parent
    }

    pub fn is_alternate(&self) -> bool {
        self.is_alternate
    }

    pub fn mainline_attachment(&self) -> Option<NodeRef> {
        self.mainline_attachment
    }

    pub fn observed_class_distribution(&self) -> &[f64] {
        &self.observed_class_distribution
    }

    pub fn attribute_observers(&self) -> &[Option<Box<dyn AttributeClassObserver>>] {
        &self.attribute_observers
    }

    pub fn observers_since(&self) -> Option<u64> {
        self.observers_since
    }

    pub fn error_estimator(&self) -> Option<&Adwin> {
        self.error_estimator.as_ref()
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&LearningNode> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Split(_) => None,
        }
    }

    pub fn as_leaf_mut(&mut self) -> Option<&mut LearningNode> {
        match &mut self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Split(_) => None,
        }
    }

    pub fn as_split(&self) -> Option<&SplitNode> {
        match &self.kind {
            NodeKind::Split(split) => Some(split),
            NodeKind::Leaf(_) => None,
        }
    }

    pub fn as_split_mut(&mut self) -> Option<&mut SplitNode> {
        match &mut self.kind {
            NodeKind::Split(split) => Some(split),
            NodeKind::Leaf(_) => None,
        }
    }

    pub fn total_weight_seen(&self) -> f64 {
        self.observed_class_distribution.iter().sum()
    }

    pub fn observed_class_distribution_is_pure(&self) -> bool {
        self.observed_class_distribution
            .iter()
            .filter(|&&w| w != 0.0)
            .count()
            < 2
    }

    /// Weight that would be misclassified by the majority class.
    pub fn calculate_promise(&self) -> f64 {
        let total_seen = self.total_weight_seen();
        if total_seen > 0.0 {
            let max_value = self
                .observed_class_distribution
                .iter()
                .cloned()
                .fold(f64::MIN, f64::max);
            total_seen - max_value
        } else {
            0.0
        }
    }

    pub(crate) fn add_class_weight(&mut self, class: usize, weight: f64) {
        if class >= self.observed_class_distribution.len() {
            self.observed_class_distribution.resize(class + 1, 0.0);
        }
        self.observed_class_distribution[class] += weight;
    }

    pub fn has_observers(&self) -> bool {
        self.observers_since.is_some()
    }

    /// Creates one observer per model attribute, picked by attribute type.
    pub(crate) fn init_observers(&mut self, header: &InstanceHeader, seq: u64) {
        self.attribute_observers = (0..header.number_of_model_attributes())
            .map(|i| {
                let nominal = header
                    .attribute_at_index(header.model_to_instance_index(i))
                    .is_some_and(|a| a.is_nominal());
                let observer: Box<dyn AttributeClassObserver> = if nominal {
                    Box::new(NominalAttributeClassObserver::new())
                } else {
                    Box::new(GaussianNumericAttributeClassObserver::new())
                };
                Some(observer)
            })
            .collect();
        self.observers_since = Some(seq);
    }

    pub(crate) fn observe_attributes(
        &mut self,
        header: &InstanceHeader,
        instance: &dyn Instance,
        class: usize,
        weight: f64,
    ) {
        for (i, observer) in self.attribute_observers.iter_mut().enumerate() {
            if let Some(obs) = observer {
                let value = instance
                    .value_at_index(header.model_to_instance_index(i))
                    .unwrap_or(f64::NAN);
                obs.update(value, class, weight);
            }
        }
    }

    pub(crate) fn drop_observers(&mut self) {
        self.attribute_observers = Vec::new();
        self.observers_since = None;
    }

    pub(crate) fn disable_attribute(&mut self, attribute_index: usize) {
        if let Some(slot) = self.attribute_observers.get_mut(attribute_index) {
            *slot = Some(Box::new(NullAttributeClassObserver::new()));
        }
    }

    /// The best split per observed attribute, plus the "no split" candidate
    /// unless `no_pre_prune`.
    pub fn get_best_split_suggestions(
        &self,
        criterion: &dyn SplitCriterion,
        no_pre_prune: bool,
        binary_only: bool,
    ) -> Vec<AttributeSplitSuggestion> {
        let mut best_suggestions = Vec::new();
        let pre_split_distribution = &self.observed_class_distribution;
        if !no_pre_prune {
            let merit = criterion.get_merit_of_split(
                pre_split_distribution,
                std::slice::from_ref(pre_split_distribution),
            );
            best_suggestions.push(AttributeSplitSuggestion::new(
                None,
                vec![pre_split_distribution.clone()],
                merit,
            ));
        }
        for (i, obs_opt) in self.attribute_observers.iter().enumerate() {
            if let Some(obs) = obs_opt {
                if let Some(suggestion) = obs.best_split(
                    criterion,
                    pre_split_distribution,
                    i,
                    binary_only,
                ) {
                    best_suggestions.push(suggestion);
                }
            }
        }
        best_suggestions
    }
}

impl MemorySized for Node {
    fn inline_size(&self) -> usize {
        size_of::<Self>()
    }

    fn extra_heap_size(&self, meter: &mut MemoryMeter) -> usize {
        let mut total = 0;
        total += meter.measure_field(&self.observed_class_distribution);
        total += meter.measure_field(&self.attribute_observers);
        total += meter.measure_field(&self.error_estimator);
        if let NodeKind::Split(split) = &self.kind {
            total += meter.measure_field(split);
        }
        total
    }
}
