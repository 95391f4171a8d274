use crate::classifiers::conditional_tests::AttributeSplitSuggestion;
use crate::classifiers::hoeffding_tree::adaptive_hoeffding_tree::AdaptiveHoeffdingTree;
use crate::classifiers::hoeffding_tree::leaf_prediction_option::LeafPredictionOption;
use crate::classifiers::hoeffding_tree::nodes::{Node, NodeKind, NodeRef, SplitNode};
use std::collections::BTreeSet;

/// Merits this close to zero carry no information.
const MIN_MERIT: f64 = 1e-10;

impl AdaptiveHoeffdingTree {
    pub(super) fn attempt_to_split(&mut self, leaf_ref: NodeRef) {
        let Some(node) = self.arena.get(leaf_ref) else {
            return;
        };
        if !node.is_leaf() || node.observed_class_distribution_is_pure() {
            return;
        }

        let mut best_suggestions = node.get_best_split_suggestions(
            self.split_criterion.as_ref(),
            self.options.no_pre_prune,
            self.options.binary_splits,
        );
        best_suggestions.sort_by(AttributeSplitSuggestion::compare_merit);

        let hoeffding_bound = Self::compute_hoeffding_bound(
            self.split_criterion
                .get_range_of_merit(&node.observed_class_distribution),
            self.options.split_confidence,
            node.total_weight_seen(),
        );

        let Some(best) = best_suggestions.last() else {
            return;
        };
        if !(best.get_merit() >= MIN_MERIT) {
            return;
        }

        let should_split = if best_suggestions.len() < 2 {
            true
        } else {
            let second_best = &best_suggestions[best_suggestions.len() - 2];
            best.get_merit() - second_best.get_merit() > hoeffding_bound
                || hoeffding_bound < self.options.tie_threshold
        };

        if self.options.remove_poor_attributes
            && self.options.leaf_prediction == LeafPredictionOption::MajorityClass
            && best_suggestions.len() >= 2
        {
            self.disable_poor_attributes(leaf_ref, &best_suggestions, hoeffding_bound);
        }

        if !should_split {
            return;
        }
        let Some(split_decision) = best_suggestions.pop() else {
            return;
        };
        if split_decision.get_split_test().is_none() {
            self.deactivate_leaf(leaf_ref);
        } else {
            self.convert_leaf_to_split(leaf_ref, split_decision);
        }
        self.enforce_tracker_limit();
    }

    /// Attributes trailing the best by more than the bound are poor; an
    /// attribute poor on two consecutive attempts is disabled.
    fn disable_poor_attributes(
        &mut self,
        leaf_ref: NodeRef,
        best_suggestions: &[AttributeSplitSuggestion],
        hoeffding_bound: f64,
    ) {
        let Some(best) = best_suggestions.last() else {
            return;
        };
        let best_merit = best.get_merit();
        let mut poor_atts = BTreeSet::new();
        for s in best_suggestions {
            if let Some(att) = s.split_attribute() {
                if best_merit - s.get_merit() > hoeffding_bound {
                    poor_atts.insert(att);
                }
            }
        }
        for s in best_suggestions {
            if let Some(att) = s.split_attribute() {
                if best_merit - s.get_merit() < hoeffding_bound {
                    poor_atts.remove(&att);
                }
            }
        }

        let Some(node) = self.arena.get_mut(leaf_ref) else {
            return;
        };
        let NodeKind::Leaf(leaf) = &mut node.kind else {
            return;
        };
        let previous = std::mem::replace(
            &mut leaf.poor_attributes,
            poor_atts.iter().copied().collect(),
        );
        for att in poor_atts.into_iter().filter(|a| previous.contains(a)) {
            node.disable_attribute(att);
        }
    }

    /// Turns the leaf into a split node in place: same slot, same id, same
    /// statistics. One fresh leaf is created per branch.
    pub(super) fn convert_leaf_to_split(
        &mut self,
        leaf_ref: NodeRef,
        suggestion: AttributeSplitSuggestion,
    ) {
        let (split_test, distributions) = suggestion.into_parts();
        let Some(split_test) = split_test else {
            return;
        };
        let num_classes = self.num_classes();
        let Some(node) = self.arena.get(leaf_ref) else {
            return;
        };
        if !node.is_leaf() {
            return;
        }
        let is_alternate = node.is_alternate;
        let node_id = node.id;
        let attribute = Some(split_test.attribute());

        let counts = self.stats.counts_for(is_alternate);
        counts.remove(node);

        let children: Vec<Option<NodeRef>> = distributions
            .into_iter()
            .map(|dist| {
                Some(self.arena.allocate(|id| {
                    Node::new_leaf(id, dist, num_classes, is_alternate, Some(leaf_ref))
                }))
            })
            .collect();
        let branches = children.len();

        if let Some(node) = self.arena.get_mut(leaf_ref) {
            node.kind = NodeKind::Split(SplitNode::new(split_test, children));
        }
        let counts = self.stats.counts_for(is_alternate);
        counts.decision_nodes += 1;
        counts.active_leaves += branches;

        self.stats.splits += 1;
        self.events.on_split(node_id, attribute, branches);
    }

    pub(super) fn deactivate_leaf(&mut self, leaf_ref: NodeRef) {
        let Some(node) = self.arena.get_mut(leaf_ref) else {
            return;
        };
        let NodeKind::Leaf(leaf) = &mut node.kind else {
            return;
        };
        if !leaf.is_active {
            return;
        }
        leaf.is_active = false;
        node.drop_observers();
        node.error_estimator = None;

        let counts = self.stats.counts_for(node.is_alternate);
        counts.active_leaves = counts.active_leaves.saturating_sub(1);
        counts.inactive_leaves += 1;
        self.events.on_deactivate(node.id);
    }

    pub(super) fn activate_leaf(&mut self, leaf_ref: NodeRef) {
        let Some(node) = self.arena.get_mut(leaf_ref) else {
            return;
        };
        let NodeKind::Leaf(leaf) = &mut node.kind else {
            return;
        };
        if leaf.is_active {
            return;
        }
        leaf.is_active = true;
        leaf.weight_since_last_split_attempt = 0.0;

        let counts = self.stats.counts_for(node.is_alternate);
        counts.inactive_leaves = counts.inactive_leaves.saturating_sub(1);
        counts.active_leaves += 1;
        self.events.on_reactivate(node.id);
    }
}
