//! Alternate subtrees: spawning, promotion and pruning.
//!
//! An alternate root is reachable only through the `alternates` list of the
//! split node it shadows (its mainline attachment). It copies the parent link
//! of that node but never appears among the parent's children, and it never
//! votes.

mod error_bound;
mod trial_window;

use crate::classifiers::conditional_tests::AttributeSplitSuggestion;
use crate::classifiers::hoeffding_tree::adaptive_hoeffding_tree::AdaptiveHoeffdingTree;
use crate::classifiers::hoeffding_tree::nodes::{Alternate, Node, NodeKind, NodeRef};

impl AdaptiveHoeffdingTree {
    /// Hangs a fresh leaf off `attachment` as an alternate keyed by
    /// `attribute` (`None` for drift-triggered alternates).
    pub(super) fn spawn_alternate(
        &mut self,
        attachment: NodeRef,
        attribute: Option<usize>,
    ) -> Option<NodeRef> {
        let num_classes = self.num_classes();
        let node = self.arena.get(attachment)?;
        let split = node.as_split()?;
        if split.has_alternate_for(attribute) {
            return None;
        }
        let parent = node.parent;
        let attachment_id = node.id;

        let root = self.arena.allocate(|id| {
            let mut leaf = Node::new_leaf(id, vec![], num_classes, true, parent);
            leaf.mainline_attachment = Some(attachment);
            leaf
        });
        let split = self.arena.get_mut(attachment).and_then(Node::as_split_mut)?;
        if split.alternates.is_empty() {
            split.reset_trial();
        }
        split.alternates.push(Alternate::new(root, attribute));

        if let Some(alt) = self.arena.get(root) {
            self.stats.alternates.add(alt);
        }
        self.stats.alternates_spawned += 1;
        self.events
            .on_alternate_spawned(attachment_id, root.id(), attribute);
        Some(root)
    }

    /// Re-ranks the attributes of a split node against the installed one and
    /// starts an alternate for a clearly better attribute.
    pub(super) fn re_evaluate_split(&mut self, split_ref: NodeRef) {
        if !self.may_hold_alternates(split_ref) {
            return;
        }
        let Some(node) = self.arena.get(split_ref) else {
            return;
        };
        let Some(split) = node.as_split() else {
            return;
        };
        let Some(current) = split.split_attribute() else {
            return;
        };

        let mut suggestions: Vec<AttributeSplitSuggestion> = node
            .get_best_split_suggestions(
                self.split_criterion.as_ref(),
                true,
                self.options.binary_splits,
            )
            .into_iter()
            .filter(|s| s.get_split_test().is_some())
            .collect();
        suggestions.sort_by(AttributeSplitSuggestion::compare_merit);

        let Some(best) = suggestions.last() else {
            return;
        };
        let Some(best_attribute) = best.split_attribute() else {
            return;
        };
        if best_attribute == current {
            return;
        }
        let Some(current_merit) = suggestions
            .iter()
            .find(|s| s.split_attribute() == Some(current))
            .map(AttributeSplitSuggestion::get_merit)
        else {
            return;
        };

        let hoeffding_bound = Self::compute_hoeffding_bound(
            self.split_criterion
                .get_range_of_merit(&node.observed_class_distribution),
            self.options.split_confidence,
            node.total_weight_seen(),
        );
        let tie_threshold = self.options.tie_threshold;
        let delta_g = best.get_merit() - current_merit;
        let better = delta_g > hoeffding_bound
            || (hoeffding_bound < tie_threshold && delta_g > tie_threshold / 2.0);

        if better && !split.has_alternate_for(Some(best_attribute)) {
            self.spawn_alternate(split_ref, Some(best_attribute));
        }
    }

    /// Puts the alternate rooted at `winner` in place of `old` and frees the
    /// subtree `old` headed. Its other alternates are pruned with it.
    pub(super) fn promote_alternate(&mut self, old: NodeRef, winner: NodeRef) {
        let Some(old_node) = self.arena.get(old) else {
            return;
        };
        let old_parent = old_node.parent;
        let old_is_alternate = old_node.is_alternate;
        let old_attachment = old_node.mainline_attachment;
        let old_id = old_node.id;

        if let Some(split) = self.arena.get_mut(old).and_then(Node::as_split_mut) {
            split.alternates.retain(|a| a.root != winner);
        }

        if self.root == Some(old) {
            self.root = Some(winner);
        } else if let Some(attachment) = old_attachment {
            // `old` heads an alternate itself; it leaves that list as pruned.
            if let Some(node) = self.arena.get_mut(attachment) {
                let attachment_id = node.id;
                if let Some(split) = node.as_split_mut() {
                    for alternate in split.alternates.iter_mut().filter(|a| a.root == old) {
                        alternate.root = winner;
                    }
                }
                self.stats.alternates_pruned += 1;
                self.events.on_alternate_pruned(attachment_id, old_id);
            }
        } else if let Some(parent) = old_parent {
            if let Some(split) = self.arena.get_mut(parent).and_then(Node::as_split_mut) {
                for child in split.children.iter_mut().filter(|c| **c == Some(old)) {
                    *child = Some(winner);
                }
            }
        }

        if let Some(node) = self.arena.get_mut(winner) {
            node.parent = old_parent;
            node.mainline_attachment = old_attachment;
        }
        self.set_subtree_alternate_flag(winner, old_is_alternate);
        self.free_subtree(old);

        self.stats.alternates_promoted += 1;
        self.events.on_alternate_promoted(old_id, winner.id());
    }

    pub(super) fn prune_alternate(&mut self, attachment: NodeRef, root: NodeRef) {
        let Some(node) = self.arena.get_mut(attachment) else {
            return;
        };
        let attachment_id = node.id;
        let Some(split) = node.as_split_mut() else {
            return;
        };
        let before = split.alternates.len();
        split.alternates.retain(|a| a.root != root);
        if split.alternates.len() == before {
            return;
        }
        if split.alternates.is_empty() {
            split.reset_trial();
        }
        self.free_subtree(root);
        self.stats.alternates_pruned += 1;
        self.events.on_alternate_pruned(attachment_id, root.id());
    }

    /// Relabels the subtree below `root` (children links only) as mainline or
    /// alternate and moves its nodes between the two counts.
    fn set_subtree_alternate_flag(&mut self, root: NodeRef, is_alternate: bool) {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let Some(node) = self.arena.get_mut(current) else {
                continue;
            };
            if node.is_alternate != is_alternate {
                self.stats.counts_for(node.is_alternate).remove(node);
                node.is_alternate = is_alternate;
                self.stats.counts_for(is_alternate).add(node);
            }
            if let NodeKind::Split(split) = &node.kind {
                stack.extend(split.children.iter().flatten().copied());
            }
        }
    }

    /// Releases `root`, every node below it and every alternate hanging off
    /// those nodes. Alternates released this way count as pruned.
    pub(super) fn free_subtree(&mut self, root: NodeRef) {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let Some(node) = self.arena.remove(current) else {
                continue;
            };
            self.stats.counts_for(node.is_alternate).remove(&node);
            if let NodeKind::Split(split) = node.kind {
                stack.extend(split.children.into_iter().flatten());
                for alternate in split.alternates {
                    self.stats.alternates_pruned += 1;
                    self.events.on_alternate_pruned(node.id, alternate.root.id());
                    stack.push(alternate.root);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifiers::hoeffding_tree::leaf_prediction_option::LeafPredictionOption;
    use crate::classifiers::hoeffding_tree::options::TreeOptions;
    use crate::testing::{RecordedEvent, RecordingEvents, labeled, nominal_header};

    /// Root split on x0 with two leaf children, grown from data.
    pub(crate) fn split_tree(options: TreeOptions) -> AdaptiveHoeffdingTree {
        let header = nominal_header(&[2, 2], 2);
        let mut tree = AdaptiveHoeffdingTree::new(TreeOptions {
            grace_period: 4,
            leaf_prediction: LeafPredictionOption::MajorityClass,
            ..options
        })
        .unwrap();
        let cycle = [([0.0, 0.0], 0), ([0.0, 1.0], 0), ([1.0, 0.0], 1), ([1.0, 1.0], 1)];
        for (x, c) in cycle.iter().cycle().take(12) {
            tree.train(&labeled(&header, x, *c)).unwrap();
        }
        assert!(!tree.node(tree.root().unwrap()).unwrap().is_leaf());
        tree
    }

    /// `split_tree` with its x0 = 1 child turned into a split on x1.
    pub(crate) fn nested_split_tree(options: TreeOptions) -> (AdaptiveHoeffdingTree, NodeRef) {
        let header = nominal_header(&[2, 2], 2);
        let mut tree = split_tree(options);
        let root = tree.root().unwrap();
        let child = tree.node(root).unwrap().as_split().unwrap().child(1).unwrap();
        for (x, c) in [([1.0, 0.0], 0), ([1.0, 1.0], 1)] {
            tree.train(&labeled(&header, &x, c)).unwrap();
        }
        let suggestion = tree
            .node(child)
            .unwrap()
            .get_best_split_suggestions(tree.split_criterion.as_ref(), true, false)
            .into_iter()
            .find(|s| s.split_attribute() == Some(1))
            .unwrap();
        tree.convert_leaf_to_split(child, suggestion);
        (tree, child)
    }

    #[test]
    fn spawned_alternate_is_detached_from_children() {
        let mut tree = split_tree(TreeOptions::default());
        let root = tree.root().unwrap();
        let alt = tree.spawn_alternate(root, Some(1)).unwrap();

        let alt_node = tree.node(alt).unwrap();
        assert!(alt_node.is_alternate());
        assert_eq!(alt_node.mainline_attachment(), Some(root));
        assert_eq!(alt_node.parent(), None);

        let split = tree.node(root).unwrap().as_split().unwrap();
        assert!(!split.children().contains(&Some(alt)));
        assert_eq!(split.alternates().len(), 1);
        assert_eq!(tree.stats().alternates.active_leaves, 1);
        assert_eq!(tree.stats().alternates_spawned, 1);

        assert!(tree.spawn_alternate(root, Some(1)).is_none());
        assert!(tree.spawn_alternate(root, None).is_some());
        assert_eq!(tree.stats().alternates_spawned, 2);
    }

    #[test]
    fn spawning_on_a_leaf_is_refused() {
        let mut tree = split_tree(TreeOptions::default());
        let root = tree.root().unwrap();
        let child = tree.node(root).unwrap().as_split().unwrap().child(0).unwrap();
        assert!(tree.spawn_alternate(child, None).is_none());
    }

    #[test]
    fn promotion_at_root_swaps_counts() {
        let mut tree = split_tree(TreeOptions::default());
        let root = tree.root().unwrap();
        let alt = tree.spawn_alternate(root, None).unwrap();
        let nodes_before = tree.node_count();

        tree.promote_alternate(root, alt);

        assert_eq!(tree.root(), Some(alt));
        let node = tree.node(alt).unwrap();
        assert!(!node.is_alternate());
        assert_eq!(node.mainline_attachment(), None);
        assert_eq!(node.parent(), None);
        assert!(tree.node(root).is_none());
        assert_eq!(tree.node_count(), nodes_before - 3);

        assert_eq!(tree.stats().mainline.decision_nodes, 0);
        assert_eq!(tree.stats().mainline.active_leaves, 1);
        assert_eq!(tree.stats().alternates.total(), 0);
        assert_eq!(tree.stats().alternates_promoted, 1);
    }

    #[test]
    fn promotion_below_root_rewires_parent_child() {
        let (mut tree, child) = nested_split_tree(TreeOptions::default());
        let root = tree.root().unwrap();
        let alt = tree.spawn_alternate(child, None).unwrap();
        assert_eq!(tree.node(alt).unwrap().parent(), Some(root));

        tree.promote_alternate(child, alt);

        let split = tree.node(root).unwrap().as_split().unwrap();
        assert_eq!(split.child(1), Some(alt));
        assert_eq!(tree.node(alt).unwrap().parent(), Some(root));
        assert!(!tree.node(alt).unwrap().is_alternate());
        assert_eq!(tree.stats().mainline.decision_nodes, 1);
        assert_eq!(tree.stats().mainline.active_leaves, 2);
        assert_eq!(tree.stats().alternates.total(), 0);
    }

    #[test]
    fn splitting_an_alternate_root_keeps_it_attached() {
        let header = nominal_header(&[2, 2], 2);
        let (mut tree, child) = nested_split_tree(TreeOptions::default());
        let root = tree.root().unwrap();
        let alt = tree.spawn_alternate(child, Some(0)).unwrap();

        // x1 decides the class below `child`, so the alternate leaf splits on it.
        let cycle = [([1.0, 0.0], 0), ([1.0, 1.0], 1)];
        for (x, c) in cycle.iter().cycle().take(40) {
            tree.train(&labeled(&header, x, *c)).unwrap();
        }

        let node = tree.node(alt).unwrap();
        assert!(!node.is_leaf());
        assert!(node.is_alternate());
        assert_eq!(node.mainline_attachment(), Some(child));
        assert_eq!(node.parent(), Some(root));
        let grown = node.as_split().unwrap();
        for leaf in grown.children().iter().flatten() {
            let leaf = tree.node(*leaf).unwrap();
            assert!(leaf.is_alternate());
            assert_eq!(leaf.parent(), Some(alt));
        }

        let attachment = tree.node(child).unwrap().as_split().unwrap();
        assert_eq!(attachment.alternates().len(), 1);
        assert_eq!(attachment.alternates()[0].root, alt);
        let parent = tree.node(root).unwrap().as_split().unwrap();
        assert!(!parent.children().contains(&Some(alt)));
        assert_eq!(parent.child(1), Some(child));

        assert_eq!(tree.stats().alternates.decision_nodes, 1);
        tree.validate_structure().unwrap();
    }

    #[test]
    fn promotion_prunes_the_other_alternates() {
        let recorder = RecordingEvents::default();
        let mut tree = split_tree(TreeOptions::default());
        tree.events = Box::new(recorder.clone());
        let root = tree.root().unwrap();
        let loser = tree.spawn_alternate(root, Some(1)).unwrap();
        let winner = tree.spawn_alternate(root, None).unwrap();

        tree.promote_alternate(root, winner);

        assert!(tree.node(loser).is_none());
        let stats = tree.stats();
        assert_eq!(stats.alternates_spawned, 2);
        assert_eq!(stats.alternates_promoted, 1);
        assert_eq!(stats.alternates_pruned, 1);
        assert!(recorder.events().contains(&RecordedEvent::AlternatePruned {
            node: root.id(),
            alternate: loser.id(),
        }));
    }

    #[test]
    fn pruning_frees_the_alternate_subtree() {
        let mut tree = split_tree(TreeOptions::default());
        let root = tree.root().unwrap();
        let alt = tree.spawn_alternate(root, None).unwrap();
        let nodes_before = tree.node_count();

        tree.prune_alternate(root, alt);

        assert!(tree.node(alt).is_none());
        assert_eq!(tree.node_count(), nodes_before - 1);
        assert_eq!(tree.stats().alternates.total(), 0);
        assert_eq!(tree.stats().alternates_pruned, 1);
        assert!(tree.node(root).unwrap().as_split().unwrap().alternates().is_empty());

        tree.prune_alternate(root, alt);
        assert_eq!(tree.stats().alternates_pruned, 1);
    }
}
