use crate::classifiers::bayes::do_naive_bayes_prediction;
use crate::classifiers::hoeffding_tree::adaptive_hoeffding_tree::{
    AdaptiveHoeffdingTree, LearnContext,
};
use crate::classifiers::hoeffding_tree::leaf_prediction_option::LeafPredictionOption;
use crate::classifiers::hoeffding_tree::nodes::{AlternatePhase, Node, NodeKind, NodeRef, TrialState};
use crate::classifiers::hoeffding_tree::options::PromotionStrategy;
use crate::core::estimators::adwin::Adwin;
use crate::utils::math::max_index;

impl AdaptiveHoeffdingTree {
    pub(super) fn learn_node(&mut self, node: NodeRef, ctx: &mut LearnContext<'_>) {
        let Some(n) = self.arena.get(node) else {
            return;
        };
        if let PromotionStrategy::TrialWindow(params) = self.options.promotion {
            if n.as_split().is_some_and(|s| s.phase() == AlternatePhase::Testing) {
                ctx.frozen.push(n.id);
                self.score_test_instance(node, ctx.instance, ctx.class, ctx.weight, params);
                return;
            }
        }
        ctx.max_visited_id = ctx.max_visited_id.max(n.id);
        if n.is_leaf() {
            self.learn_leaf(node, ctx);
        } else {
            self.learn_split(node, ctx);
        }
    }

    fn learn_leaf(&mut self, leaf_ref: NodeRef, ctx: &mut LearnContext<'_>) {
        let adaptive = self.options.leaf_prediction == LeafPredictionOption::AdaptiveNaiveBayes;
        let Some(node) = self.arena.get(leaf_ref) else {
            return;
        };
        let leaf_correct = max_index(&self.node_votes(node, ctx.instance)) == Some(ctx.class);
        let (mc_correct, nb_correct) = if adaptive {
            let mc = max_index(&node.observed_class_distribution) == Some(ctx.class);
            let nb = max_index(&do_naive_bayes_prediction(
                &ctx.header,
                ctx.instance,
                &node.observed_class_distribution,
                &node.attribute_observers,
            )) == Some(ctx.class);
            (mc, nb)
        } else {
            (false, false)
        };

        let drift_confidence = self.options.drift_confidence;
        let grace_period = self.options.grace_period as f64;
        let Some(node) = self.arena.get_mut(leaf_ref) else {
            return;
        };
        node.add_class_weight(ctx.class, ctx.weight);

        let NodeKind::Leaf(leaf) = &mut node.kind else {
            return;
        };
        if mc_correct {
            leaf.mc_correct_weight += ctx.weight;
        }
        if nb_correct {
            leaf.nb_correct_weight += ctx.weight;
        }
        leaf.weight_since_last_split_attempt += ctx.weight;
        let is_active = leaf.is_active;
        let weight_since = leaf.weight_since_last_split_attempt;

        if is_active {
            if !node.has_observers() {
                node.init_observers(&ctx.header, ctx.seq);
            }
            node.observe_attributes(&ctx.header, ctx.instance, ctx.class, ctx.weight);
            node.error_estimator
                .get_or_insert_with(|| Adwin::new(drift_confidence))
                .observe(leaf_correct);
        }

        if self.growth_allowed && is_active && weight_since >= grace_period {
            self.attempt_to_split(leaf_ref);
            if let Some(leaf) = self.arena.get_mut(leaf_ref).and_then(Node::as_leaf_mut) {
                leaf.weight_since_last_split_attempt = 0.0;
            }
        }
    }

    fn learn_split(&mut self, split_ref: NodeRef, ctx: &mut LearnContext<'_>) {
        let correct = self.subtree_predicts(split_ref, ctx.instance, ctx.class);
        let drift_confidence = self.options.drift_confidence;

        let Some(node) = self.arena.get_mut(split_ref) else {
            return;
        };
        let estimator = node
            .error_estimator
            .get_or_insert_with(|| Adwin::new(drift_confidence));
        let error_before = estimator.estimated_error_rate();
        let changed = estimator.observe(correct);
        let error_after = estimator.estimated_error_rate();
        let drift = changed && error_after > error_before;

        node.add_class_weight(ctx.class, ctx.weight);
        if !node.has_observers() {
            node.init_observers(&ctx.header, ctx.seq);
        }
        node.observe_attributes(&ctx.header, ctx.instance, ctx.class, ctx.weight);

        let node_id = node.id;
        let Some(split) = node.as_split_mut() else {
            return;
        };
        split.weight_since_reevaluation += ctx.weight;
        let has_alternates = !split.alternates.is_empty();
        if let TrialState::Growing { weight_since_test } = &mut split.trial {
            if has_alternates {
                *weight_since_test += ctx.weight;
            }
        }
        let due_for_reevaluation = self.options.re_evaluation_period > 0
            && split.weight_since_reevaluation >= self.options.re_evaluation_period as f64;
        if due_for_reevaluation {
            split.weight_since_reevaluation = 0.0;
        }
        let no_drift_alternate = !split.has_alternate_for(None);

        let mut spawned = false;
        if drift {
            self.stats.drift_detections += 1;
            self.events.on_drift(node_id, error_after);
            if self.may_hold_alternates(split_ref) && no_drift_alternate {
                spawned = self.spawn_alternate(split_ref, None).is_some();
            }
        }

        if due_for_reevaluation {
            self.re_evaluate_split(split_ref);
        }

        if !spawned {
            match self.options.promotion {
                PromotionStrategy::ErrorBound(params) => {
                    if let Some(winner) = self.check_error_bound(split_ref, params) {
                        self.learn_node(winner, ctx);
                        return;
                    }
                }
                PromotionStrategy::TrialWindow(params) => {
                    self.maybe_start_test_phase(split_ref, params);
                }
            }
        }

        let Some(split) = self.arena.get(split_ref).and_then(Node::as_split) else {
            return;
        };
        let alternate_roots: Vec<NodeRef> = split.alternates.iter().map(|a| a.root).collect();
        let branch = split.split_test.branch_for_instance(ctx.instance);
        let child = branch.and_then(|b| split.child(b));

        for alternate in alternate_roots {
            self.learn_node(alternate, ctx);
        }

        let Some(branch) = branch else {
            return;
        };
        let child = match child {
            Some(child) if self.arena.contains(child) => child,
            _ => self.new_child_leaf(split_ref, branch),
        };
        self.learn_node(child, ctx);
    }

    /// Empty leaf for a branch the split has no child for yet.
    fn new_child_leaf(&mut self, split_ref: NodeRef, branch: usize) -> NodeRef {
        let num_classes = self.num_classes();
        let is_alternate = self
            .arena
            .get(split_ref)
            .is_some_and(|n| n.is_alternate);
        let child = self.arena.allocate(|id| {
            Node::new_leaf(id, vec![], num_classes, is_alternate, Some(split_ref))
        });
        if let Some(split) = self.arena.get_mut(split_ref).and_then(Node::as_split_mut) {
            split.set_child(branch, child);
        }
        if let Some(node) = self.arena.get(child) {
            self.stats.counts_for(is_alternate).add(node);
        }
        child
    }

    /// Nodes inside an alternate only get alternates of their own when allowed.
    pub(super) fn may_hold_alternates(&self, node: NodeRef) -> bool {
        match self.arena.get(node) {
            Some(n) => !n.is_alternate || self.options.allow_alternates_of_alternates,
            None => false,
        }
    }
}
