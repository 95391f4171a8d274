use crate::classifiers::hoeffding_tree::adaptive_hoeffding_tree::AdaptiveHoeffdingTree;
use crate::classifiers::hoeffding_tree::nodes::{Node, NodeRef, TrialState};
use crate::classifiers::hoeffding_tree::options::TrialWindowParams;
use crate::core::instances::Instance;

impl AdaptiveHoeffdingTree {
    /// Starts a test phase once the node has grown alternates for
    /// `test_phase_frequency` weight.
    pub(crate) fn maybe_start_test_phase(&mut self, split_ref: NodeRef, params: TrialWindowParams) {
        let Some(node) = self.arena.get_mut(split_ref) else {
            return;
        };
        let node_id = node.id;
        let Some(split) = node.as_split_mut() else {
            return;
        };
        if split.alternates.is_empty() {
            return;
        }
        let TrialState::Growing { weight_since_test } = split.trial else {
            return;
        };
        if weight_since_test < params.test_phase_frequency as f64 {
            return;
        }
        split.trial = TrialState::Testing {
            remaining: params.test_phase_length,
            mainline_errors: 0.0,
        };
        for alternate in &mut split.alternates {
            alternate.test_errors = 0.0;
        }
        self.events.on_test_phase_started(node_id);
    }

    /// Scores `instance` against the mainline subtree and every alternate of
    /// a testing node. Neither side learns it.
    pub(crate) fn score_test_instance(
        &mut self,
        split_ref: NodeRef,
        instance: &dyn Instance,
        class: usize,
        weight: f64,
        params: TrialWindowParams,
    ) {
        let mainline_correct = self.subtree_predicts(split_ref, instance, class);
        let Some(split) = self.arena.get(split_ref).and_then(Node::as_split) else {
            return;
        };
        let alternates_correct: Vec<bool> = split
            .alternates
            .iter()
            .map(|a| self.subtree_predicts(a.root, instance, class))
            .collect();

        let Some(split) = self.arena.get_mut(split_ref).and_then(Node::as_split_mut) else {
            return;
        };
        let TrialState::Testing {
            remaining,
            mainline_errors,
        } = &mut split.trial
        else {
            return;
        };
        if !mainline_correct {
            *mainline_errors += weight;
        }
        *remaining = remaining.saturating_sub(1);
        self.stats.test_instances_consumed += 1;
        let finished = *remaining == 0;
        for (alternate, correct) in split.alternates.iter_mut().zip(alternates_correct) {
            if !correct {
                alternate.test_errors += weight;
            }
        }

        if finished {
            self.conclude_test_phase(split_ref, params);
        }
    }

    /// Promotes the alternate with the fewest test errors if it beat the
    /// mainline, otherwise prunes the alternates whose margin over the
    /// mainline stopped improving.
    pub(crate) fn conclude_test_phase(&mut self, split_ref: NodeRef, params: TrialWindowParams) {
        let Some(node) = self.arena.get_mut(split_ref) else {
            return;
        };
        let node_id = node.id;
        let Some(split) = node.as_split_mut() else {
            return;
        };
        let TrialState::Testing {
            mainline_errors, ..
        } = split.trial
        else {
            return;
        };

        let mut winner: Option<(usize, f64)> = None;
        for (i, alternate) in split.alternates.iter().enumerate() {
            if winner.is_none_or(|(_, best)| alternate.test_errors < best) {
                winner = Some((i, alternate.test_errors));
            }
        }
        let best_alternate_errors = winner.map_or(f64::INFINITY, |(_, e)| e);
        self.events
            .on_test_phase_finished(node_id, mainline_errors, best_alternate_errors);

        if let Some((index, errors)) = winner {
            if errors < mainline_errors {
                let winner_root = split.alternates[index].root;
                self.promote_alternate(split_ref, winner_root);
                return;
            }
        }

        let mut to_prune = Vec::new();
        for alternate in &mut split.alternates {
            let margin = mainline_errors - alternate.test_errors;
            match alternate.best_margin {
                Some(best) if margin <= best + params.prune_tolerance * best.abs() => {
                    to_prune.push(alternate.root);
                }
                _ => alternate.best_margin = Some(margin),
            }
        }
        split.reset_trial();

        for root in to_prune {
            self.prune_alternate(split_ref, root);
        }
    }
}
