use crate::classifiers::hoeffding_tree::nodes::{Node, NodeKind};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NodeCounts {
    pub decision_nodes: usize,
    pub active_leaves: usize,
    pub inactive_leaves: usize,
}

impl NodeCounts {
    pub fn total(&self) -> usize {
        self.decision_nodes + self.active_leaves + self.inactive_leaves
    }

    pub(crate) fn add(&mut self, node: &Node) {
        *self.slot(node) += 1;
    }

    pub(crate) fn remove(&mut self, node: &Node) {
        let slot = self.slot(node);
        *slot = slot.saturating_sub(1);
    }

    fn slot(&mut self, node: &Node) -> &mut usize {
        match &node.kind {
            NodeKind::Split(_) => &mut self.decision_nodes,
            NodeKind::Leaf(leaf) if leaf.is_active => &mut self.active_leaves,
            NodeKind::Leaf(_) => &mut self.inactive_leaves,
        }
    }
}

/// Counters kept by the tree while it learns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TreeStats {
    pub mainline: NodeCounts,
    pub alternates: NodeCounts,
    pub instances_seen: u64,
    pub instances_forgotten: u64,
    pub test_instances_consumed: u64,
    pub splits: u64,
    pub drift_detections: u64,
    pub alternates_spawned: u64,
    pub alternates_promoted: u64,
    pub alternates_pruned: u64,
}

impl TreeStats {
    pub(crate) fn counts_for(&mut self, is_alternate: bool) -> &mut NodeCounts {
        if is_alternate {
            &mut self.alternates
        } else {
            &mut self.mainline
        }
    }
}
