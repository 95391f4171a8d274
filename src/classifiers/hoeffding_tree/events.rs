use log::{debug, info};

/// Structural changes of an [`AdaptiveHoeffdingTree`], reported by node id.
///
/// Every method defaults to a no-op.
///
/// [`AdaptiveHoeffdingTree`]: crate::classifiers::hoeffding_tree::AdaptiveHoeffdingTree
pub trait TreeEvents: Send + Sync {
    fn on_split(&self, _node: u64, _attribute: Option<usize>, _branches: usize) {}
    fn on_deactivate(&self, _node: u64) {}
    fn on_reactivate(&self, _node: u64) {}
    fn on_drift(&self, _node: u64, _error_rate: f64) {}
    fn on_alternate_spawned(&self, _node: u64, _alternate: u64, _attribute: Option<usize>) {}
    fn on_test_phase_started(&self, _node: u64) {}
    fn on_test_phase_finished(&self, _node: u64, _mainline_errors: f64, _best_alternate_errors: f64) {
    }
    fn on_alternate_promoted(&self, _replaced: u64, _promoted: u64) {}
    fn on_alternate_pruned(&self, _node: u64, _alternate: u64) {}
    fn on_forget(&self, _seen_at: u64) {}
}

/// Ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTreeEvents;

impl TreeEvents for NoopTreeEvents {}

/// Writes events to the `log` facade: replacements at `info`, the rest at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingTreeEvents;

impl TreeEvents for LoggingTreeEvents {
    fn on_split(&self, node: u64, attribute: Option<usize>, branches: usize) {
        debug!("node {node} split on attribute {attribute:?} into {branches} branches");
    }

    fn on_deactivate(&self, node: u64) {
        debug!("leaf {node} deactivated");
    }

    fn on_reactivate(&self, node: u64) {
        debug!("leaf {node} reactivated");
    }

    fn on_drift(&self, node: u64, error_rate: f64) {
        info!("drift detected at node {node}, error rate {error_rate:.4}");
    }

    fn on_alternate_spawned(&self, node: u64, alternate: u64, attribute: Option<usize>) {
        match attribute {
            Some(att) => info!("alternate {alternate} started at node {node} for attribute {att}"),
            None => info!("alternate {alternate} started at node {node}"),
        }
    }

    fn on_test_phase_started(&self, node: u64) {
        debug!("test phase started at node {node}");
    }

    fn on_test_phase_finished(&self, node: u64, mainline_errors: f64, best_alternate_errors: f64) {
        debug!(
            "test phase finished at node {node}: mainline {mainline_errors}, best alternate {best_alternate_errors}"
        );
    }

    fn on_alternate_promoted(&self, replaced: u64, promoted: u64) {
        info!("alternate {promoted} replaced subtree {replaced}");
    }

    fn on_alternate_pruned(&self, node: u64, alternate: u64) {
        debug!("alternate {alternate} of node {node} pruned");
    }

    fn on_forget(&self, seen_at: u64) {
        debug!("instance {seen_at} forgotten");
    }
}
