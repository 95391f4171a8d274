use crate::classifiers::hoeffding_tree::TreeEvents;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedEvent {
    Split {
        node: u64,
        attribute: Option<usize>,
        branches: usize,
    },
    Deactivate(u64),
    Reactivate(u64),
    Drift {
        node: u64,
        error_rate: f64,
    },
    AlternateSpawned {
        node: u64,
        alternate: u64,
        attribute: Option<usize>,
    },
    TestPhaseStarted(u64),
    TestPhaseFinished {
        node: u64,
        mainline_errors: f64,
        best_alternate_errors: f64,
    },
    AlternatePromoted {
        replaced: u64,
        promoted: u64,
    },
    AlternatePruned {
        node: u64,
        alternate: u64,
    },
    Forget(u64),
}

/// Keeps every tree event in order. Clones share the same log, so a test
/// can hand one clone to the tree and read the other.
#[derive(Debug, Default, Clone)]
pub struct RecordingEvents {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecordingEvents {
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn record(&self, event: RecordedEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl TreeEvents for RecordingEvents {
    fn on_split(&self, node: u64, attribute: Option<usize>, branches: usize) {
        self.record(RecordedEvent::Split {
            node,
            attribute,
            branches,
        });
    }

    fn on_deactivate(&self, node: u64) {
        self.record(RecordedEvent::Deactivate(node));
    }

    fn on_reactivate(&self, node: u64) {
        self.record(RecordedEvent::Reactivate(node));
    }

    fn on_drift(&self, node: u64, error_rate: f64) {
        self.record(RecordedEvent::Drift { node, error_rate });
    }

    fn on_alternate_spawned(&self, node: u64, alternate: u64, attribute: Option<usize>) {
        self.record(RecordedEvent::AlternateSpawned {
            node,
            alternate,
            attribute,
        });
    }

    fn on_test_phase_started(&self, node: u64) {
        self.record(RecordedEvent::TestPhaseStarted(node));
    }

    fn on_test_phase_finished(&self, node: u64, mainline_errors: f64, best_alternate_errors: f64) {
        self.record(RecordedEvent::TestPhaseFinished {
            node,
            mainline_errors,
            best_alternate_errors,
        });
    }

    fn on_alternate_promoted(&self, replaced: u64, promoted: u64) {
        self.record(RecordedEvent::AlternatePromoted { replaced, promoted });
    }

    fn on_alternate_pruned(&self, node: u64, alternate: u64) {
        self.record(RecordedEvent::AlternatePruned { node, alternate });
    }

    fn on_forget(&self, seen_at: u64) {
        self.record(RecordedEvent::Forget(seen_at));
    }
}
