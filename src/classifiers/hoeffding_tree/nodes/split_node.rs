use crate::classifiers::hoeffding_tree::instance_conditional_test::InstanceConditionalTest;
use crate::classifiers::hoeffding_tree::nodes::NodeRef;
use crate::utils::memory::{MemoryMeter, MemorySized};
use std::mem::size_of;

/// An alternate subtree hanging off a split node.
#[derive(Debug, Clone, PartialEq)]
pub struct Alternate {
    pub root: NodeRef,
    /// Attribute that motivated the alternate, `None` when drift did.
    pub attribute: Option<usize>,
    pub test_errors: f64,
    pub best_margin: Option<f64>,
}

impl Alternate {
    pub fn new(root: NodeRef, attribute: Option<usize>) -> Self {
        Self {
            root,
            attribute,
            test_errors: 0.0,
            best_margin: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrialState {
    Growing { weight_since_test: f64 },
    Testing { remaining: u64, mainline_errors: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlternatePhase {
    /// No alternates.
    Stable,
    Growing,
    /// The subtree is frozen and scored against its alternates.
    Testing,
}

pub struct SplitNode {
    pub(crate) split_test: Box<dyn InstanceConditionalTest>,
    pub(crate) children: Vec<Option<NodeRef>>,
    pub(crate) alternates: Vec<Alternate>,
    pub(crate) weight_since_reevaluation: f64,
    pub(crate) trial: TrialState,
}

impl SplitNode {
    pub fn new(split_test: Box<dyn InstanceConditionalTest>, children: Vec<Option<NodeRef>>) -> Self {
        Self {
            split_test,
            children,
            alternates: Vec::new(),
            weight_since_reevaluation: 0.0,
            trial: TrialState::Growing {
                weight_since_test: 0.0,
            },
        }
    }

    pub fn split_test(&self) -> &dyn InstanceConditionalTest {
        self.split_test.as_ref()
    }

    /// First attribute the split test depends on.
    pub fn split_attribute(&self) -> Option<usize> {
        Some(self.split_test.attribute())
    }

    pub fn children(&self) -> &[Option<NodeRef>] {
        &self.children
    }

    pub fn child(&self, branch: usize) -> Option<NodeRef> {
        self.children.get(branch).copied().flatten()
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn set_child(&mut self, branch: usize, child: NodeRef) {
        if branch >= self.children.len() {
            self.children.resize(branch + 1, None);
        }
        self.children[branch] = Some(child);
    }

    pub fn alternates(&self) -> &[Alternate] {
        &self.alternates
    }

    pub fn has_alternate_for(&self, attribute: Option<usize>) -> bool {
        self.alternates.iter().any(|a| a.attribute == attribute)
    }

    pub fn trial(&self) -> TrialState {
        self.trial
    }

    pub fn phase(&self) -> AlternatePhase {
        match self.trial {
            _ if self.alternates.is_empty() => AlternatePhase::Stable,
            TrialState::Growing { .. } => AlternatePhase::Growing,
            TrialState::Testing { .. } => AlternatePhase::Testing,
        }
    }

    pub(crate) fn reset_trial(&mut self) {
        self.trial = TrialState::Growing {
            weight_since_test: 0.0,
        };
        for alternate in &mut self.alternates {
            alternate.test_errors = 0.0;
        }
    }
}

impl MemorySized for SplitNode {
    fn inline_size(&self) -> usize {
        size_of::<Self>()
    }

    fn extra_heap_size(&self, meter: &mut MemoryMeter) -> usize {
        meter.measure_field(&self.split_test)
            + self.children.capacity() * size_of::<Option<NodeRef>>()
            + self.alternates.capacity() * size_of::<Alternate>()
    }
}
