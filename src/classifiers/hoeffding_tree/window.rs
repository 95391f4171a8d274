use crate::classifiers::hoeffding_tree::adaptive_hoeffding_tree::AdaptiveHoeffdingTree;
use crate::classifiers::hoeffding_tree::nodes::{NodeKind, NodeRef};
use crate::core::instance_header::InstanceHeader;
use crate::core::instances::Instance;
use std::collections::VecDeque;

/// An instance the tree learned, with what is needed to unlearn it.
pub struct WindowEntry {
    instance: Box<dyn Instance>,
    max_visited_id: u64,
    seen_at: u64,
    frozen: Vec<u64>,
}

impl WindowEntry {
    pub fn new(instance: Box<dyn Instance>, max_visited_id: u64, seen_at: u64) -> Self {
        Self {
            instance,
            max_visited_id,
            seen_at,
            frozen: Vec::new(),
        }
    }

    /// Marks nodes that only scored the instance during a test phase. They
    /// and everything below them are skipped when it is forgotten.
    pub fn with_frozen(mut self, frozen: Vec<u64>) -> Self {
        self.frozen = frozen;
        self
    }

    pub fn frozen(&self) -> &[u64] {
        &self.frozen
    }

    pub fn instance(&self) -> &dyn Instance {
        self.instance.as_ref()
    }

    /// Largest node id that existed on the instance's learning path.
    pub fn max_visited_id(&self) -> u64 {
        self.max_visited_id
    }

    /// Position of the instance in the training sequence.
    pub fn seen_at(&self) -> u64 {
        self.seen_at
    }
}

/// FIFO of the last `capacity` learned instances. A capacity of 0 keeps
/// nothing and the tree never forgets.
pub struct SlidingWindow {
    entries: VecDeque<WindowEntry>,
    capacity: usize,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Pops the oldest entry when one more would not fit.
    pub fn evict_if_full(&mut self) -> Option<WindowEntry> {
        if self.capacity == 0 || self.entries.len() < self.capacity {
            return None;
        }
        self.entries.pop_front()
    }

    pub fn push(&mut self, entry: WindowEntry) {
        if self.capacity == 0 {
            return;
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &WindowEntry> {
        self.entries.iter()
    }
}

impl AdaptiveHoeffdingTree {
    /// Removes the contribution of an evicted instance from every node that
    /// existed when it was learned.
    pub(super) fn forget(&mut self, entry: &WindowEntry) {
        let Some(header) = self.header.clone() else {
            return;
        };
        let Some(root) = self.root else {
            return;
        };
        let instance = entry.instance();
        let Some(class) = instance.class_value() else {
            return;
        };
        let class = class as usize;
        let weight = instance.weight();

        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            self.unlearn_node(current, entry, &header, class, weight, &mut stack);
        }

        self.stats.instances_forgotten += 1;
        self.events.on_forget(entry.seen_at());
    }

    /// Unlearns at one node and queues the nodes below it that were on the
    /// instance's path: the alternates and the child of the branch taken.
    fn unlearn_node(
        &mut self,
        node_ref: NodeRef,
        entry: &WindowEntry,
        header: &InstanceHeader,
        class: usize,
        weight: f64,
        stack: &mut Vec<NodeRef>,
    ) {
        let Some(node) = self.arena.get_mut(node_ref) else {
            return;
        };
        if node.id > entry.max_visited_id() || entry.frozen().contains(&node.id) {
            return;
        }

        if let Some(count) = node.observed_class_distribution.get_mut(class) {
            *count = (*count - weight).max(0.0);
        }
        if node.observers_since.is_some_and(|since| since <= entry.seen_at()) {
            node.observe_attributes(header, entry.instance(), class, -weight);
        }

        if let NodeKind::Split(split) = &node.kind {
            stack.extend(split.alternates.iter().map(|a| a.root));
            if let Some(child) = split
                .split_test
                .branch_for_instance(entry.instance())
                .and_then(|b| split.child(b))
            {
                stack.push(child);
            }
        }
    }
}
