use crate::classifiers::hoeffding_tree::nodes::Node;
use crate::utils::memory::{MemoryMeter, MemorySized};
use std::mem::size_of;

/// Handle to a node stored in a [`NodeArena`].
///
/// A handle remembers the id of the node it was issued for. Ids are never
/// reused, so a handle to a freed node stays dead even after its slot is
/// recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    slot: usize,
    id: u64,
}

impl NodeRef {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Default)]
pub struct NodeArena {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    next_id: u64,
    live: usize,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the node built by `build`, which receives the fresh id.
    pub fn allocate(&mut self, build: impl FnOnce(u64) -> Node) -> NodeRef {
        let id = self.next_id;
        self.next_id += 1;
        let node = build(id);
        debug_assert_eq!(node.id(), id);

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.live += 1;
        NodeRef { slot, id }
    }

    pub fn get(&self, node: NodeRef) -> Option<&Node> {
        self.slots
            .get(node.slot)
            .and_then(Option::as_ref)
            .filter(|n| n.id() == node.id)
    }

    pub fn get_mut(&mut self, node: NodeRef) -> Option<&mut Node> {
        self.slots
            .get_mut(node.slot)
            .and_then(Option::as_mut)
            .filter(|n| n.id() == node.id)
    }

    pub fn contains(&self, node: NodeRef) -> bool {
        self.get(node).is_some()
    }

    pub fn remove(&mut self, node: NodeRef) -> Option<Node> {
        if !self.contains(node) {
            return None;
        }
        let removed = self.slots[node.slot].take();
        self.free.push(node.slot);
        self.live -= 1;
        removed
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Id the next allocated node will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeRef, &Node)> {
        self.slots.iter().enumerate().filter_map(|(slot, n)| {
            n.as_ref().map(|node| {
                (
                    NodeRef {
                        slot,
                        id: node.id(),
                    },
                    node,
                )
            })
        })
    }
}

impl MemorySized for NodeArena {
    fn inline_size(&self) -> usize {
        size_of::<Self>()
    }

    fn extra_heap_size(&self, meter: &mut MemoryMeter) -> usize {
        meter.measure_field(&self.slots) + self.free.capacity() * size_of::<usize>()
    }
}
