use crate::classifiers::hoeffding_tree::adaptive_hoeffding_tree::AdaptiveHoeffdingTree;
use crate::classifiers::hoeffding_tree::nodes::{NodeKind, NodeRef};
use crate::classifiers::hoeffding_tree::stats::NodeCounts;
use std::collections::HashSet;
use thiserror::Error;

/// A broken link or count found by [`AdaptiveHoeffdingTree::validate_structure`].
/// Node values are ids.
#[derive(Debug, Error, PartialEq)]
pub enum StructureError {
    #[error("Root {0} has a parent or is marked as an alternate.")]
    BadRoot(u64),
    #[error("Node {0} is reachable more than once.")]
    Revisited(u64),
    #[error("Node {node} does not point back to {expected} as its parent.")]
    WrongParent { node: u64, expected: u64 },
    #[error("Node {node} is not newer than its parent {parent}.")]
    IdOrder { node: u64, parent: u64 },
    #[error("Node {0} disagrees with its parent on being an alternate.")]
    AlternateFlag(u64),
    #[error("Alternate root {node} is not attached to {attachment}.")]
    DetachedAlternate { node: u64, attachment: u64 },
    #[error("Node {0} carries a mainline attachment but heads no alternate.")]
    StrayAttachment(u64),
    #[error("{0} nodes are stored but unreachable from the root.")]
    Unreachable(usize),
    #[error("Recorded {recorded:?} nodes but found {found:?}.")]
    Counts { recorded: NodeCounts, found: NodeCounts },
}

impl AdaptiveHoeffdingTree {
    /// Walks the whole arena and checks every link and counter the engine
    /// maintains. Meant for tests and debugging; linear in the tree size.
    pub fn validate_structure(&self) -> Result<(), StructureError> {
        let Some(root) = self.root else {
            return match self.arena.len() {
                0 => Ok(()),
                n => Err(StructureError::Unreachable(n)),
            };
        };
        let root_node = self
            .arena
            .get(root)
            .ok_or(StructureError::Unreachable(self.arena.len()))?;
        if root_node.parent.is_some()
            || root_node.is_alternate
            || root_node.mainline_attachment.is_some()
        {
            return Err(StructureError::BadRoot(root_node.id));
        }

        let mut seen = HashSet::new();
        let mut mainline = NodeCounts::default();
        let mut alternates = NodeCounts::default();
        let mut stack: Vec<NodeRef> = vec![root];
        while let Some(current) = stack.pop() {
            let Some(node) = self.arena.get(current) else {
                continue;
            };
            if !seen.insert(node.id) {
                return Err(StructureError::Revisited(node.id));
            }
            if node.is_alternate {
                alternates.add(node);
            } else {
                mainline.add(node);
            }

            let NodeKind::Split(split) = &node.kind else {
                continue;
            };
            for child_ref in split.children.iter().flatten() {
                let Some(child) = self.arena.get(*child_ref) else {
                    continue;
                };
                if child.parent != Some(current) {
                    return Err(StructureError::WrongParent {
                        node: child.id,
                        expected: node.id,
                    });
                }
                if child.id <= node.id {
                    return Err(StructureError::IdOrder {
                        node: child.id,
                        parent: node.id,
                    });
                }
                if child.is_alternate != node.is_alternate {
                    return Err(StructureError::AlternateFlag(child.id));
                }
                if child.mainline_attachment.is_some() {
                    return Err(StructureError::StrayAttachment(child.id));
                }
                stack.push(*child_ref);
            }
            for alternate in &split.alternates {
                let Some(alt) = self.arena.get(alternate.root) else {
                    continue;
                };
                if !alt.is_alternate
                    || alt.mainline_attachment != Some(current)
                    || alt.parent != node.parent
                    || split.children.contains(&Some(alternate.root))
                {
                    return Err(StructureError::DetachedAlternate {
                        node: alt.id,
                        attachment: node.id,
                    });
                }
                if alt.id <= node.id {
                    return Err(StructureError::IdOrder {
                        node: alt.id,
                        parent: node.id,
                    });
                }
                stack.push(alternate.root);
            }
        }

        if seen.len() != self.arena.len() {
            return Err(StructureError::Unreachable(self.arena.len() - seen.len()));
        }
        for (recorded, found) in [
            (self.stats.mainline, mainline),
            (self.stats.alternates, alternates),
        ] {
            if recorded != found {
                return Err(StructureError::Counts { recorded, found });
            }
        }
        Ok(())
    }
}
