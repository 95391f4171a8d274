mod arena;
mod found_node;
mod learning_node;
mod node;
mod split_node;

pub use arena::{NodeArena, NodeRef};
pub use found_node::FoundNode;
pub use learning_node::LearningNode;
pub use node::{Node, NodeKind};
pub use split_node::{Alternate, AlternatePhase, SplitNode, TrialState};
