mod adaptive_hoeffding_tree;
mod alternates;
mod events;
mod growth;
pub mod instance_conditional_test;
pub mod leaf_prediction_option;
mod learning;
mod memory_management;
pub mod nodes;
mod options;
pub mod split_criteria;
mod stats;
mod structure;
mod window;

#[cfg(test)]
mod scenarios;

pub use adaptive_hoeffding_tree::AdaptiveHoeffdingTree;
pub use events::{LoggingTreeEvents, NoopTreeEvents, TreeEvents};
pub use options::{ErrorBoundParams, OptionsError, PromotionStrategy, TreeOptions, TrialWindowParams};
pub use stats::{NodeCounts, TreeStats};
pub use structure::StructureError;
pub use window::WindowEntry;
