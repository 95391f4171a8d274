pub mod attribute_class_observers;
pub mod bayes;
mod classifier;
pub mod conditional_tests;
mod error;
pub mod hoeffding_tree;

pub use classifier::Classifier;
pub use error::ClassifierError;
pub use hoeffding_tree::AdaptiveHoeffdingTree;
