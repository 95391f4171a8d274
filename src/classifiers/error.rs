use thiserror::Error;

/// Errors surfaced by [`Classifier::train_on_instance`](crate::classifiers::Classifier).
/// They are raised before any model state is touched.
#[derive(Debug, Error, PartialEq)]
pub enum ClassifierError {
    /// The instance does not match the schema the model was built for.
    #[error("Instance has {found} attributes, but the model schema expects {expected}.")]
    InvalidInstance { expected: usize, found: usize },
    /// A nominal value (or the class) that is not one of the schema's
    /// indices.
    #[error("Value {value} of attribute {attribute} is not a valid index for the schema.")]
    InvalidValue { attribute: usize, value: f64 },
    #[error("Instance carries no class value.")]
    MissingClassValue,
    #[error("Class value {class} is outside the {classes} classes of the schema.")]
    UnknownClass { class: usize, classes: usize },
    #[error("Training weight must be non-negative, but {0} was provided.")]
    NegativeWeight(f64),
}
