mod abrupt_drift_generator;
mod gradual_drift_generator;

pub use abrupt_drift_generator::{AbruptDriftGenerator, AbruptDriftParams};
pub use gradual_drift_generator::{GradualDriftGenerator, GradualDriftParams};
