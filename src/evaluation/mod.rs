mod estimators;
mod evaluators;
mod measurement;
mod preview;

pub use estimators::{BasicEstimator, Estimator};
pub use evaluators::{BasicClassificationEvaluator, EvaluatorFlags, PerformanceEvaluator};
pub use measurement::{Measurement, find_measurement};
pub use preview::learning_curve::{CurveFormat, LearningCurve};
pub use preview::snapshot::Snapshot;
