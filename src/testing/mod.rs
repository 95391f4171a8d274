//! Test doubles shared by unit tests and downstream crates (`test-support`).

pub mod dummies;
mod headers;
pub mod spies;
pub mod stubs;

pub use dummies::ClassifierNoneVotes;
pub use headers::{labeled, nominal_header, nominal_header_with_class_at, numeric_header, raw, weighted};
pub use spies::{RecordedEvent, RecordingEvents, TrainSpyClassifier, TrainSpyHandle};
pub use stubs::{OracleClassifier, VecStream};
