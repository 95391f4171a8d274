pub mod arff;
pub mod generators;
pub mod stream;

pub use arff::ArffFileStream;
pub use generators::{
    AbruptDriftGenerator, AbruptDriftParams, GradualDriftGenerator, GradualDriftParams,
};
pub use stream::Stream;
