mod recording_events;
mod train_spy_classifier;

pub use recording_events::{RecordedEvent, RecordingEvents};
pub use train_spy_classifier::{TrainSpyClassifier, TrainSpyHandle};
