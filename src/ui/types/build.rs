use crate::classifiers::hoeffding_tree::LoggingTreeEvents;
use crate::classifiers::{AdaptiveHoeffdingTree, Classifier};
use crate::evaluation::{BasicClassificationEvaluator, BasicEstimator, PerformanceEvaluator};
use crate::streams::{AbruptDriftGenerator, ArffFileStream, GradualDriftGenerator, Stream};
use crate::ui::types::choices::{EvaluatorChoice, LearnerChoice, StreamChoice};
use anyhow::{Context, Result};

pub fn build_learner(choice: LearnerChoice) -> Result<Box<dyn Classifier>> {
    match choice {
        LearnerChoice::AdaptiveHoeffdingTree(options) => {
            let tree = AdaptiveHoeffdingTree::new(options)
                .context("invalid adaptive Hoeffding tree options")?
                .with_events(Box::new(LoggingTreeEvents));
            Ok(Box::new(tree))
        }
    }
}

pub fn build_stream(choice: StreamChoice) -> Result<Box<dyn Stream>> {
    match choice {
        StreamChoice::ArffFile(p) => {
            let stream = ArffFileStream::new(&p.path, p.class_index)
                .with_context(|| format!("cannot open {}", p.path.display()))?;
            Ok(Box::new(stream))
        }
        StreamChoice::AbruptDrift(p) => Ok(Box::new(
            AbruptDriftGenerator::new(p).context("invalid abrupt drift parameters")?,
        )),
        StreamChoice::GradualDrift(p) => Ok(Box::new(
            GradualDriftGenerator::new(p).context("invalid gradual drift parameters")?,
        )),
    }
}

/// The evaluator is sized from the stream's class count; it grows if more
/// classes show up.
pub fn build_evaluator(
    choice: EvaluatorChoice,
    num_classes: usize,
) -> Result<Box<dyn PerformanceEvaluator>> {
    match choice {
        EvaluatorChoice::BasicClassification(flags) => Ok(Box::new(
            BasicClassificationEvaluator::<BasicEstimator>::new(num_classes, flags),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifiers::hoeffding_tree::TreeOptions;
    use crate::evaluation::EvaluatorFlags;
    use crate::streams::{AbruptDriftParams, GradualDriftParams};
    use crate::ui::types::choices::ArffParameters;

    #[test]
    fn builds_the_drift_stream_and_tree() {
        let mut stream = build_stream(StreamChoice::AbruptDrift(AbruptDriftParams::default())).unwrap();
        assert_eq!(stream.header().number_of_classes(), 2);
        let mut learner = build_learner(LearnerChoice::AdaptiveHoeffdingTree(TreeOptions::default())).unwrap();
        let instance = stream.next_instance().unwrap();
        learner.train_on_instance(instance.as_ref()).unwrap();
        assert_eq!(learner.get_votes_for_instance(instance.as_ref()).len(), 2);
    }

    #[test]
    fn invalid_components_report_errors() {
        let bad_tree = TreeOptions {
            split_confidence: 2.0,
            ..TreeOptions::default()
        };
        assert!(build_learner(LearnerChoice::AdaptiveHoeffdingTree(bad_tree)).is_err());
        let missing = ArffParameters {
            path: "does/not/exist.arff".into(),
            class_index: None,
        };
        assert!(build_stream(StreamChoice::ArffFile(missing)).is_err());
        let mut bad_drift = GradualDriftParams::default();
        bad_drift.drift.attributes = 0;
        assert!(build_stream(StreamChoice::GradualDrift(bad_drift)).is_err());
        assert!(build_stream(StreamChoice::GradualDrift(GradualDriftParams::default())).is_ok());
        assert!(build_evaluator(EvaluatorChoice::BasicClassification(EvaluatorFlags::default()), 2).is_ok());
    }
}
