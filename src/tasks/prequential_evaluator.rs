use crate::classifiers::Classifier;
use crate::evaluation::{LearningCurve, PerformanceEvaluator, Snapshot};
use crate::streams::Stream;
use cpu_time::ThreadTime;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::io::{Error, ErrorKind};
use std::sync::Arc;
use std::sync::mpsc::Sender;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Stopping and sampling rules of a prequential run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrequentialLimits {
    pub max_instances: Option<u64>,
    /// CPU seconds of the running thread.
    pub max_seconds: Option<u64>,
    pub sample_frequency: u64,
    pub mem_check_frequency: u64,
}

impl Default for PrequentialLimits {
    fn default() -> Self {
        Self {
            max_instances: None,
            max_seconds: None,
            sample_frequency: 100_000,
            mem_check_frequency: 100_000,
        }
    }
}

/// Test-then-train over a stream: every instance is first scored by the
/// learner, then used to train it.
pub struct PrequentialEvaluator {
    learner: Box<dyn Classifier>,
    stream: Box<dyn Stream>,
    evaluator: Box<dyn PerformanceEvaluator>,
    limits: PrequentialLimits,
    curve: LearningCurve,
    processed: u64,
    rejected: u64,
    cpu_start: ThreadTime,
    last_memory_check: ThreadTime,
    ram_hours: f64,
    progress: Option<Sender<Snapshot>>,
}

impl PrequentialEvaluator {
    pub fn new(
        mut learner: Box<dyn Classifier>,
        stream: Box<dyn Stream>,
        evaluator: Box<dyn PerformanceEvaluator>,
        limits: PrequentialLimits,
    ) -> Result<Self, Error> {
        if limits.sample_frequency == 0 || limits.mem_check_frequency == 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "sample_frequency and mem_check_frequency must be > 0",
            ));
        }
        learner.set_model_context(Arc::new(stream.header().clone()));

        let now = ThreadTime::now();
        Ok(Self {
            learner,
            stream,
            evaluator,
            limits,
            curve: LearningCurve::default(),
            processed: 0,
            rejected: 0,
            cpu_start: now,
            last_memory_check: now,
            ram_hours: 0.0,
            progress: None,
        })
    }

    /// Sends every snapshot to `tx` as it is taken.
    pub fn with_progress(mut self, tx: Sender<Snapshot>) -> Self {
        self.progress = Some(tx);
        self
    }

    fn limit_reached(&self) -> bool {
        self.limits
            .max_instances
            .is_some_and(|max| self.processed >= max)
            || self
                .limits
                .max_seconds
                .is_some_and(|max| self.cpu_start.elapsed().as_secs() >= max)
    }

    pub fn run(&mut self) -> Result<(), Error> {
        self.cpu_start = ThreadTime::now();
        self.last_memory_check = self.cpu_start;

        while self.stream.has_more_instances() && !self.limit_reached() {
            let Some(instance) = self.stream.next_instance() else {
                break;
            };
            self.processed += 1;

            let votes = self.learner.get_votes_for_instance(instance.as_ref());
            self.evaluator.add_result(instance.as_ref(), votes);
            if let Err(e) = self.learner.train_on_instance(instance.as_ref()) {
                self.rejected += 1;
                warn!("instance {} not learned: {e}", self.processed);
            }

            if self.processed % self.limits.mem_check_frequency == 0 {
                self.accrue_ram_hours();
            }
            if self.processed % self.limits.sample_frequency == 0 {
                self.take_snapshot();
            }
        }

        self.accrue_ram_hours();
        self.take_snapshot();
        debug!(
            "prequential run finished: {} instances, {} rejected",
            self.processed, self.rejected
        );
        Ok(())
    }

    pub fn curve(&self) -> &LearningCurve {
        &self.curve
    }

    pub fn learner(&self) -> &dyn Classifier {
        self.learner.as_ref()
    }

    /// Instances the learner refused to train on.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    fn take_snapshot(&mut self) {
        let mut accuracy = f64::NAN;
        let mut kappa = f64::NAN;
        let mut extras = BTreeMap::new();
        for m in self.evaluator.performance() {
            match m.name.as_str() {
                "accuracy" => accuracy = m.value,
                "kappa" => kappa = m.value,
                _ => {
                    extras.insert(m.name, m.value);
                }
            }
        }

        let snapshot = Snapshot {
            instances_seen: self.processed,
            accuracy,
            kappa,
            ram_hours: self.ram_hours,
            seconds: self.cpu_start.elapsed().as_secs_f64(),
            extras,
        };
        if let Some(tx) = &self.progress {
            let _ = tx.send(snapshot.clone());
        }
        self.curve.push(snapshot);
    }

    /// Model size in GB times CPU hours since the last check.
    fn accrue_ram_hours(&mut self) {
        let hours = self.last_memory_check.elapsed().as_secs_f64() / 3600.0;
        self.last_memory_check = ThreadTime::now();
        let gigabytes = self.learner.calc_memory_size() as f64 / BYTES_PER_GB;
        self.ram_hours += gigabytes * hours;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifiers::AdaptiveHoeffdingTree;
    use crate::core::instances::DenseInstance;
    use crate::evaluation::{BasicClassificationEvaluator, BasicEstimator};
    use crate::testing::{
        ClassifierNoneVotes, OracleClassifier, TrainSpyClassifier, VecStream, labeled,
        nominal_header, raw,
    };
    use std::sync::mpsc;

    fn alternating(n: usize) -> Box<dyn Stream> {
        let header = nominal_header(&[2], 2);
        let instances: Vec<DenseInstance> = (0..n)
            .map(|i| labeled(&header, &[(i % 2) as f64], i % 2))
            .collect();
        Box::new(VecStream::new(header, instances))
    }

    fn evaluator() -> Box<dyn PerformanceEvaluator> {
        Box::new(BasicClassificationEvaluator::<BasicEstimator>::new_with_default_flags(2))
    }

    fn limits(sample_frequency: u64, mem_check_frequency: u64) -> PrequentialLimits {
        PrequentialLimits {
            sample_frequency,
            mem_check_frequency,
            ..PrequentialLimits::default()
        }
    }

    fn run(learner: Box<dyn Classifier>, n: usize, limits: PrequentialLimits) -> PrequentialEvaluator {
        let mut task = PrequentialEvaluator::new(learner, alternating(n), evaluator(), limits).unwrap();
        task.run().unwrap();
        task
    }

    #[test]
    fn zero_frequencies_are_rejected() {
        for l in [limits(0, 5), limits(5, 0)] {
            let err = PrequentialEvaluator::new(
                Box::new(OracleClassifier::default()),
                alternating(10),
                evaluator(),
                l,
            )
            .err()
            .unwrap();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn periodic_and_final_snapshots() {
        let task = run(Box::new(OracleClassifier::default()), 100, limits(10, 7));
        assert_eq!(task.curve().len(), 11);
        let last = task.curve().latest().unwrap();
        assert_eq!(last.instances_seen, 100);
        assert_eq!(last.accuracy, 1.0);
        assert_eq!(last.kappa, 1.0);
        assert_eq!(last.extras.get("f1"), Some(&1.0));
        assert!(last.ram_hours >= 0.0);
    }

    #[test]
    fn stops_at_max_instances() {
        let task = run(
            Box::new(OracleClassifier::default()),
            1_000,
            PrequentialLimits {
                max_instances: Some(25),
                ..limits(5, 3)
            },
        );
        assert_eq!(task.curve().len(), 6);
        assert_eq!(task.curve().latest().unwrap().instances_seen, 25);
    }

    #[test]
    fn zero_seconds_stops_before_the_first_instance() {
        let task = run(
            Box::new(OracleClassifier::default()),
            100,
            PrequentialLimits {
                max_seconds: Some(0),
                ..limits(10, 10)
            },
        );
        assert_eq!(task.curve().len(), 1);
        let last = task.curve().latest().unwrap();
        assert_eq!(last.instances_seen, 0);
        assert!(last.accuracy.is_nan());
        assert_eq!(last.kappa, 0.0);
    }

    #[test]
    fn learner_without_votes_is_never_scored() {
        let task = run(Box::new(ClassifierNoneVotes), 20, limits(10, 2));
        let last = task.curve().latest().unwrap();
        assert!(last.accuracy.is_nan());
        assert_eq!(last.kappa, 0.0);
    }

    #[test]
    fn trains_once_per_instance_and_reports_progress() {
        let (spy, handle) = TrainSpyClassifier::new();
        let (tx, rx) = mpsc::channel();
        let mut task = PrequentialEvaluator::new(Box::new(spy), alternating(37), evaluator(), limits(10, 4))
            .unwrap()
            .with_progress(tx);
        task.run().unwrap();
        drop(task);

        assert_eq!(handle.count(), 37);
        assert_eq!(handle.labels()[..3], [Some(0.0), Some(1.0), Some(0.0)]);
        let seen: Vec<u64> = rx.iter().map(|s| s.instances_seen).collect();
        assert_eq!(seen, vec![10, 20, 30, 37]);
    }

    #[test]
    fn rejected_instances_are_counted_not_fatal() {
        let header = nominal_header(&[2], 2);
        let instances = vec![
            labeled(&header, &[0.0], 0),
            raw(&header, vec![1.0, f64::NAN]),
            labeled(&header, &[1.0], 1),
        ];
        let mut task = PrequentialEvaluator::new(
            Box::new(AdaptiveHoeffdingTree::default()),
            Box::new(VecStream::new(header, instances)),
            evaluator(),
            limits(10, 10),
        )
        .unwrap();
        task.run().unwrap();
        assert_eq!(task.rejected(), 1);
        assert_eq!(task.curve().latest().unwrap().instances_seen, 3);
        assert!(!task.learner().model_measurements().is_empty());
    }
}
