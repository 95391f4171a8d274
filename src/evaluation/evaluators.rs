use crate::core::instances::Instance;
use crate::evaluation::{Estimator, Measurement};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub trait PerformanceEvaluator {
    fn reset(&mut self);

    /// Scores `votes` against the true class of `instance`.
    fn add_result(&mut self, instance: &dyn Instance, votes: Vec<f64>);

    fn performance(&self) -> Vec<Measurement>;
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvaluatorFlags {
    #[serde(default = "default_true")]
    #[schemars(
        title = "Precision/Recall",
        description = "Report macro-averaged precision, recall and F1"
    )]
    pub precision_recall: bool,

    #[serde(default)]
    #[schemars(
        title = "Per Class",
        description = "Also report precision, recall and F1 for every class"
    )]
    pub per_class: bool,
}

impl Default for EvaluatorFlags {
    fn default() -> Self {
        Self {
            precision_recall: true,
            per_class: false,
        }
    }
}

/// Accuracy, Cohen's kappa and precision/recall over every scored instance.
/// Instances without votes, without a class, or with zero weight are skipped.
#[derive(Debug, Clone)]
pub struct BasicClassificationEvaluator<E: Estimator> {
    num_classes: usize,
    flags: EvaluatorFlags,
    weight_observed: f64,
    weight_correct: E,
    predicted_share: Vec<E>,
    true_share: Vec<E>,
    precision: Vec<E>,
    recall: Vec<E>,
}

impl<E: Estimator> BasicClassificationEvaluator<E> {
    pub fn new(num_classes: usize, flags: EvaluatorFlags) -> Self {
        let per_class = || (0..num_classes).map(|_| E::default()).collect::<Vec<E>>();
        Self {
            num_classes,
            flags,
            weight_observed: 0.0,
            weight_correct: E::default(),
            predicted_share: per_class(),
            true_share: per_class(),
            precision: per_class(),
            recall: per_class(),
        }
    }

    pub fn new_with_default_flags(num_classes: usize) -> Self {
        Self::new(num_classes, EvaluatorFlags::default())
    }

    fn ensure_classes(&mut self, needed: usize) {
        if needed <= self.num_classes {
            return;
        }
        for per_class in [
            &mut self.predicted_share,
            &mut self.true_share,
            &mut self.precision,
            &mut self.recall,
        ] {
            per_class.resize_with(needed, E::default);
        }
        self.num_classes = needed;
    }

    fn kappa(&self) -> f64 {
        if self.weight_observed <= 0.0 {
            return 0.0;
        }
        let chance: f64 = self
            .predicted_share
            .iter()
            .zip(&self.true_share)
            .map(|(p, t)| zero_if_nan(p.estimation()) * zero_if_nan(t.estimation()))
            .sum();
        if chance >= 1.0 {
            return 0.0;
        }
        (self.weight_correct.estimation() - chance) / (1.0 - chance)
    }
}

fn zero_if_nan(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision.is_nan() || recall.is_nan() {
        return f64::NAN;
    }
    if precision + recall == 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / (precision + recall)
}

/// Mean over the classes that have an estimate.
fn macro_average<E: Estimator>(estimators: &[E]) -> f64 {
    let defined: Vec<f64> = estimators
        .iter()
        .map(Estimator::estimation)
        .filter(|v| !v.is_nan())
        .collect();
    if defined.is_empty() {
        return f64::NAN;
    }
    defined.iter().sum::<f64>() / defined.len() as f64
}

fn argmax(votes: &[f64]) -> usize {
    votes
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &v)| {
            if v > best.1 { (i, v) } else { best }
        })
        .0
}

impl<E: Estimator> PerformanceEvaluator for BasicClassificationEvaluator<E> {
    fn reset(&mut self) {
        *self = Self::new(self.num_classes, self.flags);
    }

    fn add_result(&mut self, instance: &dyn Instance, votes: Vec<f64>) {
        let weight = instance.weight();
        if weight <= 0.0 || votes.is_empty() {
            return;
        }
        let Some(true_class) = instance.class_value().filter(|c| c.is_finite() && *c >= 0.0)
        else {
            return;
        };
        let true_class = true_class as usize;
        let predicted = argmax(&votes);
        self.ensure_classes(true_class.max(predicted) + 1);

        let hit = if predicted == true_class { 1.0 } else { 0.0 };
        self.weight_observed += weight;
        self.weight_correct.add(hit, weight);
        for c in 0..self.num_classes {
            self.predicted_share[c].add(if c == predicted { 1.0 } else { 0.0 }, weight);
            self.true_share[c].add(if c == true_class { 1.0 } else { 0.0 }, weight);
        }
        self.precision[predicted].add(hit, weight);
        self.recall[true_class].add(hit, weight);
    }

    fn performance(&self) -> Vec<Measurement> {
        let mut measurements = vec![
            Measurement::new("accuracy", self.weight_correct.estimation()),
            Measurement::new("kappa", self.kappa()),
        ];
        if self.flags.precision_recall {
            let precision = macro_average(&self.precision);
            let recall = macro_average(&self.recall);
            measurements.push(Measurement::new("precision", precision));
            measurements.push(Measurement::new("recall", recall));
            measurements.push(Measurement::new("f1", f1(precision, recall)));
        }
        if self.flags.per_class {
            for c in 0..self.num_classes {
                let precision = self.precision[c].estimation();
                let recall = self.recall[c].estimation();
                measurements.push(Measurement::new(format!("precision_{c}"), precision));
                measurements.push(Measurement::new(format!("recall_{c}"), recall));
                measurements.push(Measurement::new(format!("f1_{c}"), f1(precision, recall)));
            }
        }
        measurements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{BasicEstimator, find_measurement};
    use crate::testing::{labeled, nominal_header, weighted};

    type Evaluator = BasicClassificationEvaluator<BasicEstimator>;

    fn votes_for(class: usize, classes: usize) -> Vec<f64> {
        let mut v = vec![0.0; classes];
        v[class] = 1.0;
        v
    }

    #[test]
    fn empty_evaluator_reports_nan_accuracy_and_zero_kappa() {
        let e = Evaluator::new_with_default_flags(2);
        let perf = e.performance();
        assert!(find_measurement(&perf, "accuracy").unwrap().is_nan());
        assert_eq!(find_measurement(&perf, "kappa"), Some(0.0));
        assert!(find_measurement(&perf, "f1").unwrap().is_nan());
    }

    #[test]
    fn perfect_predictions_on_balanced_classes() {
        let header = nominal_header(&[2], 2);
        let mut e = Evaluator::new_with_default_flags(2);
        for i in 0..10 {
            let c = i % 2;
            e.add_result(&labeled(&header, &[0.0], c), votes_for(c, 2));
        }
        let perf = e.performance();
        assert_eq!(find_measurement(&perf, "accuracy"), Some(1.0));
        assert_eq!(find_measurement(&perf, "kappa"), Some(1.0));
        assert_eq!(find_measurement(&perf, "precision"), Some(1.0));
        assert_eq!(find_measurement(&perf, "f1"), Some(1.0));
    }

    #[test]
    fn constant_predictor_has_zero_kappa() {
        let header = nominal_header(&[2], 2);
        let mut e = Evaluator::new(2, EvaluatorFlags { precision_recall: true, per_class: true });
        for i in 0..4 {
            e.add_result(&labeled(&header, &[0.0], i % 2), votes_for(0, 2));
        }
        let perf = e.performance();
        assert_eq!(find_measurement(&perf, "accuracy"), Some(0.5));
        assert_eq!(find_measurement(&perf, "kappa"), Some(0.0));
        assert_eq!(find_measurement(&perf, "precision_0"), Some(0.5));
        assert_eq!(find_measurement(&perf, "recall_0"), Some(1.0));
        assert_eq!(find_measurement(&perf, "recall_1"), Some(0.0));
        assert!(find_measurement(&perf, "precision_1").unwrap().is_nan());
        // Macro averages skip the class that was never predicted.
        assert_eq!(find_measurement(&perf, "precision"), Some(0.5));
        assert_eq!(find_measurement(&perf, "recall"), Some(0.5));
    }

    #[test]
    fn weights_and_skips() {
        let header = nominal_header(&[2], 2);
        let mut e = Evaluator::new_with_default_flags(2);
        e.add_result(&weighted(&header, &[0.0], 0, 3.0), votes_for(0, 2));
        e.add_result(&labeled(&header, &[0.0], 1), votes_for(0, 2));
        e.add_result(&weighted(&header, &[0.0], 1, 0.0), votes_for(0, 2));
        e.add_result(&labeled(&header, &[0.0], 1), Vec::new());
        assert_eq!(find_measurement(&e.performance(), "accuracy"), Some(0.75));

        e.reset();
        assert!(find_measurement(&e.performance(), "accuracy").unwrap().is_nan());
    }

    #[test]
    fn unseen_classes_grow_the_tables() {
        let header = nominal_header(&[2], 3);
        let mut e = Evaluator::new(1, EvaluatorFlags { precision_recall: false, per_class: true });
        e.add_result(&labeled(&header, &[0.0], 2), votes_for(2, 3));
        let perf = e.performance();
        assert_eq!(find_measurement(&perf, "accuracy"), Some(1.0));
        assert_eq!(find_measurement(&perf, "recall_2"), Some(1.0));
        assert!(find_measurement(&perf, "precision").is_none());
    }
}
