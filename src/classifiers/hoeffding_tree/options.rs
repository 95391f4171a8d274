use crate::classifiers::hoeffding_tree::leaf_prediction_option::{
    LeafPredictionOption, SplitCriterionOption,
};
use crate::classifiers::hoeffding_tree::split_criteria::{
    GiniSplitCriterion, InfoGainSplitCriterion, SplitCriterion,
};
use crate::core::estimators::adwin::DEFAULT_DELTA;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// First value is the option name, second what was expected, third what was provided.
#[derive(Debug, Error, PartialEq)]
pub enum OptionsError {
    #[error("Invalid value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
}

fn invalid(name: &str, expected: &str, provided: impl ToString) -> OptionsError {
    OptionsError::InvalidParameter(name.to_string(), expected.to_string(), provided.to_string())
}

fn default_grace_period() -> u64 {
    200
}
fn default_split_confidence() -> f64 {
    1e-7
}
fn default_tie_threshold() -> f64 {
    0.05
}
fn default_window_size() -> usize {
    100_000
}
fn default_re_evaluation_period() -> u64 {
    20_000
}
fn default_drift_confidence() -> f64 {
    DEFAULT_DELTA
}
fn default_max_byte_size() -> usize {
    33_554_432
}
fn default_memory_estimate_period() -> u64 {
    1_000_000
}
fn default_test_phase_frequency() -> u64 {
    9_000
}
fn default_test_phase_length() -> u64 {
    1_000
}
fn default_prune_tolerance() -> f64 {
    0.01
}
fn default_min_width() -> u64 {
    300
}
fn default_promotion_confidence() -> f64 {
    0.05
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrialWindowParams {
    #[serde(default = "default_test_phase_frequency")]
    #[schemars(
        title = "Test Phase Frequency",
        description = "Weight a node with alternates learns between two test phases",
        range(min = 1),
        default = "default_test_phase_frequency"
    )]
    pub test_phase_frequency: u64,

    #[serde(default = "default_test_phase_length")]
    #[schemars(
        title = "Test Phase Length",
        description = "Instances scored during a test phase",
        range(min = 1),
        default = "default_test_phase_length"
    )]
    pub test_phase_length: u64,

    #[serde(default = "default_prune_tolerance")]
    #[schemars(
        title = "Prune Tolerance",
        description = "Relative slack before a non-improving alternate is pruned",
        range(min = 0.0),
        default = "default_prune_tolerance"
    )]
    pub prune_tolerance: f64,
}

impl Default for TrialWindowParams {
    fn default() -> Self {
        Self {
            test_phase_frequency: default_test_phase_frequency(),
            test_phase_length: default_test_phase_length(),
            prune_tolerance: default_prune_tolerance(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorBoundParams {
    #[serde(default = "default_min_width")]
    #[schemars(
        title = "Minimum Width",
        description = "Estimator width both subtrees need before they are compared",
        range(min = 1),
        default = "default_min_width"
    )]
    pub min_width: u64,

    #[serde(default = "default_promotion_confidence")]
    #[schemars(
        title = "Confidence",
        description = "Confidence of the error-difference bound",
        range(min = 0.0, max = 1.0),
        default = "default_promotion_confidence"
    )]
    pub confidence: f64,
}

impl Default for ErrorBoundParams {
    fn default() -> Self {
        Self {
            min_width: default_min_width(),
            confidence: default_promotion_confidence(),
        }
    }
}

/// When an alternate subtree replaces the one it shadows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "params", rename_all = "kebab-case")]
pub enum PromotionStrategy {
    /// Periodically freeze the node and score mainline and alternates on the
    /// same `test_phase_length` instances.
    TrialWindow(TrialWindowParams),
    /// Keep learning and compare the adaptive error estimates of the
    /// mainline subtree and its alternate with a confidence bound.
    ErrorBound(ErrorBoundParams),
}

impl Default for PromotionStrategy {
    fn default() -> Self {
        PromotionStrategy::TrialWindow(TrialWindowParams::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TreeOptions {
    #[schemars(
        title = "Grace Period",
        description = "Weight a leaf observes between split attempts",
        range(min = 1),
        default = "default_grace_period"
    )]
    pub grace_period: u64,

    #[schemars(
        title = "Split Confidence",
        description = "Allowed error of a split decision (delta)",
        range(min = 0.0, max = 1.0),
        default = "default_split_confidence"
    )]
    pub split_confidence: f64,

    #[schemars(
        title = "Tie Threshold",
        description = "Bound below which a tie is broken",
        range(min = 0.0),
        default = "default_tie_threshold"
    )]
    pub tie_threshold: f64,

    #[schemars(
        title = "Window Size",
        description = "Instances remembered for forgetting (0 = never forget)",
        default = "default_window_size"
    )]
    pub window_size: usize,

    #[schemars(
        title = "Re-evaluation Period",
        description = "Weight between re-evaluations of an installed split (0 = never)",
        default = "default_re_evaluation_period"
    )]
    pub re_evaluation_period: u64,

    #[schemars(title = "Promotion", description = "How alternates are promoted")]
    pub promotion: PromotionStrategy,

    #[schemars(
        title = "Alternates of Alternates",
        description = "Let nodes inside an alternate spawn alternates of their own"
    )]
    pub allow_alternates_of_alternates: bool,

    #[schemars(
        title = "Remove Poor Attributes",
        description = "Stop tracking attributes that cannot win a split"
    )]
    pub remove_poor_attributes: bool,

    #[schemars(title = "Leaf Prediction", description = "Leaf voting strategy")]
    pub leaf_prediction: LeafPredictionOption,

    #[schemars(
        title = "Naive Bayes Threshold",
        description = "Weight a leaf needs before naive Bayes is used"
    )]
    pub nb_threshold: u64,

    #[schemars(title = "Split Criterion", description = "Merit used to rank splits")]
    pub split_criterion: SplitCriterionOption,

    #[schemars(title = "Binary Splits", description = "Only allow binary splits")]
    pub binary_splits: bool,

    #[schemars(title = "No Pre-prune", description = "Never consider keeping the leaf")]
    pub no_pre_prune: bool,

    #[schemars(
        title = "Drift Confidence",
        description = "Delta of the per-node adaptive error estimators",
        range(min = 0.0, max = 1.0),
        default = "default_drift_confidence"
    )]
    pub drift_confidence: f64,

    #[schemars(
        title = "Max Byte Size",
        description = "Model size above which leaves are deactivated",
        default = "default_max_byte_size"
    )]
    pub max_byte_size: usize,

    #[schemars(
        title = "Memory Estimate Period",
        description = "Training weight between two model size estimates",
        range(min = 1),
        default = "default_memory_estimate_period"
    )]
    pub memory_estimate_period: u64,

    #[schemars(
        title = "Stop Memory Management",
        description = "Stop growing instead of deactivating leaves"
    )]
    pub stop_mem_management: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            grace_period: default_grace_period(),
            split_confidence: default_split_confidence(),
            tie_threshold: default_tie_threshold(),
            window_size: default_window_size(),
            re_evaluation_period: default_re_evaluation_period(),
            promotion: PromotionStrategy::default(),
            allow_alternates_of_alternates: false,
            remove_poor_attributes: false,
            leaf_prediction: LeafPredictionOption::default(),
            nb_threshold: 0,
            split_criterion: SplitCriterionOption::default(),
            binary_splits: false,
            no_pre_prune: false,
            drift_confidence: default_drift_confidence(),
            max_byte_size: default_max_byte_size(),
            memory_estimate_period: default_memory_estimate_period(),
            stop_mem_management: false,
        }
    }
}

impl TreeOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.grace_period == 0 {
            return Err(invalid("grace_period", "a positive integer", self.grace_period));
        }
        if !(self.split_confidence > 0.0 && self.split_confidence < 1.0) {
            return Err(invalid(
                "split_confidence",
                "a real value within (0, 1)",
                self.split_confidence,
            ));
        }
        if self.tie_threshold.is_nan() || self.tie_threshold < 0.0 {
            return Err(invalid(
                "tie_threshold",
                "a non-negative real value",
                self.tie_threshold,
            ));
        }
        if !(self.drift_confidence > 0.0 && self.drift_confidence < 1.0) {
            return Err(invalid(
                "drift_confidence",
                "a real value within (0, 1)",
                self.drift_confidence,
            ));
        }
        if self.memory_estimate_period == 0 {
            return Err(invalid(
                "memory_estimate_period",
                "a positive integer",
                self.memory_estimate_period,
            ));
        }
        match self.promotion {
            PromotionStrategy::TrialWindow(p) => {
                if p.test_phase_frequency == 0 {
                    return Err(invalid(
                        "test_phase_frequency",
                        "a positive integer",
                        p.test_phase_frequency,
                    ));
                }
                if p.test_phase_length == 0 {
                    return Err(invalid(
                        "test_phase_length",
                        "a positive integer",
                        p.test_phase_length,
                    ));
                }
                if p.prune_tolerance.is_nan() || p.prune_tolerance < 0.0 {
                    return Err(invalid(
                        "prune_tolerance",
                        "a non-negative real value",
                        p.prune_tolerance,
                    ));
                }
            }
            PromotionStrategy::ErrorBound(p) => {
                if p.min_width == 0 {
                    return Err(invalid("min_width", "a positive integer", p.min_width));
                }
                if !(p.confidence > 0.0 && p.confidence < 1.0) {
                    return Err(invalid(
                        "confidence",
                        "a real value within (0, 1)",
                        p.confidence,
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn new_split_criterion(&self) -> Box<dyn SplitCriterion> {
        match self.split_criterion {
            SplitCriterionOption::InfoGain => Box::new(InfoGainSplitCriterion::default()),
            SplitCriterionOption::Gini => Box::new(GiniSplitCriterion::new()),
        }
    }
}
