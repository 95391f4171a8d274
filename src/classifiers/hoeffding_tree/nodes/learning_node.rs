/// Leaf-only state. Class distribution and observers live on [`Node`].
///
/// [`Node`]: crate::classifiers::hoeffding_tree::nodes::Node
#[derive(Debug, Clone, PartialEq)]
pub struct LearningNode {
    pub(crate) weight_since_last_split_attempt: f64,
    pub(crate) is_active: bool,
    /// Weight the majority class and naive Bayes predicted correctly, used
    /// by the adaptive leaf predictor.
    pub(crate) mc_correct_weight: f64,
    pub(crate) nb_correct_weight: f64,
    /// Attributes found poor at the last split attempt.
    pub(crate) poor_attributes: Vec<usize>,
}

impl Default for LearningNode {
    fn default() -> Self {
        Self::new()
    }
}

impl LearningNode {
    pub fn new() -> Self {
        Self {
            weight_since_last_split_attempt: 0.0,
            is_active: true,
            mc_correct_weight: 0.0,
            nb_correct_weight: 0.0,
            poor_attributes: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn weight_since_last_split_attempt(&self) -> f64 {
        self.weight_since_last_split_attempt
    }

    pub fn mc_correct_weight(&self) -> f64 {
        self.mc_correct_weight
    }

    pub fn nb_correct_weight(&self) -> f64 {
        self.nb_correct_weight
    }
}
