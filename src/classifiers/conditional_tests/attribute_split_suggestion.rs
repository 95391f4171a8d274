use crate::classifiers::hoeffding_tree::instance_conditional_test::InstanceConditionalTest;
use std::cmp::Ordering;
use std::fmt;

/// A candidate split: the test to install, the class distribution each
/// branch would start with, and its merit under the active criterion.
///
/// A suggestion without a test is the "null split", i.e. keep the leaf.
pub struct AttributeSplitSuggestion {
    split_test: Option<Box<dyn InstanceConditionalTest>>,
    resulting_class_distributions: Vec<Vec<f64>>,
    merit: f64,
}

impl AttributeSplitSuggestion {
    pub fn new(
        split_test: Option<Box<dyn InstanceConditionalTest>>,
        resulting_class_distributions: Vec<Vec<f64>>,
        merit: f64,
    ) -> Self {
        Self {
            split_test,
            resulting_class_distributions,
            merit,
        }
    }

    pub fn get_merit(&self) -> f64 {
        self.merit
    }

    pub fn get_split_test(&self) -> Option<&dyn InstanceConditionalTest> {
        self.split_test.as_deref()
    }

    /// The attribute the test reads; `None` for the null split.
    pub fn split_attribute(&self) -> Option<usize> {
        self.split_test.as_ref().map(|test| test.attribute())
    }

    pub fn number_of_splits(&self) -> usize {
        self.resulting_class_distributions.len()
    }

    pub fn resulting_class_distribution_from_split(&self, split_index: usize) -> Vec<f64> {
        self.resulting_class_distributions
            .get(split_index)
            .cloned()
            .unwrap_or_default()
    }

    pub fn into_parts(self) -> (Option<Box<dyn InstanceConditionalTest>>, Vec<Vec<f64>>) {
        (self.split_test, self.resulting_class_distributions)
    }

    /// Ascending by merit; NaN merits sort last.
    pub fn compare_merit(a: &Self, b: &Self) -> Ordering {
        match (a.merit.is_nan(), b.merit.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.merit.partial_cmp(&b.merit).unwrap_or(Ordering::Equal),
        }
    }
}

impl fmt::Debug for AttributeSplitSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeSplitSuggestion")
            .field("attribute", &self.split_attribute())
            .field("branches", &self.number_of_splits())
            .field("merit", &self.merit)
            .finish()
    }
}
