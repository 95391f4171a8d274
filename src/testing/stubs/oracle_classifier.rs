use crate::classifiers::{Classifier, ClassifierError};
use crate::core::instance_header::InstanceHeader;
use crate::core::instances::Instance;
use std::sync::Arc;

/// Votes for the true class of every instance.
#[derive(Default)]
pub struct OracleClassifier {
    num_classes: usize,
}

fn one_hot(instance: &dyn Instance, num_classes: usize) -> Vec<f64> {
    let y = instance.class_value().unwrap_or_default() as usize;
    let mut votes = vec![0.0; num_classes.max(2)];
    if y < votes.len() {
        votes[y] = 1.0;
    }
    votes
}

impl Classifier for OracleClassifier {
    fn get_votes_for_instance(&self, instance: &dyn Instance) -> Vec<f64> {
        one_hot(instance, self.num_classes)
    }

    fn set_model_context(&mut self, header: Arc<InstanceHeader>) {
        self.num_classes = header.number_of_classes();
    }

    fn train_on_instance(&mut self, _instance: &dyn Instance) -> Result<(), ClassifierError> {
        Ok(())
    }

    fn calc_memory_size(&self) -> usize {
        size_of::<Self>()
    }
}
