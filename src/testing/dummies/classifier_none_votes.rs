use crate::classifiers::{Classifier, ClassifierError};
use crate::core::instance_header::InstanceHeader;
use crate::core::instances::Instance;
use std::sync::Arc;

/// Never votes; evaluators leave it unscored.
#[derive(Default)]
pub struct ClassifierNoneVotes;

impl Classifier for ClassifierNoneVotes {
    fn get_votes_for_instance(&self, _instance: &dyn Instance) -> Vec<f64> {
        Vec::new()
    }

    fn set_model_context(&mut self, _header: Arc<InstanceHeader>) {}

    fn train_on_instance(&mut self, _instance: &dyn Instance) -> Result<(), ClassifierError> {
        Ok(())
    }

    fn calc_memory_size(&self) -> usize {
        size_of::<Self>()
    }
}
