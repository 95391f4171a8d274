use crate::classifiers::{Classifier, ClassifierError};
use crate::core::instance_header::InstanceHeader;
use crate::core::instances::Instance;
use crate::testing::stubs::OracleClassifier;
use std::sync::{Arc, Mutex};

/// Read side of a [`TrainSpyClassifier`], usable after the spy was moved
/// into a task.
#[derive(Clone)]
pub struct TrainSpyHandle(Arc<Mutex<Vec<Option<f64>>>>);

impl TrainSpyHandle {
    pub fn count(&self) -> u64 {
        self.0.lock().map_or(0, |labels| labels.len() as u64)
    }

    /// Class labels of the trained instances, in training order.
    pub fn labels(&self) -> Vec<Option<f64>> {
        self.0.lock().map(|labels| labels.clone()).unwrap_or_default()
    }
}

/// An oracle that records every instance it is trained on.
pub struct TrainSpyClassifier {
    oracle: OracleClassifier,
    trained: Arc<Mutex<Vec<Option<f64>>>>,
}

impl TrainSpyClassifier {
    pub fn new() -> (Self, TrainSpyHandle) {
        let trained = Arc::new(Mutex::new(Vec::new()));
        let spy = Self {
            oracle: OracleClassifier::default(),
            trained: Arc::clone(&trained),
        };
        (spy, TrainSpyHandle(trained))
    }
}

impl Classifier for TrainSpyClassifier {
    fn get_votes_for_instance(&self, instance: &dyn Instance) -> Vec<f64> {
        self.oracle.get_votes_for_instance(instance)
    }

    fn set_model_context(&mut self, header: Arc<InstanceHeader>) {
        self.oracle.set_model_context(header);
    }

    fn train_on_instance(&mut self, instance: &dyn Instance) -> Result<(), ClassifierError> {
        if let Ok(mut labels) = self.trained.lock() {
            labels.push(instance.class_value());
        }
        Ok(())
    }

    fn calc_memory_size(&self) -> usize {
        size_of::<Self>()
    }
}
