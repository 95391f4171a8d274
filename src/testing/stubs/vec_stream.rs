use crate::core::instance_header::InstanceHeader;
use crate::core::instances::{DenseInstance, Instance};
use crate::streams::Stream;
use std::io::Error;
use std::sync::Arc;

/// In-memory stream over a fixed list of instances.
pub struct VecStream {
    header: Arc<InstanceHeader>,
    instances: Vec<DenseInstance>,
    position: usize,
}

impl VecStream {
    pub fn new(header: Arc<InstanceHeader>, instances: Vec<DenseInstance>) -> Self {
        Self {
            header,
            instances,
            position: 0,
        }
    }
}

impl Stream for VecStream {
    fn header(&self) -> &InstanceHeader {
        &self.header
    }

    fn has_more_instances(&self) -> bool {
        self.position < self.instances.len()
    }

    fn next_instance(&mut self) -> Option<Box<dyn Instance>> {
        let instance = self.instances.get(self.position)?.clone();
        self.position += 1;
        Some(Box::new(instance))
    }

    fn restart(&mut self) -> Result<(), Error> {
        self.position = 0;
        Ok(())
    }
}
