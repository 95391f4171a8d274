use crate::core::attributes::Attribute;
use crate::utils::memory::{MemoryMeter, MemorySized};
use std::any::Any;

/// A continuous attribute; values are stored as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumericAttribute {
    name: String,
}

impl NumericAttribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Attribute for NumericAttribute {
    fn name(&self) -> &str {
        &self.name
    }

    fn cardinality(&self) -> Option<usize> {
        None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl MemorySized for NumericAttribute {
    fn extra_heap_size(&self, meter: &mut MemoryMeter) -> usize {
        meter.measure_field(&self.name)
    }
}
