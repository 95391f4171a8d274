use crate::core::attributes::{Attribute, AttributeRef};
use crate::utils::memory::{MemoryMeter, MemorySized};
use std::fmt;

/// Schema shared by every instance of a stream.
#[derive(Clone)]
pub struct InstanceHeader {
    relation_name: String,
    pub attributes: Vec<AttributeRef>,
    class_index: usize,
}

impl InstanceHeader {
    pub fn new(
        relation_name: String,
        attributes: Vec<AttributeRef>,
        class_index: usize,
    ) -> InstanceHeader {
        InstanceHeader {
            relation_name,
            attributes,
            class_index,
        }
    }

    pub fn class_attribute(&self) -> Option<&dyn Attribute> {
        self.attribute_at_index(self.class_index)
    }

    pub fn number_of_attributes(&self) -> usize {
        self.attributes.len()
    }

    /// Attributes a model can split on, i.e. everything except the class.
    pub fn number_of_model_attributes(&self) -> usize {
        self.attributes.len().saturating_sub(1)
    }

    pub fn relation_name(&self) -> &str {
        &self.relation_name
    }

    pub fn attribute_at_index(&self, index: usize) -> Option<&dyn Attribute> {
        self.attributes.get(index).map(|a| a.as_ref() as &dyn Attribute)
    }

    pub fn index_of_attribute(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|attr| attr.name() == name)
    }

    pub fn class_index(&self) -> usize {
        self.class_index
    }

    pub fn number_of_classes(&self) -> usize {
        self.class_attribute()
            .and_then(|attr| attr.cardinality())
            .unwrap_or(0)
    }

    /// Maps a model attribute index (class column skipped) to its column in the instance.
    pub fn model_to_instance_index(&self, model_index: usize) -> usize {
        if model_index < self.class_index {
            model_index
        } else {
            model_index + 1
        }
    }

    pub fn calc_memory_size(&self) -> usize {
        MemoryMeter::measure_root(self)
    }
}

impl MemorySized for InstanceHeader {
    fn inline_size(&self) -> usize {
        size_of::<Self>()
    }

    fn extra_heap_size(&self, meter: &mut MemoryMeter) -> usize {
        meter.measure_field(&self.relation_name) + meter.measure_field(&self.attributes)
    }
}

impl fmt::Debug for InstanceHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceHeader")
            .field("relation_name", &self.relation_name)
            .field("class_index", &self.class_index)
            .field("n_attributes", &self.attributes.len())
            .finish()
    }
}
