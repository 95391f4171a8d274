use crate::core::attributes::Attribute;
use crate::core::instance_header::InstanceHeader;
use crate::core::instances::Instance;
use crate::utils::memory::{MemoryMeter, MemorySized};
use std::io::{Error, ErrorKind};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct DenseInstance {
    header: Arc<InstanceHeader>,
    values: Vec<f64>,
    weight: f64,
}

impl DenseInstance {
    pub fn new(header: Arc<InstanceHeader>, values: Vec<f64>, weight: f64) -> Self {
        Self {
            header,
            values,
            weight,
        }
    }

    fn out_of_bounds(&self, index: usize) -> Error {
        Error::new(
            ErrorKind::InvalidInput,
            format!(
                "attribute index {index} out of bounds for {} values",
                self.values.len()
            ),
        )
    }
}

impl Instance for DenseInstance {
    fn weight(&self) -> f64 {
        self.weight
    }

    fn set_weight(&mut self, new_value: f64) -> Result<(), Error> {
        if !new_value.is_finite() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "weight must be a finite number",
            ));
        }
        self.weight = new_value;
        Ok(())
    }

    fn value_at_index(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    fn set_value_at_index(&mut self, index: usize, new_value: f64) -> Result<(), Error> {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = new_value;
                Ok(())
            }
            None => Err(self.out_of_bounds(index)),
        }
    }

    fn is_missing_at_index(&self, index: usize) -> Result<bool, Error> {
        self.values
            .get(index)
            .map(|v| v.is_nan())
            .ok_or_else(|| self.out_of_bounds(index))
    }

    fn attribute_at_index(&self, index: usize) -> Option<&dyn Attribute> {
        self.header.attribute_at_index(index)
    }

    fn index_of_attribute(&self, attribute: &dyn Attribute) -> Option<usize> {
        self.header.index_of_attribute(attribute.name())
    }

    fn number_of_attributes(&self) -> usize {
        self.values.len()
    }

    fn class_index(&self) -> usize {
        self.header.class_index()
    }

    fn class_value(&self) -> Option<f64> {
        self.values
            .get(self.header.class_index())
            .copied()
            .filter(|v| !v.is_nan())
    }

    fn set_class_value(&mut self, new_value: f64) -> Result<(), Error> {
        let class_index = self.header.class_index();
        self.set_value_at_index(class_index, new_value)
    }

    fn is_class_missing(&self) -> bool {
        self.class_value().is_none()
    }

    fn number_of_classes(&self) -> usize {
        self.header.number_of_classes()
    }

    fn to_vec(&self) -> Vec<f64> {
        self.values.clone()
    }

    fn header(&self) -> &InstanceHeader {
        &self.header
    }

    fn clone_box(&self) -> Box<dyn Instance> {
        Box::new(self.clone())
    }
}

impl MemorySized for DenseInstance {
    fn inline_size(&self) -> usize {
        size_of::<Self>()
    }

    fn extra_heap_size(&self, meter: &mut MemoryMeter) -> usize {
        meter.measure_field(&self.values)
    }
}
