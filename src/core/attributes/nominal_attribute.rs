use crate::core::attributes::Attribute;
use crate::utils::memory::{MemoryMeter, MemorySized};
use std::any::Any;
use std::collections::HashMap;

/// A categorical attribute. Instances carry the label's position as an `f64`.
#[derive(Clone, Debug)]
pub struct NominalAttribute {
    name: String,
    labels: Vec<String>,
    positions: HashMap<String, usize>,
}

impl NominalAttribute {
    /// Labels keep their declaration order. A repeated label resolves to its
    /// first position.
    pub fn from_labels(name: impl Into<String>, labels: Vec<String>) -> Self {
        let mut positions = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            positions.entry(label.clone()).or_insert(i);
        }
        Self {
            name: name.into(),
            labels,
            positions,
        }
    }

    pub fn index_of_value(&self, label: &str) -> Option<usize> {
        self.positions.get(label).copied()
    }

    pub fn value_at(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl Attribute for NominalAttribute {
    fn name(&self) -> &str {
        &self.name
    }

    fn cardinality(&self) -> Option<usize> {
        Some(self.labels.len())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl MemorySized for NominalAttribute {
    fn extra_heap_size(&self, meter: &mut MemoryMeter) -> usize {
        meter.measure_field(&self.name)
            + meter.measure_field(&self.labels)
            + meter.measure_field(&self.positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> NominalAttribute {
        NominalAttribute::from_labels("color", vec!["red".into(), "green".into(), "red".into()])
    }

    #[test]
    fn labels_map_to_positions() {
        let a = colors();
        assert_eq!(a.name(), "color");
        assert_eq!(a.index_of_value("green"), Some(1));
        assert_eq!(a.index_of_value("blue"), None);
        assert_eq!(a.value_at(0), Some("red"));
        assert_eq!(a.value_at(7), None);
        assert!(a.is_nominal());
    }

    #[test]
    fn duplicate_labels_resolve_to_the_first() {
        let a = colors();
        assert_eq!(a.cardinality(), Some(3));
        assert_eq!(a.index_of_value("red"), Some(0));
    }
}
