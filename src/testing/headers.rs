use crate::core::attributes::{AttributeRef, NominalAttribute, NumericAttribute};
use crate::core::instance_header::InstanceHeader;
use crate::core::instances::DenseInstance;
use std::sync::Arc;

fn nominal(name: String, cardinality: usize) -> AttributeRef {
    let labels = (0..cardinality).map(|v| v.to_string()).collect();
    Arc::new(NominalAttribute::from_labels(name, labels))
}

fn class_attribute(num_classes: usize) -> AttributeRef {
    let labels = (0..num_classes).map(|c| format!("c{c}")).collect();
    Arc::new(NominalAttribute::from_labels("class", labels))
}

/// Nominal attributes `x0..` with the given cardinalities, class last.
pub fn nominal_header(values_per_attribute: &[usize], num_classes: usize) -> Arc<InstanceHeader> {
    nominal_header_with_class_at(values_per_attribute, num_classes, values_per_attribute.len())
}

/// Same as [`nominal_header`], with the class column placed at `class_index`.
pub fn nominal_header_with_class_at(
    values_per_attribute: &[usize],
    num_classes: usize,
    class_index: usize,
) -> Arc<InstanceHeader> {
    let mut attributes: Vec<AttributeRef> = values_per_attribute
        .iter()
        .enumerate()
        .map(|(i, &v)| nominal(format!("x{i}"), v))
        .collect();
    attributes.insert(class_index, class_attribute(num_classes));
    Arc::new(InstanceHeader::new("nominal".into(), attributes, class_index))
}

/// Numeric attributes `x0..`, class last.
pub fn numeric_header(num_attributes: usize, num_classes: usize) -> Arc<InstanceHeader> {
    let mut attributes: Vec<AttributeRef> = (0..num_attributes)
        .map(|i| Arc::new(NumericAttribute::new(format!("x{i}"))) as AttributeRef)
        .collect();
    attributes.push(class_attribute(num_classes));
    Arc::new(InstanceHeader::new(
        "numeric".into(),
        attributes,
        num_attributes,
    ))
}

/// Unit-weight instance with the class appended after `attributes`.
pub fn labeled(header: &Arc<InstanceHeader>, attributes: &[f64], class: usize) -> DenseInstance {
    weighted(header, attributes, class, 1.0)
}

pub fn weighted(
    header: &Arc<InstanceHeader>,
    attributes: &[f64],
    class: usize,
    weight: f64,
) -> DenseInstance {
    let mut values = attributes.to_vec();
    values.insert(header.class_index().min(values.len()), class as f64);
    DenseInstance::new(Arc::clone(header), values, weight)
}

/// Instance built from raw column values, class column included.
pub fn raw(header: &Arc<InstanceHeader>, values: Vec<f64>) -> DenseInstance {
    DenseInstance::new(Arc::clone(header), values, 1.0)
}
