use super::{NominalAttribute, NumericAttribute};
use crate::utils::memory::{MemoryMeter, MemorySized};
use std::any::Any;
use std::sync::Arc;

pub type AttributeRef = Arc<dyn Attribute + Send + Sync>;

/// Schema entry for one column of an instance.
pub trait Attribute: Any + Send + Sync {
    fn name(&self) -> &str;

    /// Number of admissible values, `None` for continuous attributes.
    fn cardinality(&self) -> Option<usize>;

    fn is_nominal(&self) -> bool {
        self.cardinality().is_some()
    }

    fn as_any(&self) -> &dyn Any;
}

impl MemorySized for dyn Attribute + Send + Sync {
    fn extra_heap_size(&self, meter: &mut MemoryMeter) -> usize {
        let any = self.as_any();
        if let Some(nominal) = any.downcast_ref::<NominalAttribute>() {
            nominal.extra_heap_size(meter)
        } else if let Some(numeric) = any.downcast_ref::<NumericAttribute>() {
            numeric.extra_heap_size(meter)
        } else {
            0
        }
    }
}
