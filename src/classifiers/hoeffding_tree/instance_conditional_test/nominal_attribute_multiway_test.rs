use crate::classifiers::hoeffding_tree::instance_conditional_test::InstanceConditionalTest;
use crate::classifiers::hoeffding_tree::instance_conditional_test::instance_conditional_test::tested_value;
use crate::core::instances::Instance;
use std::any::Any;

/// One branch per nominal value. A value never seen at split time maps past
/// the last child and gets a fresh leaf when first reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NominalAttributeMultiwayTest {
    attribute: usize,
}

impl NominalAttributeMultiwayTest {
    pub fn new(attribute: usize) -> Self {
        Self { attribute }
    }
}

impl InstanceConditionalTest for NominalAttributeMultiwayTest {
    fn branch_for_instance(&self, instance: &dyn Instance) -> Option<usize> {
        tested_value(self.attribute, instance).map(|v| v as usize)
    }

    fn attribute(&self) -> usize {
        self.attribute
    }

    fn clone_box(&self) -> Box<dyn InstanceConditionalTest> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{nominal_header, nominal_header_with_class_at, raw};

    #[test]
    fn value_is_the_branch() {
        let h = nominal_header(&[4], 2);
        let test = NominalAttributeMultiwayTest::new(0);
        assert_eq!(test.branch_for_instance(&raw(&h, vec![3.0, 0.0])), Some(3));
        assert_eq!(test.branch_for_instance(&raw(&h, vec![f64::NAN, 0.0])), None);
    }

    #[test]
    fn class_column_is_skipped() {
        let h = nominal_header_with_class_at(&[2, 3], 2, 0);
        let test = NominalAttributeMultiwayTest::new(1);
        assert_eq!(test.branch_for_instance(&raw(&h, vec![1.0, 0.0, 2.0])), Some(2));
    }
}
