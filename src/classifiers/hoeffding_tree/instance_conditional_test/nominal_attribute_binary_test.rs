use crate::classifiers::hoeffding_tree::instance_conditional_test::InstanceConditionalTest;
use crate::classifiers::hoeffding_tree::instance_conditional_test::instance_conditional_test::tested_value;
use crate::core::instances::Instance;
use std::any::Any;

/// `attribute == value` takes branch 0, any other value branch 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NominalAttributeBinaryTest {
    attribute: usize,
    value: usize,
}

impl NominalAttributeBinaryTest {
    pub fn new(attribute: usize, value: usize) -> Self {
        Self { attribute, value }
    }

    pub fn value(&self) -> usize {
        self.value
    }
}

impl InstanceConditionalTest for NominalAttributeBinaryTest {
    fn branch_for_instance(&self, instance: &dyn Instance) -> Option<usize> {
        let value = tested_value(self.attribute, instance)?;
        Some(usize::from(value as usize != self.value))
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
    fn matching_value_goes_left() {
        let h = nominal_header(&[3, 3], 2);
        let test = NominalAttributeBinaryTest::new(0, 1);
        assert_eq!(test.branch_for_instance(&raw(&h, vec![1.0, 0.0, 0.0])), Some(0));
        assert_eq!(test.branch_for_instance(&raw(&h, vec![2.0, 0.0, 0.0])), Some(1));
        assert_eq!(test.branch_for_instance(&raw(&h, vec![f64::NAN, 0.0, 0.0])), None);
    }

    #[test]
    fn class_column_is_skipped() {
        let h = nominal_header_with_class_at(&[2, 2, 2], 2, 1);
        let test = NominalAttributeBinaryTest::new(2, 1);
        assert_eq!(test.branch_for_instance(&raw(&h, vec![0.0, 0.0, 0.0, 1.0])), Some(0));
        assert_eq!(test.attribute(), 2);
    }

    #[test]
    fn boxed_clone_routes_the_same() {
        let h = nominal_header(&[2], 2);
        let boxed: Box<dyn InstanceConditionalTest> = Box::new(NominalAttributeBinaryTest::new(0, 1));
        let copy = boxed.clone();
        let inst = raw(&h, vec![1.0, 0.0]);
        assert_eq!(copy.branch_for_instance(&inst), Some(0));
        assert_eq!(
            copy.as_any().downcast_ref::<NominalAttributeBinaryTest>().map(|t| t.value()),
            Some(1)
        );
    }
}
