use crate::core::instance_header::InstanceHeader;
use crate::core::instances::Instance;
use std::io::Error;

/// Source of labeled instances that all share one header.
pub trait Stream {
    fn header(&self) -> &InstanceHeader;

    fn has_more_instances(&self) -> bool;

    /// Returns `None` once the stream is exhausted.
    fn next_instance(&mut self) -> Option<Box<dyn Instance>>;

    /// Rewinds to the first instance.
    fn restart(&mut self) -> Result<(), Error>;
}
