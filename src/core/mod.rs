/// Core Module for sqlbridge
///
/// This module contains the fundamental components: the database layer, the
/// error types, and the translator that turns failures into caller errors.

pub mod db;
pub mod error;
pub mod translate;

// Re-export commonly used types for convenience
pub use error::{
    AccessError, ConfigError, ConstructionError, DescriptorError, DriverError, DriverResult,
};
pub use translate::{
    translate, translate_with_cause, CauseOnly, ErrorFactory, Fallible, MessageOnly,
};
