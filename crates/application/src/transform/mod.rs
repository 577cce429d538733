//! Value normalization applied between a driver and a reading.

mod engine;
mod numeric;

pub use engine::{TransformEngine, TransformOutcome};
pub use numeric::{check_assertion, map_value, transform_read_value, transform_write_value};
