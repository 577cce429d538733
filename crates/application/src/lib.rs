//! Application layer - metadata index, transforms, command execution and the
//! device service lifecycle

pub mod cache;
pub mod command;
pub mod ingest;
pub mod service;
pub mod transform;

pub use cache::MetadataIndex;
pub use command::{CommandExecutor, CommandOutcome, CommandResolver};
pub use ingest::AsyncProcessor;
pub use service::{DeviceService, ServiceSettings};
pub use transform::{TransformEngine, TransformOutcome};
