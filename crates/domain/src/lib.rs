//! Domain layer - device service models and ports
//!
//! This crate contains:
//! - Entities (Device, DeviceProfile, DeviceObject)
//! - Value Objects (CommandValue, Reading, Event)
//! - Ports implemented elsewhere (ProtocolDriver, EventPublisher, MetadataClient)
//!
//! Principles:
//! - No dependencies on infrastructure
//! - Typed errors only, no panics on bad input
//! - Testable in isolation

pub mod device;
pub mod driver;
pub mod error;
pub mod event;
pub mod metadata;
pub mod profile;
pub mod value;

// Re-export commonly used types
pub use device::{Addressable, AdminState, Device, OperatingState};
pub use driver::{AsyncSender, AsyncValues, CommandRequest, ProtocolDriver};
pub use error::{DomainError, Result};
pub use event::{Event, EventPublisher, Reading};
pub use metadata::MetadataClient;
pub use profile::{
    Command, DeviceObject, DeviceProfile, Method, ProfileResource, PropertyValue,
    ResourceOperation,
};
pub use value::{CommandValue, ValueType};
