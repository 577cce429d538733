//! Infrastructure layer - configuration, metadata source, drivers and event sinks

pub mod config;
pub mod drivers;
pub mod messaging;
pub mod metadata;

pub use config::ServiceConfig;
pub use drivers::{SimulatorConfig, SimulatorDriver};
pub use messaging::{CompositeEventPublisher, LogEventPublisher, MqttClient, MqttEventPublisher};
pub use metadata::{FileMetadataStore, MetadataDocument};
