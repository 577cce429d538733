use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::profile::{DeviceObject, ResourceOperation};
use crate::value::CommandValue;

/// One resolved step of a command: the operation and the object it targets.
///
/// Both halves are owned copies taken out of the metadata index, so a driver
/// can hold them across awaits without touching index locks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub operation: ResourceOperation,
    pub object: DeviceObject,
}

impl CommandRequest {
    pub fn new(operation: ResourceOperation, object: DeviceObject) -> Self {
        Self { operation, object }
    }

    pub fn object_name(&self) -> &str {
        &self.object.name
    }
}

/// Values pushed by a driver without a preceding command.
#[derive(Debug, Clone)]
pub struct AsyncValues {
    pub device_name: String,
    pub values: Vec<CommandValue>,
}

impl AsyncValues {
    pub fn new(device_name: impl Into<String>, values: Vec<CommandValue>) -> Self {
        Self {
            device_name: device_name.into(),
            values,
        }
    }
}

pub type AsyncSender = mpsc::Sender<AsyncValues>;
