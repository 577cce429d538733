use std::sync::Arc;

use tracing::debug;

use domain::{CommandRequest, Device, DomainError, Method, Result};

use crate::cache::MetadataIndex;

/// Maps (device, command, method) to the ordered operations to run.
pub struct CommandResolver {
    index: Arc<MetadataIndex>,
    max_cmd_ops: usize,
}

impl CommandResolver {
    pub fn new(index: Arc<MetadataIndex>, max_cmd_ops: usize) -> Self {
        Self { index, max_cmd_ops }
    }

    /// Resolves every operation of `command` together with its target object.
    ///
    /// Either all targets resolve or the whole command fails.
    pub async fn resolve(
        &self,
        device: &Device,
        command: &str,
        method: Method,
    ) -> Result<Vec<CommandRequest>> {
        let profile = device.profile.as_str();
        let not_found = || DomainError::CommandNotFound {
            profile: profile.to_string(),
            command: command.to_string(),
        };

        if !self.index.command_exists(profile, command).await? {
            return Err(not_found());
        }

        let operations = self
            .index
            .resource_operations(profile, command, method)
            .await?;
        if operations.is_empty() {
            return Err(not_found());
        }
        if operations.len() > self.max_cmd_ops {
            return Err(DomainError::TooManyOperations {
                device: device.name.clone(),
                command: command.to_string(),
                count: operations.len(),
                max: self.max_cmd_ops,
            });
        }

        let mut requests = Vec::with_capacity(operations.len());
        for operation in operations {
            let object = self.index.device_object(profile, &operation.object).await?;
            requests.push(CommandRequest::new(operation, object));
        }

        debug!(
            device = %device.name,
            command = %command,
            method = %method,
            operations = requests.len(),
            "Command resolved"
        );
        Ok(requests)
    }
}
