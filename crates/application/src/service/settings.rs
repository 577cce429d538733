use std::time::Duration;

/// Runtime knobs of a [`DeviceService`](super::DeviceService).
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub name: String,
    pub timeout: Duration,
    pub max_cmd_ops: usize,
    pub data_transform: bool,
    pub async_buffer_size: usize,
    pub async_drain_timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "device-service".to_string(),
            timeout: Duration::from_millis(5000),
            max_cmd_ops: 128,
            data_transform: true,
            async_buffer_size: 16,
            async_drain_timeout: Duration::from_millis(1000),
        }
    }
}
