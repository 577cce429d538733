use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceSection {
    pub name: String,
    /// Upper bound for a single driver call.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub labels: Vec<String>,
}

fn default_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DeviceSection {
    #[serde(default = "default_max_cmd_ops")]
    pub max_cmd_ops: usize,
    #[serde(default = "default_data_transform")]
    pub data_transform: bool,
    #[serde(default = "default_async_buffer_size")]
    pub async_buffer_size: usize,
    #[serde(default = "default_async_drain_timeout_ms")]
    pub async_drain_timeout_ms: u64,
}

fn default_max_cmd_ops() -> usize {
    128
}
fn default_data_transform() -> bool {
    true
}
fn default_async_buffer_size() -> usize {
    16
}
fn default_async_drain_timeout_ms() -> u64 {
    1000
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            max_cmd_ops: default_max_cmd_ops(),
            data_transform: default_data_transform(),
            async_buffer_size: default_async_buffer_size(),
            async_drain_timeout_ms: default_async_drain_timeout_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MetadataSection {
    /// JSON document holding `devices` and `profiles`.
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
}

fn default_topic_prefix() -> String {
    "devices/events".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SimulatorSection {
    /// Period of unsolicited pushes; 0 disables them.
    #[serde(default)]
    pub async_interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    pub service: ServiceSection,
    #[serde(default)]
    pub device: DeviceSection,
    pub metadata: MetadataSection,
    #[serde(default)]
    pub mqtt: Option<MqttConfig>,
    #[serde(default)]
    pub simulator: SimulatorSection,
}

impl ServiceConfig {
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .set_default("service.name", "device-simulator")?
            .set_default("metadata.path", format!("{}/metadata.json", config_dir))?
            // Required so the service never starts on built-in defaults alone
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(true))
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // e.g. DEVSVC__DEVICE__MAX_CMD_OPS=64
            .add_source(
                Environment::with_prefix("DEVSVC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config_dir(name: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("devsvc-config-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for (file, content) in files {
            std::fs::write(dir.join(file), content).unwrap();
        }
        dir
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let dir = config_dir(
            "defaults",
            &[("default.toml", "[service]\nname = \"tank-service\"\n")],
        );

        let cfg = ServiceConfig::load(dir.to_str().unwrap()).unwrap();

        assert_eq!(cfg.service.name, "tank-service");
        assert_eq!(cfg.service.timeout_ms, 5000);
        assert_eq!(cfg.device.max_cmd_ops, 128);
        assert!(cfg.device.data_transform);
        assert_eq!(cfg.device.async_buffer_size, 16);
        assert!(cfg.metadata.path.ends_with("metadata.json"));
        assert!(cfg.mqtt.is_none());
        assert_eq!(cfg.simulator.async_interval_ms, 0);
    }

    #[test]
    fn test_file_values_override_defaults() {
        let dir = config_dir(
            "override",
            &[(
                "default.toml",
                r#"
[service]
name = "pump-service"
timeout_ms = 250

[device]
max_cmd_ops = 4
data_transform = false

[metadata]
path = "/etc/pumps.json"

[mqtt]
host = "broker"
port = 1884
"#,
            )],
        );

        let cfg = ServiceConfig::load(dir.to_str().unwrap()).unwrap();

        assert_eq!(cfg.service.timeout_ms, 250);
        assert_eq!(cfg.device.max_cmd_ops, 4);
        assert!(!cfg.device.data_transform);
        assert_eq!(cfg.device.async_drain_timeout_ms, 1000);
        assert_eq!(cfg.metadata.path, "/etc/pumps.json");
        let mqtt = cfg.mqtt.unwrap();
        assert_eq!(mqtt.host, "broker");
        assert_eq!(mqtt.topic_prefix, "devices/events");
    }

    #[test]
    fn test_missing_default_file_is_an_error() {
        let dir = config_dir("missing", &[]);
        assert!(ServiceConfig::load(dir.to_str().unwrap()).is_err());
    }
}
