//! Wiring of the device service binary.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use serde_json::Value;

use application::{DeviceService, ServiceSettings};
use domain::EventPublisher;
use infrastructure::{
    CompositeEventPublisher, LogEventPublisher, MqttClient, MqttEventPublisher, ServiceConfig,
    SimulatorDriver,
};

pub fn service_settings(config: &ServiceConfig) -> ServiceSettings {
    ServiceSettings {
        name: config.service.name.clone(),
        timeout: Duration::from_millis(config.service.timeout_ms),
        max_cmd_ops: config.device.max_cmd_ops,
        data_transform: config.device.data_transform,
        async_buffer_size: config.device.async_buffer_size,
        async_drain_timeout: Duration::from_millis(config.device.async_drain_timeout_ms),
    }
}

/// Log sink, plus MQTT when configured.
pub fn build_publisher(config: &ServiceConfig) -> Arc<dyn EventPublisher> {
    let mut publishers: Vec<Arc<dyn EventPublisher>> = vec![Arc::new(LogEventPublisher::new())];

    if let Some(mqtt) = &config.mqtt {
        tracing::info!(host = %mqtt.host, port = mqtt.port, "Connecting to MQTT broker");
        let client_id = format!("{}-{}", config.service.name, std::process::id());
        let client = MqttClient::new(&mqtt.host, mqtt.port, &client_id);
        publishers.push(Arc::new(MqttEventPublisher::new(
            Arc::new(client),
            mqtt.topic_prefix.clone(),
        )));
    }

    Arc::new(CompositeEventPublisher::new(publishers))
}

/// Registers every device object flagged `"async": true` with the simulator.
pub async fn watch_async_objects(service: &DeviceService, driver: &SimulatorDriver) -> usize {
    let profiles = service.device_profiles().await;
    let mut watched = 0;

    for device in service.index().devices().await {
        let Some(profile) = profiles.iter().find(|p| p.name == device.profile) else {
            continue;
        };
        for object in &profile.device_objects {
            if object.attributes.get("async") == Some(&Value::Bool(true)) {
                driver.watch(&device.name, object.clone()).await;
                watched += 1;
            }
        }
    }
    watched
}

/// Parses repeated `NAME=VALUE` arguments.
pub fn parse_params(pairs: &[String]) -> Result<HashMap<String, String>> {
    let mut params = HashMap::new();
    for pair in pairs {
        let Some((name, value)) = pair.split_once('=') else {
            bail!("Expected NAME=VALUE, got {:?}", pair);
        };
        if name.is_empty() {
            bail!("Empty parameter name in {:?}", pair);
        }
        params.insert(name.to_string(), value.to_string());
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Device, DeviceObject, DeviceProfile, PropertyValue, ValueType};
    use infrastructure::config::{DeviceSection, MetadataSection, ServiceSection, SimulatorSection};
    use infrastructure::{FileMetadataStore, MetadataDocument, SimulatorConfig};

    fn config() -> ServiceConfig {
        ServiceConfig {
            service: ServiceSection {
                name: "svc".into(),
                timeout_ms: 750,
                labels: vec![],
            },
            device: DeviceSection {
                max_cmd_ops: 7,
                ..Default::default()
            },
            metadata: MetadataSection {
                path: "metadata.json".into(),
            },
            mqtt: None,
            simulator: SimulatorSection::default(),
        }
    }

    #[test]
    fn test_settings_from_config() {
        let settings = service_settings(&config());

        assert_eq!(settings.name, "svc");
        assert_eq!(settings.timeout, Duration::from_millis(750));
        assert_eq!(settings.max_cmd_ops, 7);
        assert_eq!(settings.async_buffer_size, 16);
        assert!(settings.data_transform);
    }

    #[test]
    fn test_parse_params() {
        let params =
            parse_params(&["Setpoint=81".to_string(), "Label=a=b".to_string()]).unwrap();
        assert_eq!(params["Setpoint"], "81");
        assert_eq!(params["Label"], "a=b");

        assert!(parse_params(&["novalue".to_string()]).is_err());
        assert!(parse_params(&["=1".to_string()]).is_err());
    }

    #[tokio::test]
    async fn test_watch_async_objects() {
        let mut pushed = DeviceObject::new("Temp", PropertyValue::new(ValueType::Float32));
        pushed.attributes.insert("async".into(), Value::Bool(true));
        let document = MetadataDocument {
            devices: vec![Device::new("d1", "oven-1", "oven")],
            profiles: vec![
                DeviceProfile::new("oven")
                    .with_object(pushed)
                    .with_object(DeviceObject::new(
                        "Door",
                        PropertyValue::new(ValueType::Bool),
                    )),
            ],
        };

        let cfg = config();
        let driver = Arc::new(SimulatorDriver::new(SimulatorConfig::default()));
        let service = DeviceService::new(
            service_settings(&cfg),
            driver.clone(),
            build_publisher(&cfg),
            Arc::new(FileMetadataStore::from_document(document)),
        );
        service.start().await.unwrap();

        assert_eq!(watch_async_objects(&service, &driver).await, 1);
        service.stop(false).await;
    }
}
