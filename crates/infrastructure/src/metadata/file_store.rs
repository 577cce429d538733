use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use domain::{Device, DeviceProfile, DomainError, MetadataClient, OperatingState};

/// On-disk layout of the metadata file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataDocument {
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub profiles: Vec<DeviceProfile>,
}

/// Metadata client backed by a JSON file.
///
/// The file is read once; state updates only change the in-memory copy.
pub struct FileMetadataStore {
    document: RwLock<MetadataDocument>,
}

impl FileMetadataStore {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read metadata file {}", path.display()))?;
        let document: MetadataDocument = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid metadata file {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            devices = document.devices.len(),
            profiles = document.profiles.len(),
            "Metadata file loaded"
        );
        Ok(Self::from_document(document))
    }

    /// Devices without an addressable name are addressed by their own name.
    pub fn from_document(mut document: MetadataDocument) -> Self {
        for device in document.devices.iter_mut() {
            if device.addressable.name.is_empty() {
                device.addressable.name = device.name.clone();
            }
        }
        Self {
            document: RwLock::new(document),
        }
    }

    pub async fn snapshot(&self) -> MetadataDocument {
        self.document.read().await.clone()
    }
}

#[async_trait]
impl MetadataClient for FileMetadataStore {
    async fn update_operating_state(
        &self,
        device_name: &str,
        state: OperatingState,
    ) -> domain::Result<()> {
        let mut document = self.document.write().await;
        let device = document
            .devices
            .iter_mut()
            .find(|d| d.name == device_name)
            .ok_or_else(|| DomainError::DeviceNotFound(device_name.to_string()))?;
        device.operating_state = state;
        tracing::info!(device = %device_name, operating_state = %state.as_str(), "Operating state recorded");
        Ok(())
    }

    /// The file carries no service ownership; every device belongs to `service`.
    async fn devices_for_service(&self, service: &str) -> domain::Result<Vec<Device>> {
        let devices = self.document.read().await.devices.clone();
        tracing::debug!(service = %service, count = devices.len(), "Serving devices");
        Ok(devices)
    }

    async fn device_profiles(&self) -> domain::Result<Vec<DeviceProfile>> {
        Ok(self.document.read().await.profiles.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::ValueType;

    const DOCUMENT: &str = r#"{
        "devices": [
            { "id": "a1", "name": "meter-1", "profile": "meter",
              "addressable": { "protocol": "tcp", "address": "10.0.0.5", "port": 502 } }
        ],
        "profiles": [
            { "name": "meter",
              "device_objects": [
                { "name": "Energy", "properties": { "value": { "type": "Uint32", "scale": "0.01" } } }
              ],
              "resources": [ { "name": "Energy", "get": [ { "object": "Energy" } ] } ],
              "commands": [ { "name": "Energy" } ] }
        ]
    }"#;

    #[tokio::test]
    async fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("devsvc-metadata-{}.json", std::process::id()));
        tokio::fs::write(&path, DOCUMENT).await.unwrap();

        let store = FileMetadataStore::load(&path).await.unwrap();

        let devices = store.devices_for_service("svc").await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].addressable.port, 502);
        assert_eq!(devices[0].addressable.name, "meter-1");
        let profiles = store.device_profiles().await.unwrap();
        assert_eq!(
            profiles[0].device_objects[0].value_type(),
            ValueType::Uint32
        );
        assert_eq!(profiles[0].resources[0].get[0].object, "Energy");
        assert_eq!(profiles[0].commands[0].name, "Energy");
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let result = FileMetadataStore::load("/nonexistent/devsvc/metadata.json").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_operating_state_updates_in_memory() {
        let document: MetadataDocument = serde_json::from_str(DOCUMENT).unwrap();
        let store = FileMetadataStore::from_document(document);

        store
            .update_operating_state("meter-1", OperatingState::Disabled)
            .await
            .unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.devices[0].operating_state, OperatingState::Disabled);
        assert!(matches!(
            store
                .update_operating_state("ghost", OperatingState::Disabled)
                .await,
            Err(DomainError::DeviceNotFound(_))
        ));
    }
}
