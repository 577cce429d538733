use async_trait::async_trait;

use crate::device::{Device, OperatingState};
use crate::error::Result;
use crate::profile::DeviceProfile;

/// Upstream registry holding device and profile definitions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataClient: Send + Sync {
    /// Persists a device's operating state upstream.
    async fn update_operating_state(&self, device_name: &str, state: OperatingState) -> Result<()>;

    /// Devices assigned to `service`.
    async fn devices_for_service(&self, service: &str) -> Result<Vec<Device>>;

    async fn device_profiles(&self) -> Result<Vec<DeviceProfile>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_metadata_client_is_mockable() {
        let mut client = MockMetadataClient::new();
        client
            .expect_update_operating_state()
            .with(eq("meter-1"), eq(OperatingState::Disabled))
            .times(1)
            .returning(|_, _| Ok(()));
        client
            .expect_devices_for_service()
            .returning(|_| Ok(vec![Device::new("id-1", "meter-1", "meter")]));

        client
            .update_operating_state("meter-1", OperatingState::Disabled)
            .await
            .unwrap();
        let devices = client.devices_for_service("svc").await.unwrap();
        assert_eq!(devices[0].name, "meter-1");
    }
}
