use std::collections::HashMap;

use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, error, info, warn};

use domain::{
    AdminState, Device, DeviceObject, DeviceProfile, DomainError, Method, MetadataClient,
    OperatingState, ResourceOperation, Result,
};

use super::profile_entry::ProfileEntry;

#[derive(Debug, Default)]
struct DeviceTable {
    by_name: HashMap<String, Device>,
    name_by_id: HashMap<String, String>,
}

impl DeviceTable {
    fn insert(&mut self, device: Device) -> Result<()> {
        if self.by_name.contains_key(&device.name) {
            return Err(DomainError::AlreadyExists(format!("device {}", device.name)));
        }
        if self.name_by_id.contains_key(&device.id) {
            return Err(DomainError::AlreadyExists(format!("device id {}", device.id)));
        }
        self.name_by_id.insert(device.id.clone(), device.name.clone());
        self.by_name.insert(device.name.clone(), device);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ProfileTable {
    entries: HashMap<String, ProfileEntry>,
}

impl ProfileTable {
    fn entry(&self, profile: &str) -> Result<&ProfileEntry> {
        self.entries
            .get(profile)
            .ok_or_else(|| DomainError::ProfileNotFound(profile.to_string()))
    }
}

/// Devices and profiles known to this service, plus the per-profile lookup
/// tables used by command resolution.
///
/// Each table sits behind its own lock. Readers receive owned copies, so no
/// lock outlives a call. Whenever both tables are locked, devices go first.
#[derive(Debug, Default)]
pub struct MetadataIndex {
    devices: RwLock<DeviceTable>,
    profiles: RwLock<ProfileTable>,
    initialized: OnceCell<()>,
}

impl MetadataIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads devices and profiles from the metadata client.
    ///
    /// Runs at most once; concurrent callers wait for the first load. A failed
    /// fetch is logged and leaves the corresponding table empty.
    pub async fn initialize(&self, client: &dyn MetadataClient, service_name: &str) {
        self.initialized
            .get_or_init(|| async {
                let devices = client
                    .devices_for_service(service_name)
                    .await
                    .unwrap_or_else(|e| {
                        error!(service = %service_name, error = %e, "Failed to fetch devices");
                        Vec::new()
                    });
                let profiles = client.device_profiles().await.unwrap_or_else(|e| {
                    error!(service = %service_name, error = %e, "Failed to fetch device profiles");
                    Vec::new()
                });

                let mut device_table = self.devices.write().await;
                let mut profile_table = self.profiles.write().await;

                for profile in profiles {
                    if profile_table.entries.contains_key(&profile.name) {
                        warn!(profile = %profile.name, "Duplicate profile ignored");
                        continue;
                    }
                    profile_table
                        .entries
                        .insert(profile.name.clone(), ProfileEntry::build(profile));
                }
                for device in devices {
                    let name = device.name.clone();
                    if let Err(e) = device_table.insert(device) {
                        warn!(device = %name, error = %e, "Skipping device");
                    }
                }

                info!(
                    devices = device_table.by_name.len(),
                    profiles = profile_table.entries.len(),
                    "Metadata index initialized"
                );
            })
            .await;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    // ----- devices -----

    pub async fn add_device(&self, device: Device) -> Result<()> {
        let name = device.name.clone();
        self.devices.write().await.insert(device)?;
        debug!(device = %name, "Device added");
        Ok(())
    }

    /// Replaces the device with the same name.
    pub async fn update_device(&self, device: Device) -> Result<()> {
        let mut table = self.devices.write().await;
        let old_id = match table.by_name.get(&device.name) {
            Some(existing) => existing.id.clone(),
            None => return Err(DomainError::DeviceNotFound(device.name)),
        };
        if old_id != device.id {
            if table.name_by_id.contains_key(&device.id) {
                return Err(DomainError::AlreadyExists(format!("device id {}", device.id)));
            }
            table.name_by_id.remove(&old_id);
            table
                .name_by_id
                .insert(device.id.clone(), device.name.clone());
        }
        table.by_name.insert(device.name.clone(), device);
        Ok(())
    }

    pub async fn remove_device(&self, name: &str) -> Result<Device> {
        let mut table = self.devices.write().await;
        let device = table
            .by_name
            .remove(name)
            .ok_or_else(|| DomainError::DeviceNotFound(name.to_string()))?;
        table.name_by_id.remove(&device.id);
        debug!(device = %name, "Device removed");
        Ok(device)
    }

    pub async fn device_by_name(&self, name: &str) -> Result<Device> {
        self.devices
            .read()
            .await
            .by_name
            .get(name)
            .cloned()
            .ok_or_else(|| DomainError::DeviceNotFound(name.to_string()))
    }

    pub async fn device_by_id(&self, id: &str) -> Result<Device> {
        let table = self.devices.read().await;
        table
            .name_by_id
            .get(id)
            .and_then(|name| table.by_name.get(name))
            .cloned()
            .ok_or_else(|| DomainError::DeviceNotFound(id.to_string()))
    }

    pub async fn devices(&self) -> Vec<Device> {
        self.devices.read().await.by_name.values().cloned().collect()
    }

    pub async fn update_admin_state(&self, id: &str, state: AdminState) -> Result<()> {
        let mut table = self.devices.write().await;
        let name = table
            .name_by_id
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::DeviceNotFound(id.to_string()))?;
        if let Some(device) = table.by_name.get_mut(&name) {
            device.admin_state = state;
        }
        info!(device = %name, admin_state = %state.as_str(), "Admin state updated");
        Ok(())
    }

    pub async fn update_operating_state(&self, name: &str, state: OperatingState) -> Result<()> {
        let mut table = self.devices.write().await;
        let device = table
            .by_name
            .get_mut(name)
            .ok_or_else(|| DomainError::DeviceNotFound(name.to_string()))?;
        device.operating_state = state;
        info!(device = %name, operating_state = %state.as_str(), "Operating state updated");
        Ok(())
    }

    // ----- profiles -----

    pub async fn add_profile(&self, profile: DeviceProfile) -> Result<()> {
        let mut table = self.profiles.write().await;
        if table.entries.contains_key(&profile.name) {
            return Err(DomainError::AlreadyExists(format!("profile {}", profile.name)));
        }
        debug!(profile = %profile.name, "Profile added");
        table
            .entries
            .insert(profile.name.clone(), ProfileEntry::build(profile));
        Ok(())
    }

    /// Replaces a profile and rebuilds all of its derived tables.
    pub async fn update_profile(&self, profile: DeviceProfile) -> Result<()> {
        let mut table = self.profiles.write().await;
        if !table.entries.contains_key(&profile.name) {
            return Err(DomainError::ProfileNotFound(profile.name));
        }
        debug!(profile = %profile.name, "Profile updated");
        table
            .entries
            .insert(profile.name.clone(), ProfileEntry::build(profile));
        Ok(())
    }

    pub async fn remove_profile(&self, name: &str) -> Result<DeviceProfile> {
        self.profiles
            .write()
            .await
            .entries
            .remove(name)
            .map(|entry| entry.profile)
            .ok_or_else(|| DomainError::ProfileNotFound(name.to_string()))
    }

    pub async fn profile_by_name(&self, name: &str) -> Result<DeviceProfile> {
        let table = self.profiles.read().await;
        table.entry(name).map(|e| e.profile.clone())
    }

    pub async fn profiles(&self) -> Vec<DeviceProfile> {
        self.profiles
            .read()
            .await
            .entries
            .values()
            .map(|e| e.profile.clone())
            .collect()
    }

    pub async fn device_object(&self, profile: &str, object: &str) -> Result<DeviceObject> {
        let table = self.profiles.read().await;
        table
            .entry(profile)?
            .objects
            .get(object)
            .cloned()
            .ok_or_else(|| DomainError::ResourceNotFound {
                profile: profile.to_string(),
                object: object.to_string(),
            })
    }

    pub async fn resource_operations(
        &self,
        profile: &str,
        command: &str,
        method: Method,
    ) -> Result<Vec<ResourceOperation>> {
        let table = self.profiles.read().await;
        table
            .entry(profile)?
            .operations
            .get(&(command.to_string(), method))
            .cloned()
            .ok_or_else(|| DomainError::CommandNotFound {
                profile: profile.to_string(),
                command: command.to_string(),
            })
    }

    /// The profile's `get` operation for `object`, if any resource reads it.
    pub async fn read_operation(&self, profile: &str, object: &str) -> Option<ResourceOperation> {
        let table = self.profiles.read().await;
        table.entries.get(profile)?.reads.get(object).cloned()
    }

    pub async fn command_exists(&self, profile: &str, command: &str) -> Result<bool> {
        let table = self.profiles.read().await;
        Ok(table.entry(profile)?.commands.contains(command))
    }
}
