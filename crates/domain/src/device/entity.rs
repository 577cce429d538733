use serde::{Deserialize, Serialize};

use super::{AdminState, OperatingState};

/// Where and how a protocol driver reaches a device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Addressable {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub path: String,
}

/// A registered device bound to a profile by name.
///
/// # Invariants
/// - `id` and `name` are unique within a service
/// - `profile` names a profile known to the metadata index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub profile: String,
    #[serde(default)]
    pub admin_state: AdminState,
    #[serde(default)]
    pub operating_state: OperatingState,
    #[serde(default)]
    pub addressable: Addressable,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Device {
    pub fn new(id: impl Into<String>, name: impl Into<String>, profile: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            addressable: Addressable {
                name: name.clone(),
                ..Default::default()
            },
            name,
            profile: profile.into(),
            admin_state: AdminState::Unlocked,
            operating_state: OperatingState::Enabled,
            description: String::new(),
            labels: Vec::new(),
        }
    }

    pub fn with_admin_state(mut self, state: AdminState) -> Self {
        self.admin_state = state;
        self
    }

    pub fn is_locked(&self) -> bool {
        self.admin_state.is_locked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_device_creation() {
        let device = Device::new("5b9a4f9a", "thermostat-1", "thermostat");

        assert_eq!(device.id, "5b9a4f9a");
        assert_eq!(device.name, "thermostat-1");
        assert_eq!(device.profile, "thermostat");
        assert_eq!(device.addressable.name, "thermostat-1");
        assert!(!device.is_locked());
        assert_eq!(device.operating_state, OperatingState::Enabled);
    }

    #[test]
    fn test_device_deserializes_with_defaults() {
        let device: Device = serde_json::from_value(json!({
            "id": "d1",
            "name": "pump",
            "profile": "pump-profile",
            "admin_state": "LOCKED"
        }))
        .unwrap();

        assert!(device.is_locked());
        assert_eq!(device.operating_state, OperatingState::Enabled);
        assert!(device.labels.is_empty());
    }
}
