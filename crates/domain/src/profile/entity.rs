use serde::{Deserialize, Serialize};

use super::{Command, DeviceObject, ProfileResource};

/// Template describing a device's resources, commands and transforms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub device_objects: Vec<DeviceObject>,
    #[serde(default)]
    pub resources: Vec<ProfileResource>,
    #[serde(default)]
    pub commands: Vec<Command>,
}

impl DeviceProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_object(mut self, object: DeviceObject) -> Self {
        self.device_objects.push(object);
        self
    }

    /// Declares `resource` and registers its name as a command.
    pub fn with_resource(mut self, resource: ProfileResource) -> Self {
        if !self.commands.iter().any(|c| c.name == resource.name) {
            self.commands.push(Command::new(resource.name.clone()));
        }
        self.resources.push(resource);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{PropertyValue, ResourceOperation};
    use crate::value::ValueType;

    #[test]
    fn test_builder_registers_commands() {
        let profile = DeviceProfile::new("switch")
            .with_object(DeviceObject::new("State", PropertyValue::new(ValueType::Bool)))
            .with_resource(ProfileResource {
                name: "Switch".into(),
                get: vec![ResourceOperation::new("get", "State")],
                set: vec![],
            });

        assert_eq!(profile.commands.len(), 1);
        assert_eq!(profile.commands[0].name, "Switch");
        assert_eq!(profile.device_objects.len(), 1);
    }
}
