use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::ValueType;

/// Value description and transform parameters of a device object.
///
/// Transform parameters are kept as strings; an empty string means the step
/// is not configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyValue {
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub read_write: String,
    pub minimum: String,
    pub maximum: String,
    pub default_value: String,
    pub base: String,
    pub scale: String,
    pub offset: String,
    pub assertion: String,
}

impl PropertyValue {
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            read_write: "RW".to_string(),
            ..Default::default()
        }
    }

    /// True when any numeric transform step is configured.
    pub fn has_numeric_transform(&self) -> bool {
        !self.base.is_empty() || !self.scale.is_empty() || !self.offset.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Units {
    #[serde(rename = "type")]
    pub units_type: String,
    pub read_write: String,
    pub default_value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileProperty {
    pub value: PropertyValue,
    pub units: Units,
}

/// A single addressable resource within a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceObject {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub properties: ProfileProperty,
    /// Driver-specific addressing attributes (register, pin, topic, ...).
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl DeviceObject {
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            properties: ProfileProperty {
                value,
                units: Units::default(),
            },
            ..Default::default()
        }
    }

    pub fn property_value(&self) -> &PropertyValue {
        &self.properties.value
    }

    pub fn value_type(&self) -> ValueType {
        self.properties.value.value_type
    }
}
