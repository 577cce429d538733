use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Command method a resource operation list is declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Set,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
        }
    }
}

impl std::str::FromStr for Method {
    type Err = String;

    /// Accepts HTTP verbs as well (`PUT` is a set).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "set" | "put" => Ok(Self::Set),
            other => Err(format!("unknown method: {}", other)),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a command, targeting one device object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceOperation {
    pub index: String,
    pub operation: String,
    /// Name of the targeted device object.
    pub object: String,
    pub parameter: String,
    pub resource: String,
    pub secondary: Vec<String>,
    /// Rendered value -> replacement string.
    pub mappings: HashMap<String, String>,
}

impl ResourceOperation {
    pub fn new(operation: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            object: object.into(),
            ..Default::default()
        }
    }

    pub fn with_mappings(mut self, mappings: HashMap<String, String>) -> Self {
        self.mappings = mappings;
        self
    }
}

/// Named command with its ordered get and set operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileResource {
    pub name: String,
    #[serde(default)]
    pub get: Vec<ResourceOperation>,
    #[serde(default)]
    pub set: Vec<ResourceOperation>,
}

/// Declared command name (used for value descriptor bookkeeping).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
