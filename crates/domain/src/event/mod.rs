use chrono::Utc;
use serde::{Deserialize, Serialize};

mod publisher;
pub use publisher::EventPublisher;

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// One normalized value of one resource on one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub device: String,
    pub name: String,
    pub value: String,
    /// Epoch milliseconds.
    pub origin: i64,
}

impl Reading {
    pub fn new(
        device: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
        origin: i64,
    ) -> Self {
        Self {
            device: device.into(),
            name: name.into(),
            value: value.into(),
            origin,
        }
    }
}

/// Readings produced by one command invocation or one async push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub device: String,
    pub origin: i64,
    pub readings: Vec<Reading>,
}

impl Event {
    /// Creates an event stamped with the current time.
    pub fn new(device: impl Into<String>, readings: Vec<Reading>) -> Self {
        Self {
            device: device.into(),
            origin: now_millis(),
            readings,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Finds the reading for `resource`, if any.
    pub fn reading(&self, resource: &str) -> Option<&Reading> {
        self.readings.iter().find(|r| r.name == resource)
    }
}
