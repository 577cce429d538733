#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use tokio::sync::mpsc;

use application::{DeviceService, ServiceSettings};
use domain::{
    Addressable, AsyncSender, CommandRequest, CommandValue, Device, DeviceObject, DeviceProfile,
    DomainError, Event, EventPublisher, MetadataClient, OperatingState, ProfileResource,
    PropertyValue, ProtocolDriver, ResourceOperation, Result, ValueType,
};

// --- Ports ---

mock! {
    pub Driver {}

    #[async_trait]
    impl ProtocolDriver for Driver {
        async fn initialize(&self, async_tx: AsyncSender) -> Result<()>;
        async fn handle_get_commands(
            &self,
            addr: &Addressable,
            reqs: Vec<CommandRequest>,
        ) -> Result<Vec<CommandValue>>;
        async fn handle_put_commands(
            &self,
            addr: &Addressable,
            reqs: Vec<CommandRequest>,
            params: Vec<CommandValue>,
        ) -> Result<()>;
        async fn stop(&self, force: bool) -> Result<()>;
        async fn disconnect_device(&self, addr: &Addressable) -> Result<()>;
    }
}

impl MockDriver {
    /// A driver that accepts start/stop and nothing else.
    pub fn lifecycle() -> Self {
        let mut driver = MockDriver::new();
        driver.expect_initialize().returning(|_| Ok(()));
        driver.expect_stop().returning(|_| Ok(()));
        driver
    }
}

/// Driver that answers reads only after `delay`.
pub struct SlowDriver {
    pub delay: Duration,
}

#[async_trait]
impl ProtocolDriver for SlowDriver {
    async fn initialize(&self, _async_tx: AsyncSender) -> Result<()> {
        Ok(())
    }

    async fn handle_get_commands(
        &self,
        _addr: &Addressable,
        reqs: Vec<CommandRequest>,
    ) -> Result<Vec<CommandValue>> {
        tokio::time::sleep(self.delay).await;
        Ok(reqs
            .iter()
            .map(|r| CommandValue::new_i32(r.object_name(), 0, 1))
            .collect())
    }

    async fn handle_put_commands(
        &self,
        _addr: &Addressable,
        _reqs: Vec<CommandRequest>,
        _params: Vec<CommandValue>,
    ) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn stop(&self, _force: bool) -> Result<()> {
        Ok(())
    }

    async fn disconnect_device(&self, _addr: &Addressable) -> Result<()> {
        Ok(())
    }
}

pub struct MockEventPublisher {
    tx: mpsc::UnboundedSender<Event>,
}

impl MockEventPublisher {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl EventPublisher for MockEventPublisher {
    async fn publish(
        &self,
        event: Event,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let _ = self.tx.send(event);
        Ok(())
    }
}

/// Metadata source with fixed content that reports state updates on a channel.
pub struct MockMetadata {
    devices: Vec<Device>,
    profiles: Vec<DeviceProfile>,
    updates: mpsc::UnboundedSender<(String, OperatingState)>,
}

impl MockMetadata {
    pub fn new(
        devices: Vec<Device>,
        profiles: Vec<DeviceProfile>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<(String, OperatingState)>) {
        let (updates, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                devices,
                profiles,
                updates,
            }),
            rx,
        )
    }
}

#[async_trait]
impl MetadataClient for MockMetadata {
    async fn update_operating_state(&self, device_name: &str, state: OperatingState) -> Result<()> {
        self.updates
            .send((device_name.to_string(), state))
            .map_err(|e| DomainError::ServerError(e.to_string()))
    }

    async fn devices_for_service(&self, _service: &str) -> Result<Vec<Device>> {
        Ok(self.devices.clone())
    }

    async fn device_profiles(&self) -> Result<Vec<DeviceProfile>> {
        Ok(self.profiles.clone())
    }
}

// --- Fixtures ---

pub const DEVICE_ID: &str = "a1b2";
pub const DEVICE: &str = "tank-1";

fn object(name: &str, value_type: ValueType, f: impl FnOnce(&mut PropertyValue)) -> DeviceObject {
    let mut pv = PropertyValue::new(value_type);
    f(&mut pv);
    DeviceObject::new(name, pv)
}

fn resource(name: &str, get: &[&str], set: &[&str]) -> ProfileResource {
    ProfileResource {
        name: name.to_string(),
        get: get.iter().map(|o| ResourceOperation::new("get", *o)).collect(),
        set: set.iter().map(|o| ResourceOperation::new("set", *o)).collect(),
    }
}

fn mappings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Profile covering every transform path.
///
/// - `Level`: Int32, base 2, scale 10, offset 1
/// - `Setpoint`: Int32, scale 10, offset 1 (writable)
/// - `Switch`: Uint8 mapped 1 -> ON, 0 -> OFF
/// - `Healthy`: Bool asserted "true"
/// - `Temp`: Float32, no transform
///
/// `Dual` reads `Switch` twice with different mappings.
pub fn tank_profile() -> DeviceProfile {
    let on_off = mappings(&[("1", "ON"), ("0", "OFF")]);
    let mut switch = resource("Switch", &["Switch"], &[]);
    switch.get[0].mappings = on_off.clone();
    let mut overview = resource("Overview", &["Level", "Switch", "Temp"], &[]);
    overview.get[1].mappings = on_off;
    let mut dual = resource("Dual", &["Switch", "Switch"], &[]);
    dual.get[0].mappings = mappings(&[("1", "ON")]);
    dual.get[1].mappings = mappings(&[("1", "OPEN")]);

    DeviceProfile::new("tank")
        .with_object(object("Level", ValueType::Int32, |pv| {
            pv.base = "2".into();
            pv.scale = "10".into();
            pv.offset = "1".into();
        }))
        .with_object(object("Setpoint", ValueType::Int32, |pv| {
            pv.scale = "10".into();
            pv.offset = "1".into();
        }))
        .with_object(object("Switch", ValueType::Uint8, |_| {}))
        .with_object(object("Healthy", ValueType::Bool, |pv| {
            pv.assertion = "true".into();
        }))
        .with_object(object("Temp", ValueType::Float32, |pv| {
            pv.default_value = "21.5".into();
        }))
        .with_resource(resource("Level", &["Level"], &[]))
        .with_resource(resource("Setpoint", &[], &["Setpoint"]))
        .with_resource(switch)
        .with_resource(resource("Healthy", &["Healthy"], &[]))
        .with_resource(resource("Temp", &["Temp"], &["Temp"]))
        .with_resource(overview)
        .with_resource(dual)
        .with_resource(resource("Status", &["Level", "Healthy", "Temp"], &[]))
        .with_resource(resource("Everything", &["Level", "Switch", "Temp", "Healthy"], &[]))
        .with_resource(resource("Broken", &["Level", "Ghost"], &[]))
}

pub fn tank_device() -> Device {
    Device::new(DEVICE_ID, DEVICE, "tank")
}

pub fn settings() -> ServiceSettings {
    ServiceSettings {
        name: "tank-service".to_string(),
        timeout: Duration::from_millis(200),
        max_cmd_ops: 3,
        data_transform: true,
        async_buffer_size: 16,
        async_drain_timeout: Duration::from_millis(500),
    }
}

pub struct Harness {
    pub service: DeviceService,
    pub events: mpsc::UnboundedReceiver<Event>,
    pub state_updates: mpsc::UnboundedReceiver<(String, OperatingState)>,
}

/// A started service with one tank device.
pub async fn start_service(driver: Arc<dyn ProtocolDriver>) -> Harness {
    start_service_with(driver, settings(), vec![tank_device()]).await
}

pub async fn start_service_with(
    driver: Arc<dyn ProtocolDriver>,
    settings: ServiceSettings,
    devices: Vec<Device>,
) -> Harness {
    let (publisher, events) = MockEventPublisher::new();
    let (metadata, state_updates) = MockMetadata::new(devices, vec![tank_profile()]);
    let service = DeviceService::new(settings, driver, publisher, metadata);
    service.start().await.expect("service should start");
    Harness {
        service,
        events,
        state_updates,
    }
}

pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Option<Event> {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .ok()
        .flatten()
}
