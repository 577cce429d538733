use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use domain::event::now_millis;
use domain::{
    CommandRequest, CommandValue, Device, DomainError, Event, EventPublisher, Method,
    ProtocolDriver, Result,
};

use super::resolver::CommandResolver;
use crate::cache::MetadataIndex;
use crate::transform::{TransformEngine, transform_write_value};

#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub service_name: String,
    /// Upper bound for a single driver call.
    pub timeout: Duration,
    /// Applies the numeric step of outbound transforms.
    pub data_transform: bool,
}

/// Result of a GET command.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub event: Event,
    /// False when some driver values were dropped during normalization.
    pub transforms_ok: bool,
}

/// Runs commands against devices through the protocol driver.
///
/// Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct CommandExecutor {
    settings: Arc<ExecutorSettings>,
    index: Arc<MetadataIndex>,
    resolver: Arc<CommandResolver>,
    engine: Arc<TransformEngine>,
    driver: Arc<dyn ProtocolDriver>,
    publisher: Arc<dyn EventPublisher>,
    locked: Arc<AtomicBool>,
}

impl CommandExecutor {
    pub fn new(
        settings: ExecutorSettings,
        index: Arc<MetadataIndex>,
        resolver: Arc<CommandResolver>,
        engine: Arc<TransformEngine>,
        driver: Arc<dyn ProtocolDriver>,
        publisher: Arc<dyn EventPublisher>,
        locked: Arc<AtomicBool>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            index,
            resolver,
            engine,
            driver,
            publisher,
            locked,
        }
    }

    /// Looks a device up by id, then by name.
    async fn lookup(&self, device: &str) -> Result<Device> {
        match self.index.device_by_id(device).await {
            Err(DomainError::DeviceNotFound(_)) => self.index.device_by_name(device).await,
            other => other,
        }
    }

    fn check_service_lock(&self) -> Result<()> {
        if self.locked.load(Ordering::SeqCst) {
            return Err(DomainError::Locked(format!(
                "service {}",
                self.settings.service_name
            )));
        }
        Ok(())
    }

    fn check_device_lock(&self, device: &Device) -> Result<()> {
        if device.is_locked() {
            return Err(DomainError::Locked(format!("device {}", device.name)));
        }
        Ok(())
    }

    fn timeout_ms(&self) -> u64 {
        self.settings.timeout.as_millis() as u64
    }

    /// Reads `command` from `device` and emits the resulting event.
    pub async fn execute_get(&self, device: &str, command: &str) -> Result<CommandOutcome> {
        self.check_service_lock()?;
        let device = self.lookup(device).await?;
        self.check_device_lock(&device)?;

        let requests = self.resolver.resolve(&device, command, Method::Get).await?;

        let values = match timeout(
            self.settings.timeout,
            self.driver
                .handle_get_commands(&device.addressable, requests.clone()),
        )
        .await
        {
            Err(_) => {
                warn!(device = %device.name, command = %command, "Driver read timed out");
                return Err(DomainError::Timeout(self.timeout_ms()));
            }
            Ok(Err(e)) => {
                error!(device = %device.name, command = %command, error = %e, "Driver read failed");
                return Err(as_driver_error(e));
            }
            Ok(Ok(values)) => values,
        };

        let outcome = self
            .engine
            .transform_all(&device.name, &requests, values)
            .await;
        if !outcome.all_ok {
            warn!(device = %device.name, command = %command, "Some values were dropped");
        }

        let event = Event::new(device.name.clone(), outcome.readings);
        self.emit(event.clone());

        Ok(CommandOutcome {
            event,
            transforms_ok: outcome.all_ok,
        })
    }

    /// Writes `command` to `device`.
    ///
    /// Each operation takes its value from `params` under the device object
    /// name, else the operation's own parameter, else the object's default.
    pub async fn execute_put(
        &self,
        device: &str,
        command: &str,
        params: &HashMap<String, String>,
    ) -> Result<()> {
        self.check_service_lock()?;
        let device = self.lookup(device).await?;
        self.check_device_lock(&device)?;

        let requests = self.resolver.resolve(&device, command, Method::Set).await?;
        let origin = now_millis();
        let values = requests
            .iter()
            .map(|req| self.put_value(req, params, origin))
            .collect::<Result<Vec<_>>>()?;

        match timeout(
            self.settings.timeout,
            self.driver
                .handle_put_commands(&device.addressable, requests, values),
        )
        .await
        {
            Err(_) => {
                warn!(device = %device.name, command = %command, "Driver write timed out");
                Err(DomainError::Timeout(self.timeout_ms()))
            }
            Ok(Err(e)) => {
                error!(device = %device.name, command = %command, error = %e, "Driver write failed");
                Err(as_driver_error(e))
            }
            Ok(Ok(())) => {
                debug!(device = %device.name, command = %command, "Write completed");
                Ok(())
            }
        }
    }

    fn put_value(
        &self,
        req: &CommandRequest,
        params: &HashMap<String, String>,
        origin: i64,
    ) -> Result<CommandValue> {
        let pv = req.object.property_value();
        let text = params
            .get(req.object_name())
            .map(String::as_str)
            .or_else(|| non_empty(&req.operation.parameter))
            .or_else(|| non_empty(&pv.default_value))
            .ok_or_else(|| {
                DomainError::InvalidParameter(format!("no value given for {}", req.object_name()))
            })?;

        let mut value = CommandValue::parse(pv.value_type, req.object_name(), origin, text)?;
        if self.settings.data_transform {
            transform_write_value(pv, &mut value)?;
        }
        Ok(value)
    }

    /// Runs `command` against every unlocked device whose profile declares it.
    pub async fn execute_get_all(&self, command: &str) -> Vec<(String, Result<CommandOutcome>)> {
        let mut tasks = JoinSet::new();

        for device in self.index.devices().await {
            if device.is_locked() {
                continue;
            }
            match self.index.command_exists(&device.profile, command).await {
                Ok(true) => {}
                _ => continue,
            }

            let this = self.clone();
            let command = command.to_string();
            tasks.spawn(async move {
                let result = this.execute_get(&device.id, &command).await;
                (device.name, result)
            });
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => results.push(entry),
                Err(e) => error!(command = %command, error = %e, "Command task failed"),
            }
        }
        info!(command = %command, devices = results.len(), "Command executed on all devices");
        results
    }

    fn emit(&self, event: Event) {
        if event.is_empty() {
            debug!(device = %event.device, "No readings, event not published");
            return;
        }
        let publisher = self.publisher.clone();
        tokio::spawn(async move {
            let device = event.device.clone();
            if let Err(e) = publisher.publish(event).await {
                error!(device = %device, error = %e, "Failed to publish event");
            }
        });
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() { None } else { Some(s) }
}

fn as_driver_error(e: DomainError) -> DomainError {
    match e {
        DomainError::DriverError(_) => e,
        other => DomainError::DriverError(other.to_string()),
    }
}
