use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use domain::event::now_millis;
use domain::{
    Addressable, AsyncSender, AsyncValues, CommandRequest, CommandValue, DeviceObject,
    DomainError, ProtocolDriver, Result, ValueType,
};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SimulatorConfig {
    /// Period of unsolicited pushes; 0 disables them.
    #[serde(default)]
    pub async_interval_ms: u64,
}

struct SimulatorState {
    started: Instant,
    /// Last written value per (device, object).
    writes: Mutex<HashMap<(String, String), CommandValue>>,
    /// Objects pushed periodically, per device.
    watches: Mutex<Vec<(String, DeviceObject)>>,
}

impl SimulatorState {
    /// Produces the current value of `object` on `device`.
    ///
    /// Precedence: last write, the `value` attribute, a sine wave between the
    /// `min` and `max` attributes, then the zero value of the declared type.
    async fn generate(&self, device: &str, object: &DeviceObject) -> Result<CommandValue> {
        let written = self
            .writes
            .lock()
            .await
            .get(&(device.to_string(), object.name.clone()))
            .map(|v| v.to_string());

        let text = match written {
            Some(text) => text,
            None => self.attribute_text(object),
        };

        CommandValue::parse(object.value_type(), &object.name, now_millis(), &text).map_err(|e| {
            DomainError::DriverError(format!("simulated {} on {}: {}", object.name, device, e))
        })
    }

    fn attribute_text(&self, object: &DeviceObject) -> String {
        let attrs = &object.attributes;
        if let Some(value) = attrs.get("value") {
            return match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
        }

        let value_type = object.value_type();
        let range = attrs
            .get("min")
            .and_then(Value::as_f64)
            .zip(attrs.get("max").and_then(Value::as_f64));
        if let (Some((min, max)), true) = (range, value_type.is_numeric()) {
            let elapsed = self.started.elapsed().as_secs_f64();
            let midpoint = min + (max - min) / 2.0;
            let amplitude = (max - min) / 2.0;
            // 10 s period
            let raw = midpoint + amplitude * (elapsed * 0.1 * 2.0 * std::f64::consts::PI).sin();
            return if value_type.is_integer() {
                format!("{}", raw.round() as i64)
            } else {
                format!("{:.2}", raw)
            };
        }

        match value_type {
            ValueType::Bool => "false".to_string(),
            ValueType::String => String::new(),
            _ => "0".to_string(),
        }
    }
}

/// Protocol driver that fabricates values instead of talking to hardware.
pub struct SimulatorDriver {
    config: SimulatorConfig,
    state: Arc<SimulatorState>,
    cancel: CancellationToken,
}

impl SimulatorDriver {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            state: Arc::new(SimulatorState {
                started: Instant::now(),
                writes: Mutex::new(HashMap::new()),
                watches: Mutex::new(Vec::new()),
            }),
            cancel: CancellationToken::new(),
        }
    }

    /// Adds `object` of `device` to the periodic async pushes.
    pub async fn watch(&self, device: &str, object: DeviceObject) {
        debug!(device = %device, object = %object.name, "Watching object");
        self.state
            .watches
            .lock()
            .await
            .push((device.to_string(), object));
    }

    fn spawn_pusher(&self, tx: AsyncSender, period: Duration) {
        let state = self.state.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let watches = state.watches.lock().await.clone();
                        let mut batches: HashMap<String, Vec<CommandValue>> = HashMap::new();
                        for (device, object) in &watches {
                            match state.generate(device, object).await {
                                Ok(value) => batches.entry(device.clone()).or_default().push(value),
                                Err(e) => warn!(device = %device, error = %e, "Simulated push failed"),
                            }
                        }
                        for (device, values) in batches {
                            if tx.send(AsyncValues::new(device, values)).await.is_err() {
                                info!("Async channel closed, simulator pushes stopped");
                                return;
                            }
                        }
                    }
                }
            }
            debug!("Simulator pusher stopped");
        });
    }
}

#[async_trait]
impl ProtocolDriver for SimulatorDriver {
    async fn initialize(&self, async_tx: AsyncSender) -> Result<()> {
        if self.config.async_interval_ms > 0 {
            info!(interval_ms = self.config.async_interval_ms, "Simulator async pushes enabled");
            self.spawn_pusher(async_tx, Duration::from_millis(self.config.async_interval_ms));
        }
        Ok(())
    }

    async fn handle_get_commands(
        &self,
        addr: &Addressable,
        reqs: Vec<CommandRequest>,
    ) -> Result<Vec<CommandValue>> {
        let mut values = Vec::with_capacity(reqs.len());
        for req in &reqs {
            values.push(self.state.generate(&addr.name, &req.object).await?);
        }
        debug!(device = %addr.name, count = values.len(), "Simulated read");
        Ok(values)
    }

    async fn handle_put_commands(
        &self,
        addr: &Addressable,
        reqs: Vec<CommandRequest>,
        params: Vec<CommandValue>,
    ) -> Result<()> {
        if reqs.len() != params.len() {
            return Err(DomainError::DriverError(format!(
                "{} requests but {} parameters",
                reqs.len(),
                params.len()
            )));
        }

        let mut writes = self.state.writes.lock().await;
        for (req, value) in reqs.into_iter().zip(params) {
            debug!(device = %addr.name, object = %req.object.name, value = %value, "Simulated write");
            writes.insert((addr.name.clone(), req.object.name), value);
        }
        Ok(())
    }

    async fn stop(&self, force: bool) -> Result<()> {
        info!(force, "Simulator stopping");
        self.cancel.cancel();
        Ok(())
    }

    async fn disconnect_device(&self, addr: &Addressable) -> Result<()> {
        self.state
            .writes
            .lock()
            .await
            .retain(|(device, _), _| device != &addr.name);
        self.state
            .watches
            .lock()
            .await
            .retain(|(device, _)| device != &addr.name);
        Ok(())
    }
}
