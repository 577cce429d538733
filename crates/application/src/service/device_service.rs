use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use domain::{
    AdminState, AsyncSender, Device, DeviceProfile, EventPublisher, MetadataClient,
    ProtocolDriver, Result,
};

use super::ServiceSettings;
use crate::cache::MetadataIndex;
use crate::command::{CommandExecutor, CommandOutcome, CommandResolver, ExecutorSettings};
use crate::ingest::AsyncProcessor;
use crate::transform::TransformEngine;

/// One running device service: the index, the driver, the event sink and
/// the async pipeline, with an explicit `start`/`stop` lifecycle.
pub struct DeviceService {
    settings: ServiceSettings,
    index: Arc<MetadataIndex>,
    driver: Arc<dyn ProtocolDriver>,
    metadata: Arc<dyn MetadataClient>,
    engine: Arc<TransformEngine>,
    publisher: Arc<dyn EventPublisher>,
    executor: CommandExecutor,
    locked: Arc<AtomicBool>,
    cancel: CancellationToken,
    async_tx: Mutex<Option<AsyncSender>>,
    processor: Mutex<Option<JoinHandle<()>>>,
}

impl DeviceService {
    pub fn new(
        settings: ServiceSettings,
        driver: Arc<dyn ProtocolDriver>,
        publisher: Arc<dyn EventPublisher>,
        metadata: Arc<dyn MetadataClient>,
    ) -> Self {
        let index = Arc::new(MetadataIndex::new());
        let locked = Arc::new(AtomicBool::new(false));
        let engine = Arc::new(TransformEngine::new(
            index.clone(),
            metadata.clone(),
            settings.data_transform,
        ));
        let resolver = Arc::new(CommandResolver::new(index.clone(), settings.max_cmd_ops));
        let executor = CommandExecutor::new(
            ExecutorSettings {
                service_name: settings.name.clone(),
                timeout: settings.timeout,
                data_transform: settings.data_transform,
            },
            index.clone(),
            resolver,
            engine.clone(),
            driver.clone(),
            publisher.clone(),
            locked.clone(),
        );

        Self {
            settings,
            index,
            driver,
            metadata,
            engine,
            publisher,
            executor,
            locked,
            cancel: CancellationToken::new(),
            async_tx: Mutex::new(None),
            processor: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn index(&self) -> &Arc<MetadataIndex> {
        &self.index
    }

    /// Loads metadata, starts the async processor and initializes the driver.
    ///
    /// Starting an already started service is a no-op.
    pub async fn start(&self) -> Result<()> {
        let mut processor_slot = self.processor.lock().await;
        if processor_slot.is_some() {
            warn!(service = %self.settings.name, "Device service already started");
            return Ok(());
        }
        info!(service = %self.settings.name, "Starting device service");

        self.index
            .initialize(self.metadata.as_ref(), &self.settings.name)
            .await;

        let (tx, rx) = mpsc::channel(self.settings.async_buffer_size.max(1));
        let processor = AsyncProcessor::new(
            self.index.clone(),
            self.engine.clone(),
            self.publisher.clone(),
            self.settings.async_drain_timeout,
        );
        let handle = tokio::spawn(processor.run(rx, self.cancel.child_token()));
        *processor_slot = Some(handle);
        drop(processor_slot);
        *self.async_tx.lock().await = Some(tx.clone());

        self.driver.initialize(tx).await?;

        info!(
            service = %self.settings.name,
            devices = self.index.devices().await.len(),
            "Device service started"
        );
        Ok(())
    }

    /// Stops the async processor, letting it drain, then stops the driver.
    pub async fn stop(&self, force: bool) {
        info!(service = %self.settings.name, force, "Stopping device service");
        self.cancel.cancel();
        self.async_tx.lock().await.take();

        if let Some(handle) = self.processor.lock().await.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "Async processor task failed");
            }
        }

        if let Err(e) = self.driver.stop(force).await {
            warn!(error = %e, "Driver did not stop cleanly");
        }
        info!(service = %self.settings.name, "Device service stopped");
    }

    /// Sender for values pushed outside of a command; `None` before start.
    pub async fn async_sender(&self) -> Option<AsyncSender> {
        self.async_tx.lock().await.clone()
    }

    // ----- commands -----

    pub async fn execute_get(&self, device_id: &str, command: &str) -> Result<CommandOutcome> {
        self.executor.execute_get(device_id, command).await
    }

    pub async fn execute_put(
        &self,
        device_id: &str,
        command: &str,
        params: &HashMap<String, String>,
    ) -> Result<()> {
        self.executor.execute_put(device_id, command, params).await
    }

    pub async fn execute_get_all(&self, command: &str) -> Vec<(String, Result<CommandOutcome>)> {
        self.executor.execute_get_all(command).await
    }

    // ----- callbacks and managed metadata -----

    pub async fn handle_admin_state_callback(&self, id: &str, state: AdminState) -> Result<()> {
        self.index.update_admin_state(id, state).await
    }

    pub async fn add_device_profile(&self, profile: DeviceProfile) -> Result<()> {
        self.index.add_profile(profile).await
    }

    pub async fn update_device_profile(&self, profile: DeviceProfile) -> Result<()> {
        self.index.update_profile(profile).await
    }

    pub async fn remove_device_profile(&self, name: &str) -> Result<DeviceProfile> {
        self.index.remove_profile(name).await
    }

    pub async fn device_profiles(&self) -> Vec<DeviceProfile> {
        self.index.profiles().await
    }

    /// Registers a device; its profile must already be known.
    pub async fn add_device(&self, device: Device) -> Result<()> {
        self.index.profile_by_name(&device.profile).await?;
        self.index.add_device(device).await
    }

    /// Removes a device by id and releases its driver connection.
    pub async fn remove_device(&self, id: &str) -> Result<Device> {
        let device = self.index.device_by_id(id).await?;
        let device = self.index.remove_device(&device.name).await?;
        if let Err(e) = self.driver.disconnect_device(&device.addressable).await {
            warn!(device = %device.name, error = %e, "Driver failed to disconnect device");
        }
        Ok(device)
    }

    pub fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::SeqCst);
        info!(service = %self.settings.name, locked, "Service lock changed");
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> &'static str {
        "pong"
    }
}
