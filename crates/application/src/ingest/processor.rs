use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use domain::{AsyncValues, CommandRequest, Event, EventPublisher, ResourceOperation};

use crate::cache::MetadataIndex;
use crate::transform::TransformEngine;

/// Consumes values pushed by the driver and publishes them as events.
pub struct AsyncProcessor {
    index: Arc<MetadataIndex>,
    engine: Arc<TransformEngine>,
    publisher: Arc<dyn EventPublisher>,
    drain_timeout: Duration,
}

impl AsyncProcessor {
    pub fn new(
        index: Arc<MetadataIndex>,
        engine: Arc<TransformEngine>,
        publisher: Arc<dyn EventPublisher>,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            index,
            engine,
            publisher,
            drain_timeout,
        }
    }

    /// Processes batches until `cancel` fires or every sender is gone.
    ///
    /// After cancellation, batches already queued are still processed until
    /// the drain timeout elapses; anything left after that is discarded.
    pub async fn run(self, mut rx: mpsc::Receiver<AsyncValues>, cancel: CancellationToken) {
        info!("Async processor started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                batch = rx.recv() => match batch {
                    Some(batch) => {
                        self.process(batch).await;
                    }
                    None => {
                        info!("Async channel closed, processor exiting");
                        return;
                    }
                },
            }
        }

        rx.close();
        let deadline = Instant::now() + self.drain_timeout;
        let mut drained = 0usize;
        loop {
            match timeout_at(deadline, rx.recv()).await {
                Ok(Some(batch)) => {
                    self.process(batch).await;
                    drained += 1;
                }
                Ok(None) => break,
                Err(_) => {
                    let mut discarded = 0usize;
                    while rx.try_recv().is_ok() {
                        discarded += 1;
                    }
                    warn!(discarded, "Drain timeout elapsed, discarding queued async values");
                    break;
                }
            }
        }
        info!(drained, "Async processor stopped");
    }

    /// Turns one pushed batch into an event and publishes it.
    ///
    /// Each value is read through the profile's `get` operation for its
    /// object, so mappings apply as they do for commands.
    ///
    /// Returns the published event, or `None` when nothing survived.
    pub async fn process(&self, batch: AsyncValues) -> Option<Event> {
        let device = match self.index.device_by_name(&batch.device_name).await {
            Ok(device) => device,
            Err(e) => {
                error!(device = %batch.device_name, error = %e, "Dropping async values for unknown device");
                return None;
            }
        };

        let mut requests = Vec::with_capacity(batch.values.len());
        let mut values = Vec::with_capacity(batch.values.len());
        for value in batch.values {
            let object = match self
                .index
                .device_object(&device.profile, value.resource())
                .await
            {
                Ok(object) => object,
                Err(e) => {
                    warn!(device = %device.name, resource = %value.resource(), error = %e, "Dropping async value");
                    continue;
                }
            };
            let op = match self.index.read_operation(&device.profile, &object.name).await {
                Some(op) => op,
                None => ResourceOperation::new("get", object.name.clone()),
            };
            requests.push(CommandRequest::new(op, object));
            values.push(value);
        }

        let outcome = self
            .engine
            .transform_all(&device.name, &requests, values)
            .await;
        if outcome.readings.is_empty() {
            debug!(device = %device.name, "No async readings to publish");
            return None;
        }

        let event = Event::new(device.name, outcome.readings);
        if let Err(e) = self.publisher.publish(event.clone()).await {
            error!(device = %event.device, error = %e, "Failed to publish async event");
        }
        Some(event)
    }
}
