use async_trait::async_trait;
use domain::{Event, EventPublisher};
use tracing::{debug, info};

/// Writes every event to the log.
#[derive(Debug, Default, Clone)]
pub struct LogEventPublisher;

impl LogEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisher for LogEventPublisher {
    async fn publish(&self, event: Event) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!(
            device = %event.device,
            origin = event.origin,
            readings = event.readings.len(),
            "Event"
        );
        for reading in &event.readings {
            debug!(
                device = %reading.device,
                resource = %reading.name,
                value = %reading.value,
                origin = reading.origin,
                "Reading"
            );
        }
        Ok(())
    }
}
