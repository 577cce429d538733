use async_trait::async_trait;
use domain::Event;
use domain::event::EventPublisher;
use std::sync::Arc;

/// Fans every event out to several publishers.
pub struct CompositeEventPublisher {
    publishers: Vec<Arc<dyn EventPublisher>>,
}

impl CompositeEventPublisher {
    pub fn new(publishers: Vec<Arc<dyn EventPublisher>>) -> Self {
        Self { publishers }
    }
}

#[async_trait]
impl EventPublisher for CompositeEventPublisher {
    async fn publish(&self, event: Event) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        for publisher in &self.publishers {
            if let Err(e) = publisher.publish(event.clone()).await {
                tracing::error!(device = %event.device, error = %e, "Publisher failed");
            }
        }
        Ok(())
    }
}
