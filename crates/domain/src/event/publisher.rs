use crate::Event;
use async_trait::async_trait;

/// Sink for assembled events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: Event) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
