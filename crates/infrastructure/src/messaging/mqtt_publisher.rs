use std::sync::Arc;

use async_trait::async_trait;
use domain::Event;
use domain::event::EventPublisher;
use rumqttc::QoS;

use crate::messaging::mqtt_client::MqttPublisherClient;

/// Publishes each event as JSON to `<topic_prefix>/<device>`.
pub struct MqttEventPublisher {
    client: Arc<dyn MqttPublisherClient>,
    topic_prefix: String,
}

impl MqttEventPublisher {
    pub fn new(client: Arc<dyn MqttPublisherClient>, topic_prefix: impl Into<String>) -> Self {
        Self {
            client,
            topic_prefix: topic_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn topic_for(&self, device: &str) -> String {
        format!("{}/{}", self.topic_prefix, device)
    }
}

#[async_trait]
impl EventPublisher for MqttEventPublisher {
    async fn publish(&self, event: Event) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if !self.client.is_connected() {
            tracing::warn!(device = %event.device, "MQTT not connected, publishing anyway");
        }
        let topic = self.topic_for(&event.device);
        let payload = serde_json::to_vec(&event)?;
        self.client
            .publish_bytes(&topic, &payload, QoS::AtLeastOnce, false)
            .await?;
        tracing::debug!(topic = %topic, readings = event.readings.len(), "Event published to MQTT");
        Ok(())
    }
}
