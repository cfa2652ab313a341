use async_trait::async_trait;
use pflow_core::{EventEnvelope, PortResult};
use tokio::sync::broadcast;
use tracing::trace;

use crate::EventSink;

/// An envelope as delivered to broadcast subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEvent {
    /// Routing key it was sent under
    pub routing_key: String,
    /// Encoded envelope
    pub payload: Vec<u8>,
}

impl PublishedEvent {
    /// Decode the payload
    pub fn envelope(&self) -> PortResult<EventEnvelope> {
        Ok(serde_json::from_slice(&self.payload)?)
    }
}

/// In-process sink backed by a tokio broadcast channel
#[derive(Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<PublishedEvent>,
}

impl BroadcastSink {
    /// Create a sink that buffers up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive every event sent after this call
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EventSink for BroadcastSink {
    async fn send(&self, routing_key: &str, payload: Vec<u8>) -> PortResult<()> {
        let event = PublishedEvent {
            routing_key: routing_key.to_string(),
            payload,
        };
        // No subscribers is not an error, same as a broker with no bound queue
        match self.sender.send(event) {
            Ok(receivers) => trace!(receivers, "Event broadcast"),
            Err(_) => trace!("Event dropped, no subscribers"),
        }
        Ok(())
    }
}
