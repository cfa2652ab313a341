//! Kafka sink
//!
//! Requires the native `librdkafka` library at build time.

use async_trait::async_trait;
use pflow_core::{PortError, PortResult};
use rdkafka::config::ClientConfig;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::EventSink;

/// Kafka producer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaConfig {
    /// Comma separated bootstrap servers
    pub brokers: String,
    /// Topic every envelope goes to
    pub topic: String,
    /// Producer client id
    pub client_id: String,
    /// Delivery timeout in milliseconds
    pub message_timeout_ms: u64,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            topic: "pflow.workorders".to_string(),
            client_id: "pflow-backend".to_string(),
            message_timeout_ms: 5000,
        }
    }
}

/// [`EventSink`] that produces to a Kafka topic, using the routing key as message key
pub struct KafkaSink {
    producer: FutureProducer,
    topic: String,
}

impl KafkaSink {
    /// Create the producer
    pub fn new(config: &KafkaConfig) -> PortResult<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("client.id", &config.client_id)
            .set("message.timeout.ms", config.message_timeout_ms.to_string())
            .create()
            .map_err(|e| PortError::Transport(format!("Failed to create Kafka producer: {}", e)))?;

        info!(brokers = %config.brokers, topic = %config.topic, "Kafka producer created");
        Ok(Self {
            producer,
            topic: config.topic.clone(),
        })
    }

    /// Wait for outstanding deliveries
    pub fn flush(&self, timeout: Duration) -> PortResult<()> {
        self.producer
            .flush(timeout)
            .map_err(|e| PortError::Transport(format!("Failed to flush Kafka producer: {}", e)))
    }
}

#[async_trait]
impl EventSink for KafkaSink {
    async fn send(&self, routing_key: &str, payload: Vec<u8>) -> PortResult<()> {
        let headers = OwnedHeaders::new().insert(Header {
            key: "content-type",
            value: Some("application/json"),
        });
        let record = FutureRecord::to(&self.topic)
            .key(routing_key)
            .payload(&payload)
            .headers(headers);

        let (partition, offset) = self
            .producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| PortError::Transport(format!("Failed to send message: {}", e)))?;

        debug!(topic = %self.topic, partition, offset, "Event delivered to Kafka");
        Ok(())
    }
}
