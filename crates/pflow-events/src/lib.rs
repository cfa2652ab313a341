//! Lifecycle event publishing
//!
//! [`BusPublisher`] implements the core [`pflow_core::EventPublisher`] port
//! by encoding each event into an [`pflow_core::EventEnvelope`] and handing
//! the bytes to an [`EventSink`]. Sinks are the transport: an in-process
//! broadcast channel, or Kafka with the `kafka` feature.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use pflow_core::PortResult;

/// Publisher over an event sink
pub mod publisher;

/// In-process broadcast sink
pub mod broadcast;

/// Kafka sink
#[cfg(feature = "kafka")]
pub mod kafka;

pub use broadcast::{BroadcastSink, PublishedEvent};
pub use publisher::BusPublisher;

#[cfg(feature = "kafka")]
pub use kafka::{KafkaConfig, KafkaSink};

/// Default routing key
pub const DEFAULT_ROUTING_KEY: &str = "events";

/// Transport for encoded envelopes
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one encoded envelope under `routing_key`
    async fn send(&self, routing_key: &str, payload: Vec<u8>) -> PortResult<()>;
}
