use async_trait::async_trait;
use pflow_core::{EventEnvelope, EventPublisher, Flow, LifecycleEvent, PortResult, RequestContext, WorkOrder};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::{EventSink, DEFAULT_ROUTING_KEY};

/// [`EventPublisher`] that encodes envelopes and hands them to an [`EventSink`]
#[derive(Clone)]
pub struct BusPublisher {
    sink: Arc<dyn EventSink>,
    routing_key: String,
}

impl BusPublisher {
    /// Publish through `sink` under the default routing key
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            routing_key: DEFAULT_ROUTING_KEY.to_string(),
        }
    }

    /// Use a different routing key
    pub fn with_routing_key(mut self, routing_key: impl Into<String>) -> Self {
        self.routing_key = routing_key.into();
        self
    }

    async fn publish<T: Serialize + Sync>(
        &self,
        ctx: &RequestContext,
        event: LifecycleEvent,
        data: &T,
    ) -> PortResult<()> {
        let payload = EventEnvelope::new(event, data)?.to_bytes()?;

        // encoding is local; the context only gates the send
        ctx.check()?;

        ctx.run(self.sink.send(&self.routing_key, payload)).await?;
        debug!(event = %event, routing_key = %self.routing_key, "Event published");
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for BusPublisher {
    async fn publish_flow_created(&self, ctx: &RequestContext, flow: &Flow) -> PortResult<()> {
        self.publish(ctx, LifecycleEvent::FlowCreated, flow).await
    }

    async fn publish_flow_updated(&self, ctx: &RequestContext, flow: &Flow) -> PortResult<()> {
        self.publish(ctx, LifecycleEvent::FlowUpdated, flow).await
    }

    async fn publish_work_order_created(&self, ctx: &RequestContext, work_order: &WorkOrder) -> PortResult<()> {
        self.publish(ctx, LifecycleEvent::WorkOrderCreated, work_order).await
    }

    async fn publish_work_order_completed(&self, ctx: &RequestContext, work_order: &WorkOrder) -> PortResult<()> {
        self.publish(ctx, LifecycleEvent::WorkOrderCompleted, work_order).await
    }
}
