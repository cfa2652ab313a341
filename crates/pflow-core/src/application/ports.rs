//! Collaborator ports used by the application services
//!
//! Repositories live in [`crate::domain::repository`]. The traits here cover
//! the remote workflow engine, the event bus and the read-only flow lookup
//! used when creating work orders.

use async_trait::async_trait;
use serde_json::Value;

use crate::context::RequestContext;
use crate::domain::flow::{Flow, FlowId, FlowSummary};
use crate::domain::work_order::{WorkOrder, WorkOrderId};
use crate::error::PortResult;

/// Pushes flow definitions to the remote engine
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Deploy the flow's current definition
    async fn deploy(&self, ctx: &RequestContext, flow: &Flow) -> PortResult<()>;
}

/// Starts and retries process instances on the remote engine
#[async_trait]
pub trait ProcessRuntime: Send + Sync {
    /// Start a new instance of the flow with `payload` as its variables
    async fn start_process(&self, ctx: &RequestContext, flow_id: &FlowId, payload: &Value) -> PortResult<()>;

    /// Ask the engine to retry the instance behind a work order
    async fn retry_process(&self, ctx: &RequestContext, work_order_id: &WorkOrderId) -> PortResult<()>;
}

/// Emits lifecycle events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// `flow.created`
    async fn publish_flow_created(&self, ctx: &RequestContext, flow: &Flow) -> PortResult<()>;

    /// `flow.updated`
    async fn publish_flow_updated(&self, ctx: &RequestContext, flow: &Flow) -> PortResult<()>;

    /// `workorder.created`
    async fn publish_work_order_created(&self, ctx: &RequestContext, work_order: &WorkOrder) -> PortResult<()>;

    /// `workorder.completed`
    async fn publish_work_order_completed(&self, ctx: &RequestContext, work_order: &WorkOrder) -> PortResult<()>;
}

/// Read-only flow lookup
#[async_trait]
pub trait FlowLookup: Send + Sync {
    /// Resolve a flow, or [`crate::PortError::NotFound`]
    async fn get(&self, ctx: &RequestContext, id: &FlowId) -> PortResult<FlowSummary>;
}

#[cfg(test)]
pub(crate) use mocks::*;
