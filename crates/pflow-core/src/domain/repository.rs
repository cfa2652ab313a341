//! Repository traits for flows and work orders
//!
//! Stores implement these traits. Every method receives the request
//! context and returns [`PortError::NotFound`] when no aggregate has the
//! requested id, distinct from infrastructure failures.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::flow::{Flow, FlowId};
use super::work_order::{WorkOrder, WorkOrderId, WorkOrderStatus};
use crate::context::RequestContext;
use crate::error::PortResult;
#[cfg(feature = "testing")]
use crate::error::PortError;

/// Repository for flows
#[async_trait]
pub trait FlowRepository: Send + Sync {
    /// All flows, most recently updated first
    async fn list(&self, ctx: &RequestContext) -> PortResult<Vec<Flow>>;

    /// Find a flow by id
    async fn get(&self, ctx: &RequestContext, id: &FlowId) -> PortResult<Flow>;

    /// Insert a new flow
    async fn create(&self, ctx: &RequestContext, flow: Flow) -> PortResult<Flow>;

    /// Write description, definition, metadata, version and updated_at of an existing flow
    async fn update(&self, ctx: &RequestContext, flow: Flow) -> PortResult<Flow>;
}

/// Repository for work orders
#[async_trait]
pub trait WorkOrderRepository: Send + Sync {
    /// All work orders, most recently created first
    async fn list(&self, ctx: &RequestContext) -> PortResult<Vec<WorkOrder>>;

    /// Find a work order by id
    async fn get(&self, ctx: &RequestContext, id: &WorkOrderId) -> PortResult<WorkOrder>;

    /// Insert a new work order
    async fn create(&self, ctx: &RequestContext, work_order: WorkOrder) -> PortResult<WorkOrder>;

    /// Set the status of an existing work order, returning the stored row
    async fn update_status(
        &self,
        ctx: &RequestContext,
        id: &WorkOrderId,
        status: WorkOrderStatus,
        updated_at: DateTime<Utc>,
    ) -> PortResult<WorkOrder>;
}

/// Memory implementations for testing and for running without a database
#[cfg(feature = "testing")]
pub mod memory {
    use super::*;
    use crate::error::AggregateKind;
    use dashmap::mapref::entry::Entry;
    use dashmap::DashMap;
    use std::sync::Arc;

    /// In-memory flow repository
    #[derive(Clone)]
    pub struct MemoryFlowRepository {
        flows: Arc<DashMap<String, Flow>>,
    }

    impl MemoryFlowRepository {
        /// Create an empty repository
        pub fn new() -> Self {
            Self {
                flows: Arc::new(DashMap::with_capacity(16)),
            }
        }

        /// Number of stored flows
        pub fn len(&self) -> usize {
            self.flows.len()
        }

        /// Whether the repository is empty
        pub fn is_empty(&self) -> bool {
            self.flows.is_empty()
        }
    }

    impl Default for MemoryFlowRepository {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl FlowRepository for MemoryFlowRepository {
        async fn list(&self, ctx: &RequestContext) -> PortResult<Vec<Flow>> {
            ctx.check()?;
            let mut flows: Vec<Flow> = self.flows.iter().map(|entry| entry.value().clone()).collect();
            flows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
            Ok(flows)
        }

        async fn get(&self, ctx: &RequestContext, id: &FlowId) -> PortResult<Flow> {
            ctx.check()?;
            self.flows
                .get(id.as_str())
                .map(|flow| flow.clone())
                .ok_or_else(|| PortError::not_found(AggregateKind::Flow, id.as_str()))
        }

        async fn create(&self, ctx: &RequestContext, flow: Flow) -> PortResult<Flow> {
            ctx.check()?;
            match self.flows.entry(flow.id.0.clone()) {
                Entry::Occupied(_) => Err(PortError::Storage(format!("duplicate flow id {}", flow.id))),
                Entry::Vacant(slot) => {
                    slot.insert(flow.clone());
                    Ok(flow)
                }
            }
        }

        async fn update(&self, ctx: &RequestContext, flow: Flow) -> PortResult<Flow> {
            ctx.check()?;
            let mut stored = self
                .flows
                .get_mut(flow.id.as_str())
                .ok_or_else(|| PortError::not_found(AggregateKind::Flow, flow.id.as_str()))?;

            stored.description = flow.description;
            stored.definition = flow.definition;
            stored.metadata = flow.metadata;
            stored.version = flow.version;
            stored.updated_at = flow.updated_at;
            Ok(stored.clone())
        }
    }

    /// In-memory work order repository
    #[derive(Clone)]
    pub struct MemoryWorkOrderRepository {
        work_orders: Arc<DashMap<String, WorkOrder>>,
    }

    impl MemoryWorkOrderRepository {
        /// Create an empty repository
        pub fn new() -> Self {
            Self {
                work_orders: Arc::new(DashMap::with_capacity(64)),
            }
        }

        /// Number of stored work orders
        pub fn len(&self) -> usize {
            self.work_orders.len()
        }

        /// Whether the repository is empty
        pub fn is_empty(&self) -> bool {
            self.work_orders.is_empty()
        }

        /// Overwrite the status directly, the way an external engine callback would
        pub fn force_status(&self, id: &WorkOrderId, status: WorkOrderStatus) -> bool {
            match self.work_orders.get_mut(id.as_str()) {
                Some(mut wo) => {
                    wo.status = status;
                    true
                }
                None => false,
            }
        }
    }

    impl Default for MemoryWorkOrderRepository {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl WorkOrderRepository for MemoryWorkOrderRepository {
        async fn list(&self, ctx: &RequestContext) -> PortResult<Vec<WorkOrder>> {
            ctx.check()?;
            let mut items: Vec<WorkOrder> = self
                .work_orders
                .iter()
                .map(|entry| entry.value().clone())
                .collect();
            items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
            Ok(items)
        }

        async fn get(&self, ctx: &RequestContext, id: &WorkOrderId) -> PortResult<WorkOrder> {
            ctx.check()?;
            self.work_orders
                .get(id.as_str())
                .map(|wo| wo.clone())
                .ok_or_else(|| PortError::not_found(AggregateKind::WorkOrder, id.as_str()))
        }

        async fn create(&self, ctx: &RequestContext, work_order: WorkOrder) -> PortResult<WorkOrder> {
            ctx.check()?;
            match self.work_orders.entry(work_order.id.0.clone()) {
                Entry::Occupied(_) => Err(PortError::Storage(format!(
                    "duplicate work order id {}",
                    work_order.id
                ))),
                Entry::Vacant(slot) => {
                    slot.insert(work_order.clone());
                    Ok(work_order)
                }
            }
        }

        async fn update_status(
            &self,
            ctx: &RequestContext,
            id: &WorkOrderId,
            status: WorkOrderStatus,
            updated_at: DateTime<Utc>,
        ) -> PortResult<WorkOrder> {
            ctx.check()?;
            let mut stored = self
                .work_orders
                .get_mut(id.as_str())
                .ok_or_else(|| PortError::not_found(AggregateKind::WorkOrder, id.as_str()))?;

            stored.status = status;
            stored.updated_at = updated_at;
            Ok(stored.clone())
        }
    }

}
