use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::application::ports::{EventPublisher, FlowLookup, ProcessRuntime};
use crate::context::RequestContext;
use crate::domain::flow::FlowId;
use crate::domain::repository::WorkOrderRepository;
use crate::domain::work_order::{WorkOrder, WorkOrderId, WorkOrderStatus};
use crate::domain::{utc_now, utc_now_after};
use crate::error::{AggregateKind, PflowError, PflowResult, PortError, Step};

/// Input for [`WorkOrderService::create`]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkOrderInput {
    /// Flow to execute; must not be blank
    #[serde(default)]
    pub flow_id: String,
    /// Title; must not be blank
    #[serde(default)]
    pub title: String,
    /// Optional assignee
    #[serde(default)]
    pub assignee: Option<String>,
    /// Execution variables
    #[serde(default)]
    pub payload: Value,
    /// Optional metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Service for managing work orders
#[derive(Clone)]
pub struct WorkOrderService {
    repo: Arc<dyn WorkOrderRepository>,
    flows: Arc<dyn FlowLookup>,
    runtime: Option<Arc<dyn ProcessRuntime>>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl WorkOrderService {
    /// Create a work order service with no runtime and no publisher
    pub fn new(repo: Arc<dyn WorkOrderRepository>, flows: Arc<dyn FlowLookup>) -> Self {
        Self {
            repo,
            flows,
            runtime: None,
            publisher: None,
        }
    }

    /// Start and retry process instances through `runtime`
    pub fn with_runtime(mut self, runtime: Arc<dyn ProcessRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Publish lifecycle events through `publisher`
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// All work orders, most recently created first
    pub async fn list(&self, ctx: &RequestContext) -> PflowResult<Vec<WorkOrder>> {
        self.repo
            .list(ctx)
            .await
            .map_err(|e| PflowError::dependency(Step::List, e))
    }

    /// Create a pending work order for an existing flow and start its process
    ///
    /// The work order stays `pending` even when the engine accepts the start.
    pub async fn create(&self, ctx: &RequestContext, input: CreateWorkOrderInput) -> PflowResult<WorkOrder> {
        let flow_id = input.flow_id.trim();
        if flow_id.is_empty() {
            return Err(PflowError::validation("flowId is required"));
        }
        let title = input.title.trim();
        if title.is_empty() {
            return Err(PflowError::validation("title is required"));
        }

        let flow = self
            .flows
            .get(ctx, &FlowId::from(flow_id))
            .await
            .map_err(|e| PflowError::dependency(Step::LoadFlow, e))?;

        let work_order = WorkOrder::new(
            flow.id,
            title,
            input.assignee,
            input.payload,
            input.metadata,
            utc_now(),
        );
        let work_order = self
            .repo
            .create(ctx, work_order)
            .await
            .map_err(|e| PflowError::dependency(Step::Persist, e))?;

        if let Some(runtime) = &self.runtime {
            ctx.check()
                .map_err(|e| PflowError::dependency(Step::Start, e))?;
            runtime
                .start_process(ctx, &work_order.flow_id, &work_order.payload)
                .await
                .map_err(|e| {
                    tracing::warn!(
                        work_order_id = %work_order.id,
                        flow_id = %work_order.flow_id,
                        error = %e,
                        "Work order stored but process not started"
                    );
                    PflowError::dependency(Step::Start, e)
                })?;
        }

        if let Some(publisher) = &self.publisher {
            ctx.check()
                .map_err(|e| PflowError::dependency(Step::Publish, e))?;
            publisher
                .publish_work_order_created(ctx, &work_order)
                .await
                .map_err(|e| PflowError::dependency(Step::Publish, e))?;
        }

        tracing::info!(
            work_order_id = %work_order.id,
            flow_id = %work_order.flow_id,
            flow_name = %flow.name,
            "Work order created"
        );
        Ok(work_order)
    }

    /// Find a work order by id
    pub async fn get(&self, ctx: &RequestContext, id: &WorkOrderId) -> PflowResult<WorkOrder> {
        self.repo.get(ctx, id).await.map_err(|e| match e {
            PortError::NotFound { .. } => PflowError::not_found(AggregateKind::WorkOrder, id.as_str()),
            other => PflowError::dependency(Step::Load, other),
        })
    }

    /// Ask the engine to retry a work order and mark it running
    pub async fn retry(&self, ctx: &RequestContext, id: &WorkOrderId) -> PflowResult<WorkOrder> {
        let work_order = self.get(ctx, id).await?;

        if work_order.status.is_terminal() {
            tracing::debug!(
                work_order_id = %work_order.id,
                status = %work_order.status,
                "Retrying work order from a terminal status"
            );
        }

        if let Some(runtime) = &self.runtime {
            ctx.check()
                .map_err(|e| PflowError::dependency(Step::Retry, e))?;
            runtime
                .retry_process(ctx, &work_order.id)
                .await
                .map_err(|e| PflowError::dependency(Step::Retry, e))?;
        }

        let updated_at = utc_now_after(work_order.updated_at);
        let updated = self
            .repo
            .update_status(ctx, &work_order.id, WorkOrderStatus::Running, updated_at)
            .await
            .map_err(|e| match e {
                PortError::NotFound { .. } => PflowError::not_found(AggregateKind::WorkOrder, id.as_str()),
                other => PflowError::dependency(Step::Persist, other),
            })?;

        tracing::info!(
            work_order_id = %updated.id,
            from_status = %work_order.status,
            "Work order retried"
        );
        Ok(updated)
    }
}
