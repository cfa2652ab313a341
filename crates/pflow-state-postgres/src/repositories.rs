use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pflow_core::{
    AggregateKind, Flow, FlowId, FlowRepository, PortError, PortResult, RequestContext, WorkOrder,
    WorkOrderId, WorkOrderRepository, WorkOrderStatus,
};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::Row;
use std::collections::HashMap;
use tracing::debug;

use crate::PostgresConnection;

const FLOW_COLUMNS: &str = "id, name, description, definition, metadata, version, created_at, updated_at";
const WORK_ORDER_COLUMNS: &str =
    "id, flow_id, title, assignee, status, payload, metadata, created_at, updated_at";

fn db_error(action: &str, err: sqlx::Error) -> PortError {
    PortError::Storage(format!("Failed to {}: {}", action, err))
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> PortResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| PortError::Serialization(format!("Error getting {}: {}", name, e)))
}

fn flow_from_row(row: &PgRow) -> PortResult<Flow> {
    let metadata: Json<HashMap<String, String>> = column(row, "metadata")?;
    Ok(Flow {
        id: FlowId(column(row, "id")?),
        name: column(row, "name")?,
        description: column(row, "description")?,
        definition: column(row, "definition")?,
        metadata: metadata.0,
        version: column(row, "version")?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

fn work_order_from_row(row: &PgRow) -> PortResult<WorkOrder> {
    let status: String = column(row, "status")?;
    let metadata: Json<HashMap<String, String>> = column(row, "metadata")?;
    Ok(WorkOrder {
        id: WorkOrderId(column(row, "id")?),
        flow_id: FlowId(column(row, "flow_id")?),
        title: column(row, "title")?,
        assignee: column(row, "assignee")?,
        status: status.parse().map_err(PortError::Serialization)?,
        payload: column(row, "payload")?,
        metadata: metadata.0,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

/// Postgres implementation of the FlowRepository
#[derive(Clone)]
pub struct PostgresFlowRepository {
    conn: PostgresConnection,
}

impl PostgresFlowRepository {
    /// Create a new Postgres flow repository
    pub fn new(conn: PostgresConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl FlowRepository for PostgresFlowRepository {
    async fn list(&self, ctx: &RequestContext) -> PortResult<Vec<Flow>> {
        let query = format!("SELECT {FLOW_COLUMNS} FROM flows ORDER BY updated_at DESC");
        let rows = ctx
            .run(async {
                sqlx::query(&query)
                    .fetch_all(self.conn.pool())
                    .await
                    .map_err(|e| db_error("list flows", e))
            })
            .await?;

        rows.iter().map(flow_from_row).collect()
    }

    async fn get(&self, ctx: &RequestContext, id: &FlowId) -> PortResult<Flow> {
        let query = format!("SELECT {FLOW_COLUMNS} FROM flows WHERE id = $1");
        let row = ctx
            .run(async {
                sqlx::query(&query)
                    .bind(id.as_str())
                    .fetch_optional(self.conn.pool())
                    .await
                    .map_err(|e| db_error("get flow", e))
            })
            .await?;

        match row {
            Some(row) => flow_from_row(&row),
            None => Err(PortError::not_found(AggregateKind::Flow, id.as_str())),
        }
    }

    async fn create(&self, ctx: &RequestContext, flow: Flow) -> PortResult<Flow> {
        let query = format!(
            "INSERT INTO flows ({FLOW_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {FLOW_COLUMNS}"
        );
        let row = ctx
            .run(async {
                sqlx::query(&query)
                    .bind(flow.id.as_str())
                    .bind(&flow.name)
                    .bind(&flow.description)
                    .bind(&flow.definition)
                    .bind(Json(&flow.metadata))
                    .bind(flow.version)
                    .bind(flow.created_at)
                    .bind(flow.updated_at)
                    .fetch_one(self.conn.pool())
                    .await
                    .map_err(|e| db_error("insert flow", e))
            })
            .await?;

        debug!(flow_id = %flow.id, "Inserted flow row");
        flow_from_row(&row)
    }

    async fn update(&self, ctx: &RequestContext, flow: Flow) -> PortResult<Flow> {
        let query = format!(
            "UPDATE flows SET description = $2, definition = $3, metadata = $4, version = $5, updated_at = $6 \
             WHERE id = $1 RETURNING {FLOW_COLUMNS}"
        );
        let row = ctx
            .run(async {
                sqlx::query(&query)
                    .bind(flow.id.as_str())
                    .bind(&flow.description)
                    .bind(&flow.definition)
                    .bind(Json(&flow.metadata))
                    .bind(flow.version)
                    .bind(flow.updated_at)
                    .fetch_optional(self.conn.pool())
                    .await
                    .map_err(|e| db_error("update flow", e))
            })
            .await?;

        match row {
            Some(row) => flow_from_row(&row),
            None => Err(PortError::not_found(AggregateKind::Flow, flow.id.as_str())),
        }
    }
}

/// Postgres implementation of the WorkOrderRepository
#[derive(Clone)]
pub struct PostgresWorkOrderRepository {
    conn: PostgresConnection,
}

impl PostgresWorkOrderRepository {
    /// Create a new Postgres work order repository
    pub fn new(conn: PostgresConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl WorkOrderRepository for PostgresWorkOrderRepository {
    async fn list(&self, ctx: &RequestContext) -> PortResult<Vec<WorkOrder>> {
        let query = format!("SELECT {WORK_ORDER_COLUMNS} FROM workorders ORDER BY created_at DESC");
        let rows = ctx
            .run(async {
                sqlx::query(&query)
                    .fetch_all(self.conn.pool())
                    .await
                    .map_err(|e| db_error("list workorders", e))
            })
            .await?;

        rows.iter().map(work_order_from_row).collect()
    }

    async fn get(&self, ctx: &RequestContext, id: &WorkOrderId) -> PortResult<WorkOrder> {
        let query = format!("SELECT {WORK_ORDER_COLUMNS} FROM workorders WHERE id = $1");
        let row = ctx
            .run(async {
                sqlx::query(&query)
                    .bind(id.as_str())
                    .fetch_optional(self.conn.pool())
                    .await
                    .map_err(|e| db_error("get workorder", e))
            })
            .await?;

        match row {
            Some(row) => work_order_from_row(&row),
            None => Err(PortError::not_found(AggregateKind::WorkOrder, id.as_str())),
        }
    }

    async fn create(&self, ctx: &RequestContext, work_order: WorkOrder) -> PortResult<WorkOrder> {
        let query = format!(
            "INSERT INTO workorders ({WORK_ORDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {WORK_ORDER_COLUMNS}"
        );
        let row = ctx
            .run(async {
                sqlx::query(&query)
                    .bind(work_order.id.as_str())
                    .bind(work_order.flow_id.as_str())
                    .bind(&work_order.title)
                    .bind(&work_order.assignee)
                    .bind(work_order.status.as_str())
                    .bind(&work_order.payload)
                    .bind(Json(&work_order.metadata))
                    .bind(work_order.created_at)
                    .bind(work_order.updated_at)
                    .fetch_one(self.conn.pool())
                    .await
                    .map_err(|e| db_error("insert workorder", e))
            })
            .await?;

        debug!(work_order_id = %work_order.id, "Inserted workorder row");
        work_order_from_row(&row)
    }

    async fn update_status(
        &self,
        ctx: &RequestContext,
        id: &WorkOrderId,
        status: WorkOrderStatus,
        updated_at: DateTime<Utc>,
    ) -> PortResult<WorkOrder> {
        let query = format!(
            "UPDATE workorders SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {WORK_ORDER_COLUMNS}"
        );
        let row = ctx
            .run(async {
                sqlx::query(&query)
                    .bind(id.as_str())
                    .bind(status.as_str())
                    .bind(updated_at)
                    .fetch_optional(self.conn.pool())
                    .await
                    .map_err(|e| db_error("update workorder status", e))
            })
            .await?;

        match row {
            Some(row) => work_order_from_row(&row),
            None => Err(PortError::not_found(AggregateKind::WorkOrder, id.as_str())),
        }
    }
}
