//! Work order endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use pflow_core::{CreateWorkOrderInput, WorkOrder, WorkOrderId};
use std::sync::Arc;

use crate::api::errors::ApiResult;
use crate::server::PflowServer;

/// `GET /api/workorders`
pub async fn list_work_orders(State(server): State<Arc<PflowServer>>) -> ApiResult<Json<Vec<WorkOrder>>> {
    let ctx = server.request_context();
    Ok(Json(server.work_orders().list(&ctx).await?))
}

/// `POST /api/workorders`
pub async fn create_work_order(
    State(server): State<Arc<PflowServer>>,
    payload: Result<Json<CreateWorkOrderInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<WorkOrder>)> {
    let Json(input) = payload?;
    let ctx = server.request_context();
    let work_order = server.work_orders().create(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(work_order)))
}

/// `GET /api/workorders/:id`
pub async fn get_work_order(
    State(server): State<Arc<PflowServer>>,
    Path(id): Path<String>,
) -> ApiResult<Json<WorkOrder>> {
    let ctx = server.request_context();
    Ok(Json(server.work_orders().get(&ctx, &WorkOrderId(id)).await?))
}

/// `POST /api/workorders/:id/retry`
pub async fn retry_work_order(
    State(server): State<Arc<PflowServer>>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<WorkOrder>)> {
    let ctx = server.request_context();
    let work_order = server.work_orders().retry(&ctx, &WorkOrderId(id)).await?;
    Ok((StatusCode::ACCEPTED, Json(work_order)))
}
