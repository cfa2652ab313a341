//! Flow endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use pflow_core::{CreateFlowInput, Flow, FlowId, UpdateFlowInput};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::errors::ApiResult;
use crate::server::PflowServer;

/// Body of `PUT /api/flows/:id`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFlowRequest {
    /// New description
    #[serde(default)]
    pub description: Option<String>,
    /// New definition
    #[serde(default)]
    pub definition: Value,
    /// New metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// `GET /api/flows`
pub async fn list_flows(State(server): State<Arc<PflowServer>>) -> ApiResult<Json<Vec<Flow>>> {
    let ctx = server.request_context();
    Ok(Json(server.flows().list(&ctx).await?))
}

/// `POST /api/flows`
pub async fn create_flow(
    State(server): State<Arc<PflowServer>>,
    payload: Result<Json<CreateFlowInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Flow>)> {
    let Json(input) = payload?;
    let ctx = server.request_context();
    let flow = server.flows().create(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(flow)))
}

/// `GET /api/flows/:id`
pub async fn get_flow(
    State(server): State<Arc<PflowServer>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Flow>> {
    let ctx = server.request_context();
    Ok(Json(server.flows().get(&ctx, &FlowId(id)).await?))
}

/// `PUT /api/flows/:id`
pub async fn update_flow(
    State(server): State<Arc<PflowServer>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateFlowRequest>, JsonRejection>,
) -> ApiResult<Json<Flow>> {
    let Json(request) = payload?;
    let ctx = server.request_context();
    let flow = server
        .flows()
        .update(
            &ctx,
            UpdateFlowInput {
                id: FlowId(id),
                description: request.description,
                definition: request.definition,
                metadata: request.metadata,
            },
        )
        .await?;
    Ok(Json(flow))
}
