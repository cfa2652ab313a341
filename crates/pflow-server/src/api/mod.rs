//! API module for the Pflow server
//!
//! Routes and handlers for flows, work orders and health.

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub mod errors;
pub mod flows;
pub mod health;
pub mod middleware;
pub mod work_orders;

use crate::server::PflowServer;

/// Build the router for API endpoints
pub fn build_router(server: Arc<PflowServer>) -> Router {
    Router::new()
        // Flows
        .route("/api/flows", get(flows::list_flows).post(flows::create_flow))
        .route("/api/flows/:id", get(flows::get_flow).put(flows::update_flow))
        // Work orders
        .route(
            "/api/workorders",
            get(work_orders::list_work_orders).post(work_orders::create_work_order),
        )
        .route("/api/workorders/:id", get(work_orders::get_work_order))
        .route("/api/workorders/:id/retry", post(work_orders::retry_work_order))
        // Health check
        .route("/health", get(health::health_check))
        .layer(axum_middleware::from_fn(middleware::request_span))
        .with_state(server)
}
