//! Request logging middleware

use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, info_span, Instrument};

/// Header carrying the correlation id
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Get correlation ID from headers or generate a new one
pub fn get_correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Run each request inside a span carrying its correlation id, and log the outcome
pub async fn request_span(req: Request, next: Next) -> Response {
    let correlation_id = get_correlation_id(req.headers());
    let span = info_span!(
        "request",
        correlation_id = %correlation_id,
        method = %req.method(),
        uri = %req.uri(),
    );

    async move {
        let started = Instant::now();
        let response = next.run(req).await;
        info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );
        response
    }
    .instrument(span)
    .await
}
