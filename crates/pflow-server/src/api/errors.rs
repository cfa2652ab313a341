//! Error handling for the Pflow API
//!
//! Every error is returned as
//! `{"error": msg, "errorDetails": {"errorCode": ..., "errorMessage": ...}}`.

use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use pflow_core::{PflowError, Step};
use serde_json::json;
use tracing::{error, warn};

/// API error type for returning standard error responses
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),
    /// Service-level failure mapped by [`From<PflowError>`]
    Service(PflowError),
}

impl From<PflowError> for ApiError {
    fn from(err: PflowError) -> Self {
        ApiError::Service(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::Service(err) => write!(f, "{}", err),
        }
    }
}

fn step_code(step: Step) -> &'static str {
    match step {
        Step::List => "ERR_LIST_FAILED",
        Step::Load => "ERR_LOAD_FAILED",
        Step::Persist => "ERR_PERSIST_FAILED",
        Step::LoadFlow => "ERR_LOAD_FLOW_FAILED",
        Step::Deploy => "ERR_DEPLOY_FAILED",
        Step::Start => "ERR_START_PROCESS_FAILED",
        Step::Retry => "ERR_RETRY_PROCESS_FAILED",
        Step::Publish => "ERR_PUBLISH_FAILED",
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, String, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "ERR_BAD_REQUEST".to_string(), msg.clone()),
            ApiError::Service(err) => {
                if let Some((kind, id)) = err.missing_reference() {
                    return (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        format!("ERR_MISSING_{}", kind.to_string().to_uppercase()),
                        format!("referenced {} {} does not exist", kind, id),
                    );
                }
                match err {
                    PflowError::Validation(msg) => (
                        StatusCode::BAD_REQUEST,
                        "ERR_VALIDATION_ERROR".to_string(),
                        msg.clone(),
                    ),
                    PflowError::NotFound { kind, .. } => (
                        StatusCode::NOT_FOUND,
                        format!("ERR_NOT_FOUND_{}", kind.to_string().to_uppercase()),
                        err.to_string(),
                    ),
                    PflowError::Dependency { step, .. } => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        step_code(*step).to_string(),
                        err.to_string(),
                    ),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code, message) = self.parts();

        if status.is_server_error() {
            error!(status = status.as_u16(), error_code = %error_code, "{}", message);
        } else {
            warn!(status = status.as_u16(), error_code = %error_code, "{}", message);
        }

        let body = Json(json!({
            "error": message,
            "errorDetails": {
                "errorCode": error_code,
                "errorMessage": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pflow_core::{AggregateKind, PortError};

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (ApiError::BadRequest("bad json".into()), StatusCode::BAD_REQUEST),
            (PflowError::validation("name is required").into(), StatusCode::BAD_REQUEST),
            (PflowError::not_found(AggregateKind::Flow, "f1").into(), StatusCode::NOT_FOUND),
            (
                PflowError::dependency(Step::LoadFlow, PortError::not_found(AggregateKind::Flow, "f1")).into(),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                PflowError::dependency(Step::LoadFlow, PortError::Storage("down".into())).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                PflowError::dependency(Step::Deploy, PortError::Remote { status: 502, body: "".into() }).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let error: ApiError = error;
            assert_eq!(error.parts().0, expected, "{}", error);
        }
    }

    #[test]
    fn test_error_codes() {
        let err: ApiError = PflowError::not_found(AggregateKind::WorkOrder, "w1").into();
        assert_eq!(err.parts().1, "ERR_NOT_FOUND_WORKORDER");

        let err: ApiError =
            PflowError::dependency(Step::LoadFlow, PortError::not_found(AggregateKind::Flow, "f1")).into();
        let (_, code, message) = err.parts();
        assert_eq!(code, "ERR_MISSING_FLOW");
        assert_eq!(message, "referenced flow f1 does not exist");

        let err: ApiError = PflowError::dependency(Step::Publish, PortError::Cancelled).into();
        assert_eq!(err.parts().1, "ERR_PUBLISH_FAILED");
    }
}
