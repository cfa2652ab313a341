//! Remote workflow engine client
//!
//! Talks to a Camunda 7 style REST API to deploy flow definitions, start
//! process instances and retry external tasks. Implements the
//! [`Deployer`] and [`ProcessRuntime`] ports.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use pflow_core::{Deployer, Flow, FlowId, PortError, PortResult, ProcessRuntime, RequestContext, WorkOrderId};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Engine connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// REST root, e.g. `http://localhost:8081/engine-rest`
    pub base_url: String,
    /// Basic auth user
    pub username: String,
    /// Basic auth password
    pub password: String,
    /// Client-level timeout for every request
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081/engine-rest".to_string(),
            username: "demo".to_string(),
            password: "demo".to_string(),
            timeout_secs: 30,
        }
    }
}

/// HTTP client for the remote engine
#[derive(Debug, Clone)]
pub struct EngineClient {
    base_url: String,
    username: String,
    password: String,
    client: Client,
}

impl EngineClient {
    /// Create a client from configuration
    pub fn new(config: &EngineConfig) -> PortResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PortError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, ctx: &RequestContext, path: &str, body: Option<&Value>) -> PortResult<()> {
        let url = self.endpoint(path);
        let mut request = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = ctx
            .run(async { request.send().await.map_err(transport_error) })
            .await?;

        check_status(ctx, path, response).await
    }
}

fn transport_error(err: reqwest::Error) -> PortError {
    if err.is_timeout() {
        PortError::DeadlineExceeded
    } else {
        PortError::Transport(err.to_string())
    }
}

async fn check_status(ctx: &RequestContext, path: &str, response: Response) -> PortResult<()> {
    let status = response.status();
    if status.is_success() {
        debug!(path, status = status.as_u16(), "Engine call succeeded");
        return Ok(());
    }

    let body = match ctx
        .run(async move { response.text().await.map_err(transport_error) })
        .await
    {
        Ok(body) => body,
        Err(e @ (PortError::Cancelled | PortError::DeadlineExceeded)) => return Err(e),
        Err(e) => {
            warn!(path, status = status.as_u16(), error = %e, "Failed to read engine error body");
            format!("<unreadable body: {}>", e)
        }
    };
    error!(path, status = status.as_u16(), body = %body, "Engine call failed");
    Err(PortError::Remote {
        status: status.as_u16(),
        body,
    })
}

/// Deployment request body for a flow
pub fn deployment_body(flow: &Flow) -> PortResult<Value> {
    let resource = serde_json::to_string(&flow.definition)?;
    Ok(json!({
        "deployment-name": format!("pflow-{}", flow.id),
        "deploy-changed-only": true,
        "resources": {
            format!("{}.bpmn", flow.id): resource,
        },
    }))
}

#[async_trait]
impl Deployer for EngineClient {
    async fn deploy(&self, ctx: &RequestContext, flow: &Flow) -> PortResult<()> {
        let body = deployment_body(flow)?;
        self.post(ctx, "/deployment/create", Some(&body)).await
    }
}

#[async_trait]
impl ProcessRuntime for EngineClient {
    async fn start_process(&self, ctx: &RequestContext, flow_id: &FlowId, payload: &Value) -> PortResult<()> {
        let body = json!({ "variables": payload });
        let path = format!("/process-definition/key/{}/start", flow_id);
        self.post(ctx, &path, Some(&body)).await
    }

    async fn retry_process(&self, ctx: &RequestContext, work_order_id: &WorkOrderId) -> PortResult<()> {
        let path = format!("/external-task/{}/retry", work_order_id);
        self.post(ctx, &path, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pflow_core::domain::utc_now;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // base64("demo:demo")
    const DEMO_AUTH: &str = "Basic ZGVtbzpkZW1v";

    fn create_test_client(mock_server: &MockServer) -> EngineClient {
        EngineClient::new(&EngineConfig {
            base_url: format!("{}/engine-rest/", mock_server.uri()),
            ..Default::default()
        })
        .unwrap()
    }

    fn test_flow() -> Flow {
        let mut flow = Flow::new(
            "Approve Invoice",
            None,
            json!({"bpmn": "<definitions/>"}),
            HashMap::new(),
            utc_now(),
        );
        flow.id = FlowId::from("f-123");
        flow
    }

    #[test]
    fn test_deployment_body_embeds_definition_as_string() {
        let body = deployment_body(&test_flow()).unwrap();
        assert_eq!(
            body,
            json!({
                "deployment-name": "pflow-f-123",
                "deploy-changed-only": true,
                "resources": {"f-123.bpmn": "{\"bpmn\":\"<definitions/>\"}"},
            })
        );
    }

    #[tokio::test]
    async fn test_deploy_posts_deployment() {
        let mock_server = MockServer::start().await;
        let flow = test_flow();

        Mock::given(method("POST"))
            .and(path("/engine-rest/deployment/create"))
            .and(header("authorization", DEMO_AUTH))
            .and(body_json(deployment_body(&flow).unwrap()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "dep-1"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert_eq!(client.deploy(&RequestContext::new(), &flow).await, Ok(()));
    }

    #[tokio::test]
    async fn test_start_process_sends_variables() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/engine-rest/process-definition/key/f-123/start"))
            .and(body_json(json!({"variables": {"amount": 42}})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client
            .start_process(&RequestContext::new(), &FlowId::from("f-123"), &json!({"amount": 42}))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_retry_posts_to_external_task() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/engine-rest/external-task/wo-9/retry"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client
            .retry_process(&RequestContext::new(), &WorkOrderId::from("wo-9"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_error_status_carries_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/engine-rest/deployment/create"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid bpmn"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let err = client.deploy(&RequestContext::new(), &test_flow()).await.unwrap_err();
        assert_eq!(
            err,
            PortError::Remote {
                status: 400,
                body: "invalid bpmn".into()
            }
        );
    }

    #[tokio::test]
    async fn test_error_body_read_respects_context() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("engine exploded"))
            .mount(&mock_server)
            .await;

        let response = reqwest::Client::new()
            .post(format!("{}/engine-rest/deployment/create", mock_server.uri()))
            .send()
            .await
            .unwrap();

        let ctx = RequestContext::new();
        ctx.cancel();
        let err = check_status(&ctx, "/deployment/create", response).await.unwrap_err();
        assert_eq!(err, PortError::Cancelled);
    }

    #[tokio::test]
    async fn test_context_deadline_aborts_slow_engine() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(50));
        let err = client
            .retry_process(&ctx, &WorkOrderId::from("wo-1"))
            .await
            .unwrap_err();
        assert_eq!(err, PortError::DeadlineExceeded);
    }

    #[tokio::test]
    async fn test_cancelled_context_sends_nothing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let ctx = RequestContext::new();
        ctx.cancel();
        let err = client.deploy(&ctx, &test_flow()).await.unwrap_err();
        assert_eq!(err, PortError::Cancelled);
    }
}
