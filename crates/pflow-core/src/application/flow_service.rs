use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::application::ports::{Deployer, EventPublisher};
use crate::context::RequestContext;
use crate::domain::flow::{Flow, FlowId};
use crate::domain::repository::FlowRepository;
use crate::domain::{utc_now, utc_now_after};
use crate::error::{AggregateKind, PflowError, PflowResult, PortError, Step};

/// Input for [`FlowService::create`]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlowInput {
    /// Flow name; must not be blank
    #[serde(default)]
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Process definition; must be present
    #[serde(default)]
    pub definition: Value,
    /// Optional metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Input for [`FlowService::update`]
#[derive(Debug, Clone)]
pub struct UpdateFlowInput {
    /// Flow to update
    pub id: FlowId,
    /// New description
    pub description: Option<String>,
    /// New process definition; must be present
    pub definition: Value,
    /// New metadata
    pub metadata: HashMap<String, String>,
}

/// Service for managing flows
///
/// Each write persists first, then deploys to the engine, then publishes.
/// A failure in a later step is returned to the caller but the earlier
/// steps are not undone.
#[derive(Clone)]
pub struct FlowService {
    repo: Arc<dyn FlowRepository>,
    deployer: Option<Arc<dyn Deployer>>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl FlowService {
    /// Create a flow service with no deployer and no publisher
    pub fn new(repo: Arc<dyn FlowRepository>) -> Self {
        Self {
            repo,
            deployer: None,
            publisher: None,
        }
    }

    /// Deploy every created or updated flow through `deployer`
    pub fn with_deployer(mut self, deployer: Arc<dyn Deployer>) -> Self {
        self.deployer = Some(deployer);
        self
    }

    /// Publish lifecycle events through `publisher`
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// All flows, most recently updated first
    pub async fn list(&self, ctx: &RequestContext) -> PflowResult<Vec<Flow>> {
        self.repo
            .list(ctx)
            .await
            .map_err(|e| PflowError::dependency(Step::List, e))
    }

    /// Create, deploy and announce a new flow
    pub async fn create(&self, ctx: &RequestContext, input: CreateFlowInput) -> PflowResult<Flow> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(PflowError::validation("name is required"));
        }
        if input.definition.is_null() {
            return Err(PflowError::validation("definition is required"));
        }

        let flow = Flow::new(name, input.description, input.definition, input.metadata, utc_now());
        let flow = self
            .repo
            .create(ctx, flow)
            .await
            .map_err(|e| PflowError::dependency(Step::Persist, e))?;

        tracing::debug!(flow_id = %flow.id, "Flow persisted");

        self.deploy(ctx, &flow).await?;

        if let Some(publisher) = &self.publisher {
            ctx.check()
                .map_err(|e| PflowError::dependency(Step::Publish, e))?;
            publisher
                .publish_flow_created(ctx, &flow)
                .await
                .map_err(|e| PflowError::dependency(Step::Publish, e))?;
        }

        tracing::info!(flow_id = %flow.id, name = %flow.name, "Flow created");
        Ok(flow)
    }

    /// Find a flow by id
    pub async fn get(&self, ctx: &RequestContext, id: &FlowId) -> PflowResult<Flow> {
        self.repo.get(ctx, id).await.map_err(|e| load_error(id, e))
    }

    /// Replace a flow's description, definition and metadata, then redeploy and announce it
    pub async fn update(&self, ctx: &RequestContext, input: UpdateFlowInput) -> PflowResult<Flow> {
        if input.definition.is_null() {
            return Err(PflowError::validation("definition is required"));
        }

        let mut flow = self.get(ctx, &input.id).await?;
        let previous_version = flow.version;
        let updated_at = utc_now_after(flow.updated_at);
        flow.revise(input.description, input.definition, input.metadata, updated_at);

        let flow = self.repo.update(ctx, flow).await.map_err(|e| match e {
            PortError::NotFound { .. } => PflowError::not_found(AggregateKind::Flow, input.id.as_str()),
            other => PflowError::dependency(Step::Persist, other),
        })?;

        self.deploy(ctx, &flow).await?;

        if let Some(publisher) = &self.publisher {
            ctx.check()
                .map_err(|e| PflowError::dependency(Step::Publish, e))?;
            publisher
                .publish_flow_updated(ctx, &flow)
                .await
                .map_err(|e| PflowError::dependency(Step::Publish, e))?;
        }

        tracing::info!(
            flow_id = %flow.id,
            from_version = previous_version,
            to_version = flow.version,
            "Flow updated"
        );
        Ok(flow)
    }

    async fn deploy(&self, ctx: &RequestContext, flow: &Flow) -> PflowResult<()> {
        let Some(deployer) = &self.deployer else {
            return Ok(());
        };

        ctx.check()
            .map_err(|e| PflowError::dependency(Step::Deploy, e))?;
        deployer.deploy(ctx, flow).await.map_err(|e| {
            tracing::warn!(flow_id = %flow.id, step = %Step::Deploy, error = %e, "Flow stored but not deployed");
            PflowError::dependency(Step::Deploy, e)
        })
    }
}

fn load_error(id: &FlowId, err: PortError) -> PflowError {
    match err {
        PortError::NotFound { .. } => PflowError::not_found(AggregateKind::Flow, id.as_str()),
        other => PflowError::dependency(Step::Load, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockDeployer, MockEventPublisher};
    use crate::domain::repository::memory::MemoryFlowRepository;
    use std::sync::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn create_input(name: &str) -> CreateFlowInput {
        CreateFlowInput {
            name: name.to_string(),
            description: Some("invoice approval".into()),
            definition: json!({"bpmn": "<definitions/>"}),
            metadata: HashMap::from([("team".to_string(), "finance".to_string())]),
        }
    }

    #[tokio::test]
    async fn test_create_deploys_then_publishes() {
        let repo = Arc::new(MemoryFlowRepository::new());
        let calls = Arc::new(Mutex::new(Vec::new()));

        let mut deployer = MockDeployer::new();
        let deploy_calls = calls.clone();
        deployer
            .expect_deploy()
            .withf(|_, flow| flow.version == 1 && flow.name == "Approve Invoice")
            .times(1)
            .returning(move |_, _| {
                deploy_calls.lock().unwrap().push("deploy");
                Ok(())
            });

        let mut publisher = MockEventPublisher::new();
        let publish_calls = calls.clone();
        publisher
            .expect_publish_flow_created()
            .times(1)
            .returning(move |_, _| {
                publish_calls.lock().unwrap().push("publish");
                Ok(())
            });

        let service = FlowService::new(repo.clone())
            .with_deployer(Arc::new(deployer))
            .with_publisher(Arc::new(publisher));

        let ctx = RequestContext::new();
        let flow = service.create(&ctx, create_input("Approve Invoice")).await.unwrap();

        assert_eq!(flow.version, 1);
        assert_eq!(flow.created_at, flow.updated_at);
        assert_eq!(*calls.lock().unwrap(), vec!["deploy", "publish"]);
        assert_eq!(service.get(&ctx, &flow.id).await.unwrap(), flow);
    }

    #[tokio::test]
    async fn test_create_trims_name() {
        let service = FlowService::new(Arc::new(MemoryFlowRepository::new()));
        let flow = service
            .create(&RequestContext::new(), create_input("  Approve Invoice  "))
            .await
            .unwrap();
        assert_eq!(flow.name, "Approve Invoice");
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name_without_collaborator_calls() {
        let repo = Arc::new(MemoryFlowRepository::new());
        // Mocks without expectations panic if called
        let service = FlowService::new(repo.clone())
            .with_deployer(Arc::new(MockDeployer::new()))
            .with_publisher(Arc::new(MockEventPublisher::new()));

        let err = service.create(&RequestContext::new(), create_input("   ")).await.unwrap_err();

        assert!(err.is_validation());
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_null_definition() {
        let repo = Arc::new(MemoryFlowRepository::new());
        let service = FlowService::new(repo.clone());
        let mut input = create_input("Approve Invoice");
        input.definition = Value::Null;

        let err = service.create(&RequestContext::new(), input).await.unwrap_err();

        assert_eq!(err, PflowError::validation("definition is required"));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_deploy_failure_keeps_stored_flow_and_skips_publish() {
        let repo = Arc::new(MemoryFlowRepository::new());
        let mut deployer = MockDeployer::new();
        deployer.expect_deploy().times(1).returning(|_, _| {
            Err(PortError::Remote {
                status: 500,
                body: "engine down".into(),
            })
        });

        let service = FlowService::new(repo.clone())
            .with_deployer(Arc::new(deployer))
            .with_publisher(Arc::new(MockEventPublisher::new()));

        let ctx = RequestContext::new();
        let err = service.create(&ctx, create_input("Approve Invoice")).await.unwrap_err();

        assert_eq!(err.step(), Some(Step::Deploy));
        let flows = service.list(&ctx).await.unwrap();
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].name, "Approve Invoice");
    }

    #[tokio::test]
    async fn test_cancellation_during_deploy_skips_publish() {
        let repo = Arc::new(MemoryFlowRepository::new());
        let mut deployer = MockDeployer::new();
        deployer.expect_deploy().times(1).returning(|ctx, _| {
            ctx.cancel();
            Ok(())
        });

        // publisher has no expectations
        let service = FlowService::new(repo.clone())
            .with_deployer(Arc::new(deployer))
            .with_publisher(Arc::new(MockEventPublisher::new()));

        let err = service
            .create(&RequestContext::new(), create_input("Approve Invoice"))
            .await
            .unwrap_err();

        assert_eq!(err, PflowError::dependency(Step::Publish, PortError::Cancelled));
        let flows = service.list(&RequestContext::new()).await.unwrap();
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].name, "Approve Invoice");
    }

    #[tokio::test]
    async fn test_publish_failure_is_surfaced() {
        let repo = Arc::new(MemoryFlowRepository::new());
        let mut publisher = MockEventPublisher::new();
        publisher
            .expect_publish_flow_created()
            .returning(|_, _| Err(PortError::Transport("broker unreachable".into())));

        let service = FlowService::new(repo.clone()).with_publisher(Arc::new(publisher));
        let err = service
            .create(&RequestContext::new(), create_input("Approve Invoice"))
            .await
            .unwrap_err();

        assert_eq!(err.step(), Some(Step::Publish));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_update_bumps_version_and_keeps_name() {
        let repo = Arc::new(MemoryFlowRepository::new());
        let mut publisher = MockEventPublisher::new();
        publisher.expect_publish_flow_created().returning(|_, _| Ok(()));
        publisher
            .expect_publish_flow_updated()
            .withf(|_, flow| flow.version == 2)
            .times(1)
            .returning(|_, _| Ok(()));

        let service = FlowService::new(repo).with_publisher(Arc::new(publisher));
        let ctx = RequestContext::new();
        let created = service.create(&ctx, create_input("Approve Invoice")).await.unwrap();

        let updated = service
            .update(
                &ctx,
                UpdateFlowInput {
                    id: created.id.clone(),
                    description: None,
                    definition: json!({"bpmn": "<definitions v2/>"}),
                    metadata: HashMap::new(),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.version, created.version + 1);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.description, None);
        assert_eq!(updated.definition, json!({"bpmn": "<definitions v2/>"}));
    }

    #[tokio::test]
    async fn test_update_missing_flow_is_not_found() {
        let service = FlowService::new(Arc::new(MemoryFlowRepository::new()))
            .with_deployer(Arc::new(MockDeployer::new()));

        let err = service
            .update(
                &RequestContext::new(),
                UpdateFlowInput {
                    id: FlowId::from("missing"),
                    description: None,
                    definition: json!({}),
                    metadata: HashMap::new(),
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err, PflowError::not_found(AggregateKind::Flow, "missing"));
    }

    #[tokio::test]
    async fn test_cancelled_context_stops_update_before_any_remote_call() {
        let repo = Arc::new(MemoryFlowRepository::new());
        let service = FlowService::new(repo.clone()).with_deployer(Arc::new(MockDeployer::new()));

        let ctx = RequestContext::new();
        let flow = FlowService::new(repo.clone())
            .create(&ctx, create_input("Approve Invoice"))
            .await
            .unwrap();

        ctx.cancel();
        let err = service
            .update(
                &ctx,
                UpdateFlowInput {
                    id: flow.id.clone(),
                    description: None,
                    definition: json!({}),
                    metadata: HashMap::new(),
                },
            )
            .await
            .unwrap_err();

        // the deployer mock has no expectations, so reaching it would panic
        assert_eq!(err, PflowError::dependency(Step::Load, PortError::Cancelled));
    }
}
