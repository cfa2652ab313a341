//!
//! Pflow Server - HTTP API and composition root
//!
//! Wires the configured store, engine client and event bus into the core
//! services and serves them over HTTP.

use pflow_core::domain::repository::memory::{MemoryFlowRepository, MemoryWorkOrderRepository};
use pflow_core::{
    EventPublisher, FlowRepository, FlowService, FlowServiceLookup, WorkOrderRepository, WorkOrderService,
};
use pflow_engine::EngineClient;
use pflow_events::{BroadcastSink, BusPublisher, EventSink};
use pflow_monitoring::LogExt;
use pflow_state_postgres::PostgresStateStoreProvider;
use std::sync::Arc;
use tracing::info;

/// API module
pub mod api;

/// Configuration module
pub mod config;

/// Error module
pub mod error;

/// Server module
pub mod server;

// Re-export key types
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::PflowServer;

/// Fully wired services
pub struct Services {
    /// Flow service
    pub flows: FlowService,
    /// Work order service
    pub work_orders: WorkOrderService,
    /// In-process event sink, when the queue uses `memory://`
    pub broadcast: Option<BroadcastSink>,
}

/// Run function
pub async fn run(config: ServerConfig) -> ServerResult<()> {
    let services = build_services(&config).await?;
    let server = Arc::new(PflowServer::new(
        services.flows,
        services.work_orders,
        config.http.request_timeout(),
    ));

    server.run(&config.http.bind_address()).await
}

/// Build the store, engine client and event bus from configuration and wire the services
pub async fn build_services(config: &ServerConfig) -> ServerResult<Services> {
    let (flow_repo, work_order_repo) = create_repositories(config).await?;

    let mut flows = FlowService::new(flow_repo);
    let engine = create_engine(config)?;
    if let Some(engine) = &engine {
        flows = flows.with_deployer(engine.clone());
    }

    let (publisher, broadcast) = create_publisher(config)?;
    if let Some(publisher) = &publisher {
        flows = flows.with_publisher(publisher.clone());
    }

    let lookup = Arc::new(FlowServiceLookup::new(flows.clone()));
    let mut work_orders = WorkOrderService::new(work_order_repo, lookup);
    if let Some(engine) = engine {
        work_orders = work_orders.with_runtime(engine);
    }
    if let Some(publisher) = publisher {
        work_orders = work_orders.with_publisher(publisher);
    }

    Ok(Services {
        flows,
        work_orders,
        broadcast,
    })
}

async fn create_repositories(
    config: &ServerConfig,
) -> ServerResult<(Arc<dyn FlowRepository>, Arc<dyn WorkOrderRepository>)> {
    if config.database.is_memory() {
        info!("Using in-memory store");
        return Ok((
            Arc::new(MemoryFlowRepository::new()),
            Arc::new(MemoryWorkOrderRepository::new()),
        ));
    }

    let provider = PostgresStateStoreProvider::with_config(config.database.postgres_config())
        .await
        .log_err("Failed to open PostgreSQL store")
        .map_err(ServerError::state_store)?;
    info!(max_connections = config.database.max_connections, "Using PostgreSQL store");
    Ok(provider.create_repositories())
}

fn create_engine(config: &ServerConfig) -> ServerResult<Option<Arc<EngineClient>>> {
    if !config.engine.enabled {
        info!("Engine integration disabled");
        return Ok(None);
    }

    let client = EngineClient::new(&config.engine.engine_config())
        .map_err(|e| ServerError::EngineError(e.to_string()))?;
    info!(base_url = %config.engine.base_url, "Engine client configured");
    Ok(Some(Arc::new(client)))
}

fn create_publisher(
    config: &ServerConfig,
) -> ServerResult<(Option<Arc<dyn EventPublisher>>, Option<BroadcastSink>)> {
    if !config.queue.enabled {
        info!("Event publishing disabled");
        return Ok((None, None));
    }

    let (sink, broadcast): (Arc<dyn EventSink>, Option<BroadcastSink>) = if config.queue.is_memory() {
        let sink = BroadcastSink::default();
        (Arc::new(sink.clone()), Some(sink))
    } else {
        (create_kafka_sink(config)?, None)
    };

    info!(
        brokers = %config.queue.brokers,
        topic = %config.queue.topic,
        routing_key = %config.queue.routing_key,
        "Event publishing enabled"
    );
    let publisher = BusPublisher::new(sink).with_routing_key(config.queue.routing_key.clone());
    Ok((Some(Arc::new(publisher)), broadcast))
}

#[cfg(feature = "kafka")]
fn create_kafka_sink(config: &ServerConfig) -> ServerResult<Arc<dyn EventSink>> {
    let sink = pflow_events::KafkaSink::new(&config.queue.kafka_config())
        .map_err(|e| ServerError::EventBusError(e.to_string()))?;
    Ok(Arc::new(sink))
}

#[cfg(not(feature = "kafka"))]
fn create_kafka_sink(_config: &ServerConfig) -> ServerResult<Arc<dyn EventSink>> {
    Err(ServerError::EventBusError(
        "built without the kafka feature".to_string(),
    ))
}
