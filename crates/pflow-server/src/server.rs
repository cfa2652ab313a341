//! HTTP server

use pflow_core::{FlowService, RequestContext, WorkOrderService};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api;
use crate::error::ServerResult;

/// Main server implementation
pub struct PflowServer {
    flows: FlowService,
    work_orders: WorkOrderService,
    request_timeout: Duration,
    shutdown: CancellationToken,
}

impl PflowServer {
    /// Create a server over the two services
    pub fn new(flows: FlowService, work_orders: WorkOrderService, request_timeout: Duration) -> Self {
        Self {
            flows,
            work_orders,
            request_timeout,
            shutdown: CancellationToken::new(),
        }
    }

    /// Flow service
    pub fn flows(&self) -> &FlowService {
        &self.flows
    }

    /// Work order service
    pub fn work_orders(&self) -> &WorkOrderService {
        &self.work_orders
    }

    /// Fresh context for one request, expiring after the configured timeout
    pub fn request_context(&self) -> RequestContext {
        RequestContext::new().with_timeout(self.request_timeout)
    }

    /// Cancelling this token stops the server gracefully
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Serve on `listener` until a shutdown signal arrives
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> ServerResult<()> {
        let shutdown = self.shutdown.clone();
        let app = api::build_router(self);

        info!(address = %listener.local_addr()?, "Pflow server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        info!("Pflow server stopped");
        Ok(())
    }

    /// Bind `address` and serve
    pub async fn run(self: Arc<Self>, address: &str) -> ServerResult<()> {
        let listener = TcpListener::bind(address).await?;
        self.serve(listener).await
    }
}

async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl-c, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
        _ = token.cancelled() => info!("Shutdown requested"),
    }
}
