use async_trait::async_trait;

use crate::application::flow_service::FlowService;
use crate::application::ports::FlowLookup;
use crate::context::RequestContext;
use crate::domain::flow::{FlowId, FlowSummary};
use crate::error::{PflowError, PortError, PortResult};

/// [`FlowLookup`] backed by a [`FlowService`]
#[derive(Clone)]
pub struct FlowServiceLookup {
    flows: FlowService,
}

impl FlowServiceLookup {
    /// Wrap a flow service
    pub fn new(flows: FlowService) -> Self {
        Self { flows }
    }
}

#[async_trait]
impl FlowLookup for FlowServiceLookup {
    async fn get(&self, ctx: &RequestContext, id: &FlowId) -> PortResult<FlowSummary> {
        match self.flows.get(ctx, id).await {
            Ok(flow) => Ok(flow.summary()),
            Err(PflowError::NotFound { kind, id }) => Err(PortError::NotFound { kind, id }),
            Err(PflowError::Dependency { source, .. }) => Err(source),
            // get does not validate; keep the message if that ever changes
            Err(PflowError::Validation(message)) => Err(PortError::Storage(message)),
        }
    }
}
