//!
//! Pflow Core - orchestration layer for flows and work orders
//!
//! This crate defines the domain model, the ports every external
//! collaborator is reached through (repositories, the remote engine and the
//! event bus), and the two application services that sequence calls across
//! them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - aggregates, events and repository ports
pub mod domain;

/// Application services - flow and work order orchestration
pub mod application;

/// Per-request cancellation and deadline
pub mod context;

/// Error types
pub mod error;

// Re-export key types
pub use context::RequestContext;
pub use error::{AggregateKind, PflowError, PflowResult, PortError, PortResult, Step};

// Re-export main API types for easy use
pub use domain::events::{EventEnvelope, LifecycleEvent};
pub use domain::flow::{Flow, FlowId, FlowSummary};
pub use domain::repository::{FlowRepository, WorkOrderRepository};
pub use domain::work_order::{WorkOrder, WorkOrderId, WorkOrderStatus};

// Application interfaces
pub use application::flow_lookup::FlowServiceLookup;
pub use application::flow_service::{CreateFlowInput, FlowService, UpdateFlowInput};
pub use application::ports::{Deployer, EventPublisher, FlowLookup, ProcessRuntime};
pub use application::work_order_service::{CreateWorkOrderInput, WorkOrderService};
