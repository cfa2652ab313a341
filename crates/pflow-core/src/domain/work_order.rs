use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::flow::FlowId;

/// Unique identifier for a work order
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkOrderId(pub String);

impl WorkOrderId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        WorkOrderId(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkOrderId {
    fn from(value: &str) -> Self {
        WorkOrderId(value.to_string())
    }
}

impl From<String> for WorkOrderId {
    fn from(value: String) -> Self {
        WorkOrderId(value)
    }
}

/// Work order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkOrderStatus {
    /// Created, not yet picked up
    Pending,
    /// Executing on the engine
    Running,
    /// Execution failed
    Failed,
    /// Execution finished
    Complete,
}

impl WorkOrderStatus {
    /// Wire and storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Pending => "pending",
            WorkOrderStatus::Running => "running",
            WorkOrderStatus::Failed => "failed",
            WorkOrderStatus::Complete => "complete",
        }
    }

    /// Whether the engine has finished with the work order
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkOrderStatus::Failed | WorkOrderStatus::Complete)
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkOrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(WorkOrderStatus::Pending),
            "running" => Ok(WorkOrderStatus::Running),
            "failed" => Ok(WorkOrderStatus::Failed),
            "complete" => Ok(WorkOrderStatus::Complete),
            other => Err(format!("unknown work order status: {other}")),
        }
    }
}

/// One execution instance of a flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    /// Work order id
    pub id: WorkOrderId,
    /// The flow this work order executes
    pub flow_id: FlowId,
    /// Human readable title
    pub title: String,
    /// Who the work order is assigned to
    #[serde(default)]
    pub assignee: Option<String>,
    /// Current status
    pub status: WorkOrderStatus,
    /// Execution variables passed to the engine
    #[serde(default)]
    pub payload: Value,
    /// Arbitrary string attributes
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl WorkOrder {
    /// A new pending work order with both timestamps set to `now`
    pub fn new(
        flow_id: FlowId,
        title: impl Into<String>,
        assignee: Option<String>,
        payload: Value,
        metadata: HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: WorkOrderId::generate(),
            flow_id,
            title: title.into(),
            assignee,
            status: WorkOrderStatus::Pending,
            payload,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }
}
