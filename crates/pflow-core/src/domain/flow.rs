use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Unique identifier for a flow
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlowId(pub String);

impl FlowId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        FlowId(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FlowId {
    fn from(value: &str) -> Self {
        FlowId(value.to_string())
    }
}

impl From<String> for FlowId {
    fn from(value: String) -> Self {
        FlowId(value)
    }
}

/// A stored, versioned process definition deployable to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    /// Flow id
    pub id: FlowId,
    /// Display name; fixed at creation
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Process definition handed to the engine as-is
    pub definition: Value,
    /// Arbitrary string attributes
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Starts at 1, incremented on every update
    pub version: i32,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl Flow {
    /// A new flow at version 1 with both timestamps set to `now`
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        definition: Value,
        metadata: HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: FlowId::generate(),
            name: name.into(),
            description,
            definition,
            metadata,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the mutable fields and bump the version. The name is left alone.
    pub fn revise(
        &mut self,
        description: Option<String>,
        definition: Value,
        metadata: HashMap<String, String>,
        now: DateTime<Utc>,
    ) {
        self.description = description;
        self.definition = definition;
        self.metadata = metadata;
        self.version += 1;
        self.updated_at = now;
    }

    /// The `{id, name}` projection used by work order creation
    pub fn summary(&self) -> FlowSummary {
        FlowSummary {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// Read-only view of a flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSummary {
    /// Flow id
    pub id: FlowId,
    /// Flow name
    pub name: String,
}
