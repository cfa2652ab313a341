use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::PortResult;

/// Lifecycle events published on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// A flow was created
    FlowCreated,
    /// A flow was updated
    FlowUpdated,
    /// A work order was created
    WorkOrderCreated,
    /// A work order finished
    WorkOrderCompleted,
}

impl LifecycleEvent {
    /// Event name as it appears in the envelope
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::FlowCreated => "flow.created",
            LifecycleEvent::FlowUpdated => "flow.updated",
            LifecycleEvent::WorkOrderCreated => "workorder.created",
            LifecycleEvent::WorkOrderCompleted => "workorder.completed",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{"event": ..., "data": ...}` as sent to the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Event name
    pub event: String,
    /// Entity JSON
    pub data: Value,
}

impl EventEnvelope {
    /// Wrap an entity in an envelope
    pub fn new<T: Serialize>(event: LifecycleEvent, data: &T) -> PortResult<Self> {
        Ok(Self {
            event: event.as_str().to_string(),
            data: serde_json::to_value(data)?,
        })
    }

    /// Encode the envelope as JSON bytes
    pub fn to_bytes(&self) -> PortResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::flow::Flow;
    use crate::domain::utc_now;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_event_names() {
        assert_eq!(LifecycleEvent::FlowCreated.to_string(), "flow.created");
        assert_eq!(LifecycleEvent::FlowUpdated.to_string(), "flow.updated");
        assert_eq!(LifecycleEvent::WorkOrderCreated.to_string(), "workorder.created");
        assert_eq!(LifecycleEvent::WorkOrderCompleted.to_string(), "workorder.completed");
    }

    #[test]
    fn test_envelope_wraps_entity_json() {
        let flow = Flow::new("Approve Invoice", None, json!({"x": 1}), HashMap::new(), utc_now());
        let envelope = EventEnvelope::new(LifecycleEvent::FlowCreated, &flow).unwrap();

        let decoded: Value = serde_json::from_slice(&envelope.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded["event"], json!("flow.created"));
        assert_eq!(decoded["data"]["name"], json!("Approve Invoice"));
        assert_eq!(decoded["data"]["version"], json!(1));
    }
}
