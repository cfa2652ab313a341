//! Observability setup for Pflow services.

use serde::{Deserialize, Serialize};

pub mod logging;

pub use logging::{init_logging, LogExt};

/// Configuration for initializing logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Default `EnvFilter` directive; `RUST_LOG` takes precedence
    pub log_filter: String,

    /// Emit JSON instead of human readable logs
    pub enable_json_logging: bool,

    /// Also write JSON logs to this file, rotated daily
    pub log_file: Option<String>,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: "pflow-backend".to_string(),
            log_filter: "info".to_string(),
            enable_json_logging: false,
            log_file: None,
        }
    }
}
