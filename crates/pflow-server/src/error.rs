//! Error types for the Pflow server

use pflow_core::PortError;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The store could not be opened
    #[error("State store error: {0}")]
    StateStoreError(String),

    /// The engine client could not be created
    #[error("Engine error: {0}")]
    EngineError(String),

    /// The event bus could not be opened
    #[error("Event bus error: {0}")]
    EventBusError(String),

    /// Listener or socket failure
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<config::ConfigError> for ServerError {
    fn from(err: config::ConfigError) -> Self {
        ServerError::ConfigError(err.to_string())
    }
}

impl ServerError {
    /// Wrap a store failure
    pub fn state_store(err: PortError) -> Self {
        ServerError::StateStoreError(err.to_string())
    }
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;
