use std::fmt;
use thiserror::Error;

/// Kind of aggregate an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    /// A flow definition
    Flow,
    /// A work order
    WorkOrder,
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateKind::Flow => write!(f, "flow"),
            AggregateKind::WorkOrder => write!(f, "workorder"),
        }
    }
}

/// The collaborator call a [`PflowError::Dependency`] failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Listing aggregates from the repository
    List,
    /// Loading a single aggregate from the repository
    Load,
    /// Writing an aggregate to the repository
    Persist,
    /// Resolving the flow a work order references
    LoadFlow,
    /// Deploying a flow definition to the remote engine
    Deploy,
    /// Starting a process instance on the remote engine
    Start,
    /// Asking the remote engine to retry a process instance
    Retry,
    /// Publishing a lifecycle event
    Publish,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::List => "list",
            Step::Load => "load",
            Step::Persist => "persist",
            Step::LoadFlow => "load flow",
            Step::Deploy => "deploy",
            Step::Start => "start process",
            Step::Retry => "retry process",
            Step::Publish => "publish",
        };
        f.write_str(name)
    }
}

/// Error returned by port implementations (stores, engine client, event bus)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    /// The requested aggregate does not exist in the collaborator
    #[error("{kind} {id} not found")]
    NotFound {
        /// Aggregate kind
        kind: AggregateKind,
        /// Aggregate id
        id: String,
    },

    /// The request context was cancelled before or during the call
    #[error("operation cancelled")]
    Cancelled,

    /// The request context deadline passed before or during the call
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Store failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Encoding or decoding failure
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Network or broker failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote engine answered with an error status
    #[error("remote engine responded with status {status}: {body}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },
}

impl PortError {
    /// Build a not-found signal for the given aggregate
    pub fn not_found(kind: AggregateKind, id: impl Into<String>) -> Self {
        PortError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Whether this is the not-found signal
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }
}

impl From<serde_json::Error> for PortError {
    fn from(err: serde_json::Error) -> Self {
        PortError::Serialization(err.to_string())
    }
}

/// Result type for port calls
pub type PortResult<T> = Result<T, PortError>;

/// Error returned by the application services
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PflowError {
    /// Caller input violates a precondition
    #[error("validation error: {0}")]
    Validation(String),

    /// The requested aggregate does not exist
    #[error("{kind} {id} not found")]
    NotFound {
        /// Aggregate kind
        kind: AggregateKind,
        /// Aggregate id
        id: String,
    },

    /// A collaborator failed
    #[error("{step} failed: {source}")]
    Dependency {
        /// The step that failed
        step: Step,
        /// Underlying cause
        #[source]
        source: PortError,
    },
}

impl PflowError {
    /// Build a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PflowError::Validation(message.into())
    }

    /// Build a not-found error
    pub fn not_found(kind: AggregateKind, id: impl Into<String>) -> Self {
        PflowError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Wrap a port failure with the step it happened in
    pub fn dependency(step: Step, source: PortError) -> Self {
        PflowError::Dependency { step, source }
    }

    /// Whether the requested aggregate itself is missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, PflowError::NotFound { .. })
    }

    /// Whether caller input was rejected
    pub fn is_validation(&self) -> bool {
        matches!(self, PflowError::Validation(_))
    }

    /// The failing step, for dependency errors
    pub fn step(&self) -> Option<Step> {
        match self {
            PflowError::Dependency { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// A referenced aggregate that turned out to be missing, e.g. the flow
    /// named by a work order being created
    pub fn missing_reference(&self) -> Option<(AggregateKind, &str)> {
        match self {
            PflowError::Dependency {
                source: PortError::NotFound { kind, id },
                ..
            } => Some((*kind, id.as_str())),
            _ => None,
        }
    }
}

/// Result type for service operations
pub type PflowResult<T> = Result<T, PflowError>;
