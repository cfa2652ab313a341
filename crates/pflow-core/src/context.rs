//! Request-scoped cancellation and deadline.
//!
//! Every port method receives a [`RequestContext`]. Implementations call
//! [`RequestContext::check`] before doing I/O and wrap the I/O itself in
//! [`RequestContext::run`] so that a cancelled or expired request returns
//! promptly instead of completing and being discarded.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{PortError, PortResult};

/// Cancellation token plus optional deadline for a single request
#[derive(Debug, Clone)]
pub struct RequestContext {
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    /// Create a context that is never cancelled and has no deadline
    pub fn new() -> Self {
        Self {
            cancellation: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Expire the context after `timeout`; an earlier existing deadline wins.
    /// A timeout too large to represent leaves the deadline unchanged.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Expire the context at `deadline`; an earlier existing deadline wins
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    /// Replace the cancellation token with the provided one
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Derive a context that is cancelled whenever this one is, keeping the deadline
    pub fn child(&self) -> Self {
        Self {
            cancellation: self.cancellation.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this context and every child derived from it
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Whether the context has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// The deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline; zero once it has passed
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Fail immediately if the context is cancelled or past its deadline
    pub fn check(&self) -> PortResult<()> {
        if self.cancellation.is_cancelled() {
            return Err(PortError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(PortError::DeadlineExceeded);
            }
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the context is cancelled or expires first
    pub async fn run<T, F>(&self, fut: F) -> PortResult<T>
    where
        F: Future<Output = PortResult<T>>,
    {
        self.check()?;

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(PortError::Cancelled),
            _ = expired => Err(PortError::DeadlineExceeded),
            result = fut => result,
        }
    }
}
