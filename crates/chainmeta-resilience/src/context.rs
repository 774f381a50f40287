//! Cancellable execution context threaded through every RPC-bound call.
//!
//! An [`RpcContext`] pairs a [`CancellationToken`] with an optional
//! [`Deadline`]. Each network boundary runs through [`RpcContext::run`], so
//! cancellation and timeouts surface at the await point rather than after
//! the round trip completes.

use std::future::Future;
use std::time::Duration;

use chainmeta_error::{ChainMetaError, Result};
use tokio_util::sync::CancellationToken;

use crate::timeout::Deadline;

/// Caller-supplied execution context for chain-RPC operations.
#[derive(Debug, Clone, Default)]
pub struct RpcContext {
    cancel: CancellationToken,
    deadline: Option<Deadline>,
}

impl RpcContext {
    /// Context with no deadline that is never cancelled unless asked to
    pub fn background() -> Self {
        Self::default()
    }

    /// Context whose deadline starts now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(Deadline::new(timeout)),
        }
    }

    /// Context bound to an externally owned cancellation token
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancel: token,
            deadline: None,
        }
    }

    /// Adds a deadline, keeping the tighter of the existing and new one
    pub fn deadline(mut self, timeout: Duration) -> Self {
        let candidate = Deadline::new(timeout);
        self.deadline = match self.deadline {
            Some(existing) if existing.remaining() <= candidate.remaining() => Some(existing),
            _ => Some(candidate),
        };
        self
    }

    /// Derives a context that is cancelled with this one but can also be
    /// cancelled on its own
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancels this context and every child derived from it
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns true once cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Time left before the deadline, if one is set
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.remaining())
    }

    /// Access to the underlying token, e.g. to hand to a spawned task
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Runs `future` under this context.
    ///
    /// # Errors
    ///
    /// Returns [`ChainMetaError::Cancelled`] if the context is cancelled
    /// first and [`ChainMetaError::Timeout`] if the deadline passes first.
    /// Otherwise returns whatever `future` resolved to.
    pub async fn run<T, F>(&self, operation: &str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(ChainMetaError::Cancelled(operation.to_string()));
        }

        let guarded = async {
            match &self.deadline {
                Some(deadline) => deadline.execute(operation, future).await,
                None => future.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::debug!(operation, "rpc context cancelled");
                Err(ChainMetaError::Cancelled(operation.to_string()))
            }
            result = guarded => result,
        }
    }
}
