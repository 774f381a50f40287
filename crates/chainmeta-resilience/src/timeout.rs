//! Timeout utilities for RPC and store round trips.

use std::future::Future;
use std::time::Duration;

use chainmeta_error::{ChainMetaError, Result};
use tokio::time::{timeout, Instant};

/// Execute a fallible future with a timeout.
///
/// Elapsed timeouts surface as [`ChainMetaError::Timeout`].
pub async fn with_timeout<T>(
    duration: Duration,
    operation: impl Into<String>,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(ChainMetaError::Timeout {
            operation: operation.into(),
            millis: duration.as_millis() as u64,
        }),
    }
}

/// Deadline tracking for operations made of several round trips
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    timeout: Duration,
}

impl Deadline {
    /// Create a new deadline starting now
    pub fn new(timeout: Duration) -> Self {
        Self {
            start: Instant::now(),
            timeout,
        }
    }

    /// Check if deadline has passed
    pub fn is_expired(&self) -> bool {
        self.start.elapsed() >= self.timeout
    }

    /// Get remaining time
    pub fn remaining(&self) -> Duration {
        self.timeout.saturating_sub(self.start.elapsed())
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Total budget this deadline was created with
    pub fn budget(&self) -> Duration {
        self.timeout
    }

    /// Execute with remaining time as timeout
    pub async fn execute<T>(
        &self,
        operation: &str,
        future: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let expired = || ChainMetaError::Timeout {
            operation: operation.to_string(),
            millis: self.timeout.as_millis() as u64,
        };
        if self.is_expired() {
            return Err(expired());
        }

        match timeout(self.remaining(), future).await {
            Ok(result) => result,
            Err(_) => Err(expired()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainmeta_error::ErrorKind;

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_elapses() {
        let result: Result<()> = with_timeout(Duration::from_millis(50), "slow", async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(())
        })
        .await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.to_string().contains("slow"));
    }

    #[tokio::test]
    async fn test_with_timeout_passes_inner_error() {
        let result: Result<()> = with_timeout(Duration::from_secs(1), "fast", async {
            Err(ChainMetaError::AccountNotFound("abc".into()))
        })
        .await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expiry() {
        let deadline = Deadline::new(Duration::from_millis(100));
        assert!(!deadline.is_expired());
        tokio::time::advance(Duration::from_millis(150)).await;
        assert!(deadline.is_expired());
        assert_eq!(deadline.remaining(), Duration::ZERO);

        let result = deadline.execute("late", async { Ok(1u8) }).await;
        assert!(matches!(result, Err(ChainMetaError::Timeout { .. })));
    }
}
