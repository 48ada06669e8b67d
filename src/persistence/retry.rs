use std::future::Future;
use std::time::Duration;
use tracing::warn;

use super::{PersistError, StorageError, Table};

/// How often and how patiently a failed transaction is re-run
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max.max(1);
        self
    }

    #[must_use]
    pub fn with_initial_backoff(mut self, duration: Duration) -> Self {
        self.initial_backoff = duration;
        self
    }

    #[must_use]
    pub fn with_max_backoff(mut self, duration: Duration) -> Self {
        self.max_backoff = duration;
        self
    }

    /// Backoff to wait before attempt number `attempt + 1`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    /// `op` must be safe to re-run as a whole.
    pub async fn run<T, F, Fut>(&self, table: Table, mut op: F) -> Result<T, PersistError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(source) if !source.is_transient() => {
                    return Err(PersistError::Permanent { table, source });
                }
                Err(source) if attempt >= max_attempts => {
                    return Err(PersistError::RetriesExhausted {
                        table,
                        attempts: attempt,
                        source,
                    });
                }
                Err(source) => {
                    let wait = self.backoff(attempt);
                    warn!(
                        "Transaction on {} failed (attempt {}/{}): {}. Retrying in {:?}",
                        table, attempt, max_attempts, source, wait
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
