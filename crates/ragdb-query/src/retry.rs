//! Bounded retries with exponential backoff for provider calls.

use std::future::Future;
use std::time::Duration;

use ragdb_core::config::RetrySettings;
use ragdb_core::error::{Error, Result};

/// Which external call is being made; decides the error a timeout becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Embedding,
    Generation,
}

impl CallKind {
    fn timeout_error(self, limit: Duration) -> Error {
        let reason = format!("timed out after {}ms", limit.as_millis());
        match self {
            Self::Embedding => Error::provider(reason),
            Self::Generation => Error::generation(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Per-attempt limit; `None` leaves the call unbounded.
    pub call_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default(), None)
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self { max_retries: 0, base_delay: Duration::ZERO, max_delay: Duration::ZERO, call_timeout: None }
    }

    pub fn from_settings(settings: &RetrySettings, call_timeout: Option<Duration>) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            call_timeout,
        }
    }

    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.call_timeout = Some(limit);
        self
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `op`, retrying only errors that [`Error::is_retryable`] admits.
    pub async fn run<T, F, Fut>(&self, kind: CallKind, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            let outcome = match self.call_timeout {
                Some(limit) => match tokio::time::timeout(limit, op()).await {
                    Ok(result) => result,
                    Err(_) => Err(kind.timeout_error(limit)),
                },
                None => op().await,
            };
            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!("{} failed (attempt {}/{}): {}; retrying in {:?}", label, attempt + 1, self.max_retries + 1, e, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
