//! Backoff Caller — bounded retries with exponential delay on rate limiting.
//!
//! Only `LlmError::RateLimited` is retried. Every other failure is logged and
//! returned immediately as `BackoffError::Fatal`. With the default policy the
//! delays are 1s, 2s, 4s, 8s, 16s.
//!
//! The caller holds no shared mutable state: the attempt counter and current
//! delay live on the stack of each `call`, so one `BackoffCaller` can serve
//! any number of concurrent requests.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::llm_client::LlmError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum BackoffError {
    #[error("max retries exceeded after {attempts} rate-limited attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("completion call failed: {0}")]
    Fatal(LlmError),

    #[error("cancelled while calling the completion service")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    /// Delay after the first rate-limited attempt; doubles after each retry.
    pub base_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl BackoffPolicy {
    /// Delay slept after the `retry`-th rate-limited attempt (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Sum of every delay a fully rate-limited call would sleep.
    pub fn worst_case_delay(&self) -> Duration {
        (0..self.max_attempts).fold(Duration::ZERO, |acc, retry| {
            acc.saturating_add(self.delay_for(retry))
        })
    }
}

/// Injectable delay function so tests never wait on a real clock.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

#[derive(Clone)]
pub struct BackoffCaller {
    policy: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl BackoffCaller {
    pub fn new(policy: BackoffPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    pub fn with_tokio_sleep(policy: BackoffPolicy) -> Self {
        Self::new(policy, Arc::new(TokioSleeper))
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Runs `operation` until it succeeds, fails fatally, or the attempt budget
    /// is spent on rate limits.
    ///
    /// `cancel` is checked before every attempt and raced against every sleep.
    pub async fn call<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, BackoffError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut attempt: u32 = 0;
        let mut delay = self.policy.base_delay;

        while attempt < self.policy.max_attempts {
            if cancel.is_cancelled() {
                return Err(BackoffError::Cancelled);
            }
            attempt += 1;

            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_rate_limited() => {
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limit hit, retrying in {:?}...",
                        delay
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(BackoffError::Cancelled),
                        _ = self.sleeper.sleep(delay) => {}
                    }
                    delay = delay.saturating_mul(2);
                }
                Err(e) => {
                    error!("Completion call failed: {e}");
                    return Err(BackoffError::Fatal(e));
                }
            }
        }

        Err(BackoffError::RetriesExhausted { attempts: attempt })
    }
}
