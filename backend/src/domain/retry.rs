//! Bounded timeout and retry policy for storage calls.
//!
//! Every call to a backing store runs under a per-attempt timeout. Transient
//! failures are retried with jittered exponential backoff up to a fixed
//! number of attempts. Only idempotent operations are ever repeated. A
//! non-idempotent insert that times out or loses its connection may already
//! have committed, and running it again would collide with its own row, so
//! such calls stop after the first attempt with an unknown outcome.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::warn;

use crate::domain::Error;
use crate::domain::ports::{PictureStoreError, UserRepositoryError};

/// Timeout and retry limits applied to storage calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound for a single attempt.
    pub attempt_timeout: Duration,
    /// Maximum attempts per call (including the first).
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Cap on the exponential delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(5),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Exponential delay preceding attempt `attempt + 1`, before jitter.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use profile_registry::domain::RetryPolicy;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.base_delay(1), Duration::from_millis(100));
    /// assert_eq!(policy.base_delay(2), Duration::from_millis(200));
    /// assert_eq!(policy.base_delay(10), Duration::from_secs(2));
    /// ```
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }
}

/// Whether repeating a call is safe when its outcome is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idempotency {
    /// Repeating the call leaves the store in the same state.
    Idempotent,
    /// Repeating the call may write twice, e.g. an insert.
    NonIdempotent,
}

/// Port errors that distinguish transient connectivity failures.
pub trait TransientError {
    /// `true` when retrying the same call may succeed.
    fn is_transient(&self) -> bool;
}

impl TransientError for UserRepositoryError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

impl TransientError for PictureStoreError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Outcome of a storage call that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageFailure<E> {
    /// The store answered with a non-transient error.
    Rejected(E),
    /// The store could not be reached within the retry budget, or a
    /// non-idempotent call failed transiently with an unknown outcome.
    Unavailable {
        /// Port operation label, e.g. `users.insert`.
        operation: &'static str,
        /// Attempts made before giving up.
        attempts: u32,
        /// Last transient error or timeout description.
        reason: String,
    },
}

impl<E: fmt::Display> StorageFailure<E> {
    /// Map into a domain error; `rejected` handles non-transient store errors.
    #[must_use]
    pub fn into_domain_error(self, rejected: impl FnOnce(E) -> Error) -> Error {
        match self {
            Self::Rejected(error) => rejected(error),
            Self::Unavailable {
                operation,
                attempts,
                reason,
            } => Error::service_unavailable(format!(
                "storage unavailable during {operation} after {attempts} attempt(s): {reason}"
            )),
        }
    }
}

impl<E: fmt::Display> fmt::Display for StorageFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(error) => write!(f, "{error}"),
            Self::Unavailable {
                operation,
                attempts,
                reason,
            } => write!(f, "{operation} unavailable after {attempts} attempt(s): {reason}"),
        }
    }
}

/// Async sleeping abstraction so tests can observe backoff without waiting.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Retry backoff jitter abstraction.
pub trait BackoffJitter: Send + Sync {
    /// Return a jittered delay derived from the exponential base delay.
    fn jittered_delay(&self, base: Duration, attempt: u32) -> Duration;
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl RetrySleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Adds up to a quarter of the base delay, drawn uniformly at random.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl BackoffJitter for RandomJitter {
    fn jittered_delay(&self, base: Duration, _attempt: u32) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let max_extra = base_ms >> 2;
        let extra = rand::thread_rng().gen_range(0..=max_extra);
        Duration::from_millis(base_ms.saturating_add(extra))
    }
}

/// Runtime helpers used by [`StorageRetry`].
#[derive(Clone)]
pub struct RetryRuntime {
    /// Sleeps between attempts.
    pub sleeper: Arc<dyn RetrySleeper>,
    /// Spreads retry delays.
    pub jitter: Arc<dyn BackoffJitter>,
}

impl Default for RetryRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(RandomJitter),
        }
    }
}

/// Executes storage calls under [`RetryPolicy`].
#[derive(Clone)]
pub struct StorageRetry {
    policy: RetryPolicy,
    sleeper: Arc<dyn RetrySleeper>,
    jitter: Arc<dyn BackoffJitter>,
}

impl StorageRetry {
    /// Build a retrier using Tokio sleeping and random jitter.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_runtime(policy, RetryRuntime::default())
    }

    /// Build a retrier with injected runtime abstractions.
    #[must_use]
    pub fn with_runtime(policy: RetryPolicy, runtime: RetryRuntime) -> Self {
        Self {
            policy,
            sleeper: runtime.sleeper,
            jitter: runtime.jitter,
        }
    }

    /// Run `call` until it succeeds, fails permanently, or the retry budget is
    /// spent.
    ///
    /// A [`Idempotency::NonIdempotent`] call is attempted once. Any transient
    /// failure then yields [`StorageFailure::Unavailable`] because the store
    /// may already have applied it.
    pub async fn run<T, E, F, Fut>(
        &self,
        operation: &'static str,
        idempotency: Idempotency,
        mut call: F,
    ) -> Result<T, StorageFailure<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: TransientError + fmt::Display,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let timeout_ms = u64::try_from(self.policy.attempt_timeout.as_millis()).unwrap_or(u64::MAX);

        for attempt in 1..=max_attempts {
            let reason = match tokio::time::timeout(self.policy.attempt_timeout, call()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(error)) if !error.is_transient() => {
                    return Err(StorageFailure::Rejected(error));
                }
                Ok(Err(error)) => error.to_string(),
                Err(_elapsed) => format!("timed out after {timeout_ms} ms"),
            };

            if idempotency == Idempotency::NonIdempotent {
                warn!(
                    operation,
                    attempt,
                    error = %reason,
                    "non-idempotent storage call failed with unknown outcome; not retrying"
                );
                return Err(StorageFailure::Unavailable {
                    operation,
                    attempts: attempt,
                    reason: format!("{reason} (outcome unknown)"),
                });
            }

            if attempt == max_attempts {
                warn!(operation, attempt, error = %reason, "storage retries exhausted");
                return Err(StorageFailure::Unavailable {
                    operation,
                    attempts: attempt,
                    reason,
                });
            }

            let delay = self
                .jitter
                .jittered_delay(self.policy.base_delay(attempt), attempt);
            warn!(
                operation,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %reason,
                "transient storage failure; retrying"
            );
            self.sleeper.sleep(delay).await;
        }

        Err(StorageFailure::Unavailable {
            operation,
            attempts: max_attempts,
            reason: "retry loop ended without an outcome".to_owned(),
        })
    }
}
