/*!
 * Bounded retry around a single external call.
 *
 * Transient failures (rate limit, timeout, upstream 5xx) are retried after a
 * delay until the attempt budget runs out; anything else is returned on the
 * attempt that produced it. The delay goes through a `Sleeper` so tests can
 * run the loop without waiting.
 */

use async_trait::async_trait;
use log::{debug, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{RetryError, ServiceError, ServiceExhaustedError};

/// Default number of attempts (first call included)
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Default delay between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Delay mechanism used between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock delay
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Attempt budget and delay for one call site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first call included
    pub max_retries: u32,
    /// Wait between two attempts
    pub retry_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            retry_delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY)
    }
}

/// Wraps external calls with classification-driven retry
#[derive(Clone)]
pub struct ServiceCaller {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl ServiceCaller {
    /// Create a caller with the given default policy and real sleeping
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, Arc::new(TokioSleeper))
    }

    /// Create a caller with an injected delay mechanism
    pub fn with_sleeper(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    /// Default policy of this caller
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `operation` under the default policy
    pub async fn call<T, F, Fut>(&self, operation: F) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        self.call_with(self.policy, operation).await
    }

    /// Run `operation` under a call-site specific policy
    pub async fn call_with<T, F, Fut>(&self, policy: RetryPolicy, mut operation: F) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let max_attempts = policy.max_retries.max(1);
        let mut waited = Duration::ZERO;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let error = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("Service call succeeded on attempt {}/{}", attempt, max_attempts);
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !error.is_transient() {
                return Err(RetryError::Fatal(error));
            }

            if attempt >= max_attempts {
                return Err(RetryError::Exhausted(ServiceExhaustedError {
                    attempts: attempt,
                    waited,
                    last_cause: error,
                }));
            }

            warn!(
                "{} - attempt {}/{}, retrying in {:?}",
                error, attempt, max_attempts, policy.retry_delay
            );
            self.sleeper.sleep(policy.retry_delay).await;
            waited += policy.retry_delay;
        }
    }
}

impl Default for ServiceCaller {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}
