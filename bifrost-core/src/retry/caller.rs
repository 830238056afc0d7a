//! Resilient unary callers
//!
//! Thin decorators around an arbitrary invocation: resolve the retry policy
//! for the call identifier, invoke, classify failures, wait (rate-limit hint
//! or base wait), re-invoke. The synchronous caller blocks its thread between
//! attempts; the asynchronous caller suspends on the runtime timer instead
//! and resolves exactly once.

use crate::retry::policy::retry_wait;
use crate::retry::registry::RetryPolicyRegistry;
use crate::transport::{MethodRef, TransportError};
use std::future::Future;
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

/// Blocking request/response caller with policy-driven retries
#[derive(Debug, Clone)]
pub struct ResilientUnaryCaller {
    registry: Arc<RetryPolicyRegistry>,
}

impl ResilientUnaryCaller {
    pub fn new(registry: Arc<RetryPolicyRegistry>) -> Self {
        Self { registry }
    }

    /// Execute `invocation` up to the resolved policy's attempt budget.
    ///
    /// A terminal error (non-retryable, or the budget is spent) propagates
    /// immediately with no further waiting.
    pub fn call<T, F>(&self, method: &MethodRef, mut invocation: F) -> Result<T, TransportError>
    where
        F: FnMut() -> Result<T, TransportError>,
    {
        let policy = self.registry.resolve(method);
        let mut attempt: u32 = 1;

        loop {
            match invocation() {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("Call {} succeeded on attempt #{}", method, attempt);
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if attempt >= policy.max_attempts() || !policy.should_retry(&error) {
                        warn!(
                            "Call {} failed terminally on attempt #{}: {}",
                            method, attempt, error
                        );
                        return Err(error);
                    }

                    let wait = retry_wait(&error, policy.base_wait());
                    debug!(
                        "Call {} failed on attempt #{} ({}), retrying in {:?}",
                        method, attempt, error, wait
                    );
                    thread::sleep(wait);
                    attempt += 1;
                }
            }
        }
    }
}

/// Non-blocking counterpart of [`ResilientUnaryCaller`]
///
/// Same retry semantics, but waits are scheduled on the async runtime's timer
/// instead of parking a thread.
#[derive(Debug, Clone)]
pub struct ResilientAsyncUnaryCaller {
    registry: Arc<RetryPolicyRegistry>,
}

impl ResilientAsyncUnaryCaller {
    pub fn new(registry: Arc<RetryPolicyRegistry>) -> Self {
        Self { registry }
    }

    pub async fn call<T, F, Fut>(
        &self,
        method: &MethodRef,
        mut invocation: F,
    ) -> Result<T, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let policy = self.registry.resolve(method);
        let mut attempt: u32 = 1;

        loop {
            match invocation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("Call {} succeeded on attempt #{}", method, attempt);
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if attempt >= policy.max_attempts() || !policy.should_retry(&error) {
                        warn!(
                            "Call {} failed terminally on attempt #{}: {}",
                            method, attempt, error
                        );
                        return Err(error);
                    }

                    let wait = retry_wait(&error, policy.base_wait());
                    debug!(
                        "Call {} failed on attempt #{} ({}), retrying in {:?}",
                        method, attempt, error, wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::retry::policy::RetryPolicy;
    use crate::transport::StatusCode;
    use std::time::Duration;

    fn registry(max_attempts: u32) -> Arc<RetryPolicyRegistry> {
        let registry = RetryPolicyRegistry::builder()
            .with_default_retry_config(RetryPolicy::new(max_attempts, Duration::from_millis(1)))
            .unwrap()
            .build(&RetryConfig::default());
        Arc::new(registry)
    }

    #[test]
    fn test_success_needs_single_attempt() {
        let caller = ResilientUnaryCaller::new(registry(5));
        let method = MethodRef::new("MarketDataService", "GetCandles");

        let mut attempts = 0;
        let result: Result<u32, _> = caller.call(&method, || {
            attempts += 1;
            Ok(42)
        });

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_non_retryable_short_circuits() {
        let caller = ResilientUnaryCaller::new(registry(5));
        let method = MethodRef::new("MarketDataService", "GetCandles");

        let mut attempts = 0;
        let result: Result<u32, _> = caller.call(&method, || {
            attempts += 1;
            Err(TransportError::new(StatusCode::InvalidArgument))
        });

        assert_eq!(result.unwrap_err().code, StatusCode::InvalidArgument);
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_exhaustion_returns_last_error() {
        let caller = ResilientUnaryCaller::new(registry(3));
        let method = MethodRef::new("MarketDataService", "GetCandles");

        let mut attempts = 0;
        let result: Result<u32, _> = caller.call(&method, || {
            attempts += 1;
            Err(TransportError::new(StatusCode::Unavailable).with_message(format!("try {}", attempts)))
        });

        let error = result.unwrap_err();
        assert_eq!(attempts, 3);
        assert_eq!(error.code, StatusCode::Unavailable);
        assert_eq!(error.message.as_deref(), Some("try 3"));
    }
}
