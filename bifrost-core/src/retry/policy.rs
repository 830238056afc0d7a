//! Retry policy: attempt budget, backoff wait, and failure classification
//!
//! Policies are built once, immutable thereafter, and shared read-only by
//! every call that resolves to them.

use crate::transport::TransportError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

type RetryPredicate = Arc<dyn Fn(&TransportError) -> bool + Send + Sync>;

/// Retry policy for one call identifier
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_wait: Duration,
    predicate: RetryPredicate,
}

impl RetryPolicy {
    /// Create a policy with the default failure classification
    /// (`TransportError::is_retryable`). `max_attempts` is clamped to >= 1.
    pub fn new(max_attempts: u32, base_wait: Duration) -> Self {
        Self::with_predicate(max_attempts, base_wait, TransportError::is_retryable)
    }

    /// Create a policy with a custom retry predicate
    pub fn with_predicate(
        max_attempts: u32,
        base_wait: Duration,
        predicate: impl Fn(&TransportError) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_wait,
            predicate: Arc::new(predicate),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_wait(&self) -> Duration {
        self.base_wait
    }

    /// Whether this policy considers the error worth another attempt
    pub fn should_retry(&self, error: &TransportError) -> bool {
        (self.predicate)(error)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_wait", &self.base_wait)
            .finish()
    }
}

/// Wait before the next attempt for a retryable error.
///
/// The rate-limit-reset hint is defined in whole seconds and converted with
/// `Duration::from_secs`. A zero or absent hint falls back to the policy's
/// base wait, never to a zero wait.
pub fn retry_wait(error: &TransportError, base_wait: Duration) -> Duration {
    match error.ratelimit_reset {
        Some(seconds) if seconds > 0 => Duration::from_secs(seconds),
        _ => base_wait,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{StatusCode, RETRYABLE_INTERNAL_APP_CODE};

    #[test]
    fn test_max_attempts_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::from_millis(100));
        assert_eq!(policy.max_attempts(), 1);
    }

    #[test]
    fn test_default_predicate_uses_classification() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));

        assert!(policy.should_retry(&TransportError::new(StatusCode::Unavailable)));
        assert!(policy.should_retry(&TransportError::new(StatusCode::ResourceExhausted)));
        assert!(policy.should_retry(
            &TransportError::new(StatusCode::Internal).with_app_code(RETRYABLE_INTERNAL_APP_CODE)
        ));
        assert!(!policy.should_retry(&TransportError::new(StatusCode::Internal)));
        assert!(!policy.should_retry(&TransportError::new(StatusCode::InvalidArgument)));
    }

    #[test]
    fn test_custom_predicate() {
        let policy = RetryPolicy::with_predicate(3, Duration::from_millis(100), |e| {
            e.code == StatusCode::NotFound
        });
        assert!(policy.should_retry(&TransportError::new(StatusCode::NotFound)));
        assert!(!policy.should_retry(&TransportError::new(StatusCode::Unavailable)));
    }

    #[test]
    fn test_retry_wait_uses_hint_seconds() {
        let base = Duration::from_millis(100);
        let err = TransportError::new(StatusCode::ResourceExhausted).with_ratelimit_reset(5);
        assert_eq!(retry_wait(&err, base), Duration::from_secs(5));
    }

    #[test]
    fn test_retry_wait_zero_hint_falls_back() {
        let base = Duration::from_millis(100);
        let err = TransportError::new(StatusCode::ResourceExhausted).with_ratelimit_reset(0);
        assert_eq!(retry_wait(&err, base), base);
    }

    #[test]
    fn test_retry_wait_absent_hint_falls_back() {
        let base = Duration::from_millis(100);
        let err = TransportError::new(StatusCode::Unavailable);
        assert_eq!(retry_wait(&err, base), base);
    }
}
