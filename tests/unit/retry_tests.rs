/*!
 * Tests for the retry loop around external calls
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use course_localizer::errors::{RetryError, ServiceError, TransientKind};
use course_localizer::translation::{RetryPolicy, ServiceCaller};

use crate::common::RecordingSleeper;

fn caller() -> (ServiceCaller, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let caller = ServiceCaller::with_sleeper(RetryPolicy::new(10, Duration::from_secs(5)), sleeper.clone());
    (caller, sleeper)
}

#[tokio::test]
async fn test_call_withNineTransientFailures_shouldSucceedOnTenthAttempt() {
    let (caller, sleeper) = caller();
    let counter = AtomicUsize::new(0);
    let attempts = &counter;

    let result = caller
        .call(|| async move {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            if n < 9 {
                Err(ServiceError::transient(TransientKind::RateLimit, "429"))
            } else {
                Ok("done")
            }
        })
        .await;

    assert_eq!(result.unwrap(), "done");
    assert_eq!(attempts.load(Ordering::SeqCst), 10);
    assert_eq!(sleeper.calls(), vec![Duration::from_secs(5); 9]);
}

#[tokio::test]
async fn test_call_withOnlyTransientFailures_shouldExhaustWithLastCause() {
    let (caller, sleeper) = caller();
    let counter = AtomicUsize::new(0);
    let attempts = &counter;

    let result: Result<(), RetryError> = caller
        .call(|| async move {
            let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            Err(ServiceError::transient(TransientKind::Timeout, format!("attempt {}", n)))
        })
        .await;

    match result {
        Err(RetryError::Exhausted(exhausted)) => {
            assert_eq!(exhausted.attempts, 10);
            assert_eq!(exhausted.waited, Duration::from_secs(45));
            assert_eq!(
                exhausted.last_cause,
                ServiceError::transient(TransientKind::Timeout, "attempt 10")
            );
        }
        other => panic!("Expected exhaustion, got {:?}", other),
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 10);
    assert_eq!(sleeper.calls().len(), 9);
}

#[tokio::test]
async fn test_call_withFatalError_shouldNotRetry() {
    let (caller, sleeper) = caller();
    let counter = AtomicUsize::new(0);
    let attempts = &counter;

    let result: Result<(), RetryError> = caller
        .call(|| async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(ServiceError::from_status(401, "invalid key"))
        })
        .await;

    assert!(matches!(result, Err(RetryError::Fatal(_))));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(sleeper.calls().is_empty());
}

#[tokio::test]
async fn test_call_withTransientThenFatal_shouldStopAtFatal() {
    let (caller, sleeper) = caller();
    let counter = AtomicUsize::new(0);
    let attempts = &counter;

    let result: Result<(), RetryError> = caller
        .call(|| async move {
            match attempts.fetch_add(1, Ordering::SeqCst) {
                0 | 1 => Err(ServiceError::from_status(503, "unavailable")),
                _ => Err(ServiceError::fatal("bad request")),
            }
        })
        .await;

    assert_eq!(result.unwrap_err().cause(), &ServiceError::fatal("bad request"));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(sleeper.calls().len(), 2);
}

#[tokio::test]
async fn test_call_with_customPolicy_shouldUseItsBudget() {
    let (caller, sleeper) = caller();
    let counter = AtomicUsize::new(0);
    let attempts = &counter;

    let result: Result<(), RetryError> = caller
        .call_with(RetryPolicy::new(3, Duration::from_millis(250)), || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(ServiceError::from_status(429, "slow down"))
        })
        .await;

    assert!(matches!(result, Err(RetryError::Exhausted(ref e)) if e.attempts == 3));
    assert_eq!(sleeper.calls(), vec![Duration::from_millis(250); 2]);
}

#[test]
fn test_policy_new_withZeroRetries_shouldStillAttemptOnce() {
    assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_retries, 1);
    assert_eq!(RetryPolicy::default().max_retries, 10);
    assert_eq!(RetryPolicy::default().retry_delay, Duration::from_secs(5));
}
