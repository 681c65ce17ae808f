//! End-to-end retry scenarios through the public API
#![cfg(feature = "async")]

use backwater::testing::ScriptedOperation;
use backwater::{
    assert_exhausted, fatal, retry, retry_blocking, retry_with_cancel, BackoffConfig,
    CancellationToken, Failure, Retry, RetryError,
};
use proptest::prelude::*;
use std::time::Duration;

fn exact(initial_ms: u64, retries: u32) -> BackoffConfig {
    BackoffConfig::builder()
        .initial_delay(Duration::from_millis(initial_ms))
        .max_delay(Duration::from_secs(1))
        .jitter_factor(0.0)
        .max_retries(retries)
        .build()
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_k_failures_then_success(k in 0usize..8, extra in 0u32..4) {
        let retries = k as u32 + extra;
        let op = ScriptedOperation::failing_then(k, "transient", "ok");

        let result = paused_runtime().block_on(retry(|| op.call(), &exact(10, retries)));

        prop_assert_eq!(result, Ok("ok"));
        prop_assert_eq!(op.invocations(), k + 1);
        prop_assert_eq!(op.gaps().len(), k);
    }

    #[test]
    fn prop_always_failing_makes_n_plus_one_attempts(n in 0u32..10) {
        let op = ScriptedOperation::<(), _>::always_failing("down");

        let result = paused_runtime().block_on(retry(|| op.call(), &exact(10, n)));

        prop_assert_eq!(result, Err(RetryError::Exhausted { last_error: "down", attempts: n + 1 }));
        prop_assert_eq!(op.invocations(), n as usize + 1);
    }

    #[test]
    fn prop_fatal_on_attempt_j(j in 1usize..8, retries in 0u32..16) {
        let mut script = vec![Err(Failure::Recoverable("soft")); j - 1];
        script.push(Err(fatal("hard")));
        let op = ScriptedOperation::<(), _>::new(script);

        let result = paused_runtime().block_on(retry(|| op.call(), &exact(10, retries)));

        if j as u32 <= retries + 1 {
            prop_assert_eq!(result, Err(RetryError::Fatal("hard")));
            prop_assert_eq!(op.invocations(), j);
        } else {
            // The budget ran out before the fatal attempt was reached.
            prop_assert!(result.unwrap_err().is_exhausted());
            prop_assert_eq!(op.invocations(), retries as usize + 1);
        }
    }

    #[test]
    fn prop_cancellation_bounds_invocations(cancel_after_ms in 0u64..2_000, retries in 0u32..10) {
        let runtime = paused_runtime();
        let op = ScriptedOperation::<(), _>::always_failing("down");
        let token = CancellationToken::new();

        let result = runtime.block_on(async {
            let canceller = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(cancel_after_ms)).await;
                canceller.cancel();
            });
            retry_with_cancel(|| op.call(), &exact(100, retries), &token).await
        });

        prop_assert!(op.invocations() <= retries as usize + 1);
        match result {
            Err(RetryError::Cancelled { attempts }) => {
                prop_assert_eq!(attempts as usize, op.invocations());
            }
            Err(RetryError::Exhausted { last_error, attempts }) => {
                prop_assert_eq!(last_error, "down");
                prop_assert_eq!(attempts, retries + 1);
            }
            other => prop_assert!(false, "unexpected result {:?}", other),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn deadline_exceeded_reported_instead_of_operation_error() {
    let op = ScriptedOperation::<String, _>::always_failing("always fails");

    let result = Retry::new(exact(10, 5))
        .timeout(Duration::from_millis(25))
        .run(|| op.call())
        .await;

    assert!(matches!(result, Err(RetryError::DeadlineExceeded { .. })));
    assert!(op.invocations() >= 1);
    assert!(op.invocations() <= 6);
}

#[tokio::test(start_paused = true)]
async fn constant_preset_waits_the_same_each_time() {
    let op = ScriptedOperation::failing_then(3, "busy", ());

    let config = BackoffConfig::constant(Duration::from_millis(500)).with_max_retries(5);
    let result = retry(|| op.call(), &config).await;

    assert_eq!(result, Ok(()));
    assert_eq!(op.gaps(), vec![Duration::from_millis(500); 3]);
}

#[tokio::test(start_paused = true)]
async fn exhausted_error_displays_last_failure() {
    let op = ScriptedOperation::<(), _>::always_failing("connection refused");

    let err = retry(|| op.call(), &exact(1, 2)).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "retry exhausted after 3 attempts: connection refused"
    );
}

#[test]
fn blocking_driver_exhausts() {
    let op = ScriptedOperation::<(), _>::always_failing("nope");
    let config = BackoffConfig::constant(Duration::from_millis(1)).with_max_retries(2);

    let result = retry_blocking(|| op.call().into_inner(), &config);

    assert_exhausted!(result, "nope", 3);
    assert_eq!(op.invocations(), 3);
}
