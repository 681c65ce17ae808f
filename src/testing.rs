//! Testing utilities for code that retries.
//!
//! This module provides a scripted operation for driving the retry loop
//! deterministically (with the `async` feature), plus assertion macros for
//! delay schedules and retry results.
//!
//! # Examples
//!
//! ## Assertion Macros
//!
//! ```rust
//! use backwater::{assert_delays, BackoffConfig};
//! use std::time::Duration;
//!
//! let config = BackoffConfig::constant(Duration::from_millis(5)).with_max_retries(2);
//! assert_delays!(config, [5, 5]);
//! ```

#[cfg(feature = "async")]
use std::future::{ready, Ready};
#[cfg(feature = "async")]
use std::sync::{Arc, Mutex, PoisonError};
#[cfg(any(feature = "async", feature = "proptest"))]
use std::time::Duration;

#[cfg(feature = "async")]
use tokio::time::Instant;

#[cfg(feature = "async")]
use crate::retry::Failure;

/// An operation that replays a fixed script of results.
///
/// Each invocation returns the next scripted result; once the script runs out
/// the last entry repeats forever. Invocation instants are recorded against
/// tokio's clock, so under a paused runtime the gaps between them are exactly
/// the delays the driver waited.
///
/// Clones share the same script position and history.
///
/// # Example
///
/// ```rust
/// use backwater::testing::ScriptedOperation;
/// use backwater::{retry, BackoffConfig};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// // Fails twice, then succeeds.
/// let op = ScriptedOperation::failing_then(2, "flaky", 42);
/// let config = BackoffConfig::constant(Duration::from_millis(1)).with_max_retries(5);
///
/// assert_eq!(retry(|| op.call(), &config).await, Ok(42));
/// assert_eq!(op.invocations(), 3);
/// # });
/// ```
#[cfg(feature = "async")]
#[derive(Debug, Clone)]
pub struct ScriptedOperation<T, E> {
    script: Arc<Vec<Result<T, Failure<E>>>>,
    calls: Arc<Mutex<Vec<Instant>>>,
}

#[cfg(feature = "async")]
impl<T: Clone, E: Clone> ScriptedOperation<T, E> {
    /// Replay `script` in order. An empty script is not allowed.
    ///
    /// # Panics
    ///
    /// Panics if `script` is empty.
    pub fn new(script: Vec<Result<T, Failure<E>>>) -> Self {
        assert!(!script.is_empty(), "ScriptedOperation needs at least one result");
        Self {
            script: Arc::new(script),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail recoverably `failures` times with `error`, then return `value`.
    pub fn failing_then(failures: usize, error: E, value: T) -> Self {
        let mut script = vec![Err(Failure::Recoverable(error)); failures];
        script.push(Ok(value));
        Self::new(script)
    }

    /// Always fail recoverably with `error`.
    pub fn always_failing(error: E) -> Self {
        Self::new(vec![Err(Failure::Recoverable(error))])
    }

    /// Invoke the operation once.
    pub fn call(&self) -> Ready<Result<T, Failure<E>>> {
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        let index = calls.len().min(self.script.len() - 1);
        calls.push(Instant::now());
        ready(self.script[index].clone())
    }

    /// Number of times the operation has been invoked.
    pub fn invocations(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Time elapsed between consecutive invocations.
    pub fn gaps(&self) -> Vec<Duration> {
        let calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

/// Assert that a config yields exactly the given delays, in milliseconds.
///
/// # Example
///
/// ```rust
/// use backwater::{assert_delays, BackoffConfig};
/// use std::time::Duration;
///
/// let config = BackoffConfig::builder()
///     .initial_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_millis(300))
///     .jitter_factor(0.0)
///     .max_retries(4)
///     .build();
///
/// assert_delays!(config, [100, 200, 300, 300]);
/// ```
#[macro_export]
macro_rules! assert_delays {
    ($config:expr, [$($ms:expr),* $(,)?]) => {{
        let actual: ::std::vec::Vec<::std::time::Duration> = $config.delays().collect();
        let expected: ::std::vec::Vec<::std::time::Duration> =
            ::std::vec![$(::std::time::Duration::from_millis($ms)),*];
        assert_eq!(actual, expected, "delay schedule mismatch");
    }};
}

/// Assert that a retry result is an exhaustion with the given last error and
/// attempt count.
///
/// # Example
///
/// ```rust
/// use backwater::{assert_exhausted, RetryError};
///
/// let result: Result<(), _> = Err(RetryError::Exhausted { last_error: "down", attempts: 4 });
/// assert_exhausted!(result, "down", 4);
/// ```
#[macro_export]
macro_rules! assert_exhausted {
    ($result:expr, $error:expr, $attempts:expr) => {
        match $result {
            Err($crate::RetryError::Exhausted {
                last_error,
                attempts,
            }) => {
                assert_eq!(last_error, $error);
                assert_eq!(attempts, $attempts);
            }
            other => {
                panic!("Expected Exhausted, got {:?}", other);
            }
        }
    };
}

#[cfg(feature = "proptest")]
use proptest::prelude::*;

#[cfg(feature = "proptest")]
impl Arbitrary for crate::BackoffConfig {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            1u64..10_000,
            1u64..600_000,
            1.0f64..8.0,
            0.0f64..1.0,
            0u32..64,
        )
            .prop_map(|(initial, max, multiplier, jitter, retries)| {
                crate::BackoffConfig::builder()
                    .initial_delay(Duration::from_millis(initial))
                    .max_delay(Duration::from_millis(max))
                    .multiplier(multiplier)
                    .jitter_factor(jitter)
                    .max_retries(retries)
                    .build()
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BackoffConfig, RetryError};
    use std::time::Duration;

    #[cfg(feature = "async")]
    #[test]
    fn scripted_operation_replays_in_order() {
        let op = ScriptedOperation::new(vec![Err(Failure::Recoverable("a")), Ok(1), Ok(2)]);

        assert_eq!(op.call().into_inner(), Err(Failure::Recoverable("a")));
        assert_eq!(op.call().into_inner(), Ok(1));
        assert_eq!(op.call().into_inner(), Ok(2));
        assert_eq!(op.invocations(), 3);
    }

    #[cfg(feature = "async")]
    #[test]
    fn scripted_operation_repeats_last_entry() {
        let op = ScriptedOperation::<(), _>::always_failing("down");

        for _ in 0..5 {
            assert_eq!(op.call().into_inner(), Err(Failure::Recoverable("down")));
        }
        assert_eq!(op.invocations(), 5);
    }

    #[cfg(feature = "async")]
    #[test]
    fn scripted_operation_clones_share_history() {
        let op = ScriptedOperation::failing_then(1, "e", 7);
        let clone = op.clone();

        assert!(op.call().into_inner().is_err());
        assert_eq!(clone.call().into_inner(), Ok(7));
        assert_eq!(op.invocations(), 2);
    }

    #[cfg(feature = "async")]
    #[test]
    #[should_panic(expected = "at least one result")]
    fn scripted_operation_rejects_empty_script() {
        let _ = ScriptedOperation::<(), ()>::new(Vec::new());
    }

    #[cfg(feature = "async")]
    #[tokio::test(start_paused = true)]
    async fn scripted_operation_records_gaps() {
        let op = ScriptedOperation::<(), ()>::always_failing(());

        let _ = op.call();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let _ = op.call();

        assert_eq!(op.gaps(), vec![Duration::from_millis(30)]);
    }

    #[test]
    fn assert_delays_macro() {
        let config = BackoffConfig::constant(Duration::from_millis(10)).with_max_retries(3);
        assert_delays!(config, [10, 10, 10]);
    }

    #[test]
    #[should_panic(expected = "delay schedule mismatch")]
    fn assert_delays_panics_on_mismatch() {
        let config = BackoffConfig::constant(Duration::from_millis(10)).with_max_retries(2);
        assert_delays!(config, [10]);
    }

    #[test]
    fn assert_exhausted_macro() {
        let result: Result<(), _> = Err(RetryError::Exhausted {
            last_error: "x",
            attempts: 2,
        });
        assert_exhausted!(result, "x", 2);
    }

    #[test]
    #[should_panic(expected = "Expected Exhausted")]
    fn assert_exhausted_panics_on_success() {
        let result: Result<i32, RetryError<&str>> = Ok(1);
        assert_exhausted!(result, "x", 1);
    }

    #[cfg(feature = "proptest")]
    mod proptest_tests {
        use super::*;

        proptest! {
            #[test]
            fn arbitrary_config_is_normalized(config in any::<BackoffConfig>()) {
                prop_assert!(config.initial_delay() > Duration::ZERO);
                prop_assert!(config.max_delay() >= config.initial_delay());
                prop_assert!(config.multiplier() > 1.0);
                prop_assert!(config.jitter_factor() >= 0.0);
            }
        }
    }
}
