//! Blocking retry driver for synchronous operations.

use super::error::RetryError;
use super::failure::{Failure, Outcome};
use crate::backoff::BackoffConfig;

/// Retry a synchronous `operation`, sleeping the current thread between
/// attempts.
///
/// Semantics match [`retry`](crate::retry) except that there is no way to
/// interrupt a wait, so the session ends only on success, a fatal error or
/// exhaustion. Do not call this from inside an async runtime.
///
/// # Examples
///
/// ```rust
/// use backwater::{retry_blocking, BackoffConfig, Failure};
/// use std::time::Duration;
///
/// let config = BackoffConfig::constant(Duration::from_millis(1)).with_max_retries(3);
/// let mut calls = 0;
///
/// let result = retry_blocking(
///     || {
///         calls += 1;
///         if calls < 3 {
///             Err(Failure::Recoverable("busy"))
///         } else {
///             Ok(calls)
///         }
///     },
///     &config,
/// );
///
/// assert_eq!(result, Ok(3));
/// ```
pub fn retry_blocking<T, E, F>(mut operation: F, config: &BackoffConfig) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, Failure<E>>,
{
    let mut attempts = 1u32;
    let mut last_error = match Outcome::from(operation()) {
        Outcome::Success(value) => return Ok(value),
        Outcome::Fatal(error) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(attempt = attempts, "retry stopped by fatal error");
            return Err(RetryError::Fatal(error));
        }
        Outcome::Recoverable(error) => error,
    };

    for delay in config.delays() {
        #[cfg(feature = "tracing")]
        tracing::debug!(attempt = attempts, ?delay, "attempt failed, backing off");

        std::thread::sleep(delay);

        attempts = attempts.saturating_add(1);
        match Outcome::from(operation()) {
            Outcome::Success(value) => return Ok(value),
            Outcome::Fatal(error) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(attempt = attempts, "retry stopped by fatal error");
                return Err(RetryError::Fatal(error));
            }
            Outcome::Recoverable(error) => last_error = error,
        }
    }

    #[cfg(feature = "tracing")]
    tracing::warn!(attempts, "retry exhausted");

    Err(RetryError::Exhausted {
        last_error,
        attempts,
    })
}

#[cfg(test)]
mod blocking_tests {
    use super::*;
    use crate::retry::failure::fatal;
    use std::time::Duration;

    fn quick(retries: u32) -> BackoffConfig {
        BackoffConfig::constant(Duration::from_millis(1)).with_max_retries(retries)
    }

    #[test]
    fn test_immediate_success() {
        let mut calls = 0;
        let result: Result<_, RetryError<()>> = retry_blocking(
            || {
                calls += 1;
                Ok("ok")
            },
            &quick(5),
        );

        assert_eq!(result, Ok("ok"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_exhaustion_counts_attempts() {
        let mut calls = 0;
        let result = retry_blocking(
            || {
                calls += 1;
                Err::<(), _>(Failure::Recoverable(calls))
            },
            &quick(2),
        );

        assert_eq!(
            result,
            Err(RetryError::Exhausted {
                last_error: 3,
                attempts: 3
            })
        );
    }

    #[test]
    fn test_fatal_stops() {
        let mut calls = 0;
        let result = retry_blocking(
            || {
                calls += 1;
                if calls == 2 {
                    Err::<(), _>(fatal("stop"))
                } else {
                    Err(Failure::Recoverable("again"))
                }
            },
            &quick(10),
        );

        assert_eq!(result, Err(RetryError::Fatal("stop")));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_zero_retries_runs_once() {
        let mut calls = 0;
        let result = retry_blocking(
            || {
                calls += 1;
                Err::<(), _>(Failure::Recoverable("nope"))
            },
            &quick(0),
        );

        assert!(result.unwrap_err().is_exhausted());
        assert_eq!(calls, 1);
    }

    #[cfg(feature = "tracing")]
    #[tracing_test::traced_test]
    #[test]
    fn test_fatal_stop_is_logged() {
        let result = retry_blocking(|| Err::<(), _>(fatal("denied")), &quick(3));

        assert!(result.unwrap_err().is_fatal());
        assert!(logs_contain("retry stopped by fatal error"));
    }
}
