//! Async retry driver.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::RetryError;
use super::failure::{Failure, Outcome};
use crate::backoff::BackoffConfig;

/// A configured retry session.
///
/// `Retry` pairs a [`BackoffConfig`] with optional stop signals. It can run
/// any number of operations; every call to [`run`](Self::run) walks a fresh
/// delay sequence.
///
/// # Behavior
///
/// 1. The operation runs once immediately.
/// 2. After each recoverable failure the driver waits out the next delay, then
///    runs the operation again.
/// 3. A success returns the value, a [`fatal`](crate::fatal) error returns
///    [`RetryError::Fatal`] and running out of delays returns
///    [`RetryError::Exhausted`] with the last error.
/// 4. A cancelled token or a passed deadline interrupts the wait and returns
///    [`RetryError::Cancelled`] or [`RetryError::DeadlineExceeded`]. The
///    operation is never invoked again once a stop is observed.
///
/// # Examples
///
/// ```rust
/// use backwater::{BackoffConfig, Failure, Retry};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let calls = &AtomicU32::new(0);
/// let config = BackoffConfig::constant(Duration::from_millis(1)).with_max_retries(5);
///
/// let result = Retry::new(config)
///     .timeout(Duration::from_secs(5))
///     .run(move || async move {
///         if calls.fetch_add(1, Ordering::SeqCst) < 2 {
///             Err(Failure::Recoverable("not yet"))
///         } else {
///             Ok("done")
///         }
///     })
///     .await;
///
/// assert_eq!(result, Ok("done"));
/// assert_eq!(calls.load(Ordering::SeqCst), 3);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Retry {
    config: BackoffConfig,
    token: Option<CancellationToken>,
    deadline: Option<Instant>,
    timeout: Option<Duration>,
    seed: Option<u64>,
}

impl Retry {
    /// Create a session with no stop signals.
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            token: None,
            deadline: None,
            timeout: None,
            seed: None,
        }
    }

    /// Stop waiting as soon as `token` is cancelled.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Stop waiting once `deadline` passes.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Stop waiting once `timeout` has elapsed since [`run`](Self::run)
    /// started. Combines with [`deadline`](Self::deadline); the earlier wins.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Draw jitter from a generator seeded with `seed`, making the schedule
    /// reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The backoff schedule of this session.
    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, fails fatally, runs out of delays
    /// or is stopped.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure<E>>>,
    {
        let stop = StopSignal {
            token: self.token.as_ref(),
            deadline: self.resolve_deadline(),
        };

        let mut attempts = 1u32;
        let mut last_error = match Outcome::from(operation().await) {
            Outcome::Success(value) => return Ok(value),
            Outcome::Fatal(error) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(attempt = attempts, "retry stopped by fatal error");
                return Err(RetryError::Fatal(error));
            }
            Outcome::Recoverable(error) => error,
        };

        let delays = match self.seed {
            Some(seed) => self.config.delays_seeded(seed),
            None => self.config.delays(),
        };

        for delay in delays {
            if let Some(reason) = stop.check() {
                return Err(reason.into_error(attempts));
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(attempt = attempts, ?delay, "attempt failed, backing off");

            tokio::select! {
                biased;
                reason = stop.wait() => return Err(reason.into_error(attempts)),
                () = tokio::time::sleep(delay) => {}
            }

            attempts = attempts.saturating_add(1);
            match Outcome::from(operation().await) {
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

    fn resolve_deadline(&self) -> Option<Instant> {
        let from_timeout = self
            .timeout
            .and_then(|timeout| Instant::now().checked_add(timeout));

        match (self.deadline, from_timeout) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

/// Retry `operation` on the schedule described by `config`.
///
/// Without a stop signal the session ends only on success, a fatal error or
/// exhaustion.
///
/// # Examples
///
/// ```rust
/// use backwater::{fatal, retry, BackoffConfig, RetryError};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let config = BackoffConfig::constant(Duration::from_millis(1)).with_max_retries(10);
///
/// let result = retry(|| async { Err::<(), _>(fatal("unauthorized")) }, &config).await;
///
/// assert_eq!(result, Err(RetryError::Fatal("unauthorized")));
/// # });
/// ```
pub async fn retry<T, E, F, Fut>(operation: F, config: &BackoffConfig) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Failure<E>>>,
{
    Retry::new(*config).run(operation).await
}

/// Retry `operation`, giving up as soon as `token` is cancelled.
///
/// # Examples
///
/// ```rust
/// use backwater::{retry_with_cancel, BackoffConfig, Failure, RetryError};
/// use tokio_util::sync::CancellationToken;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let token = CancellationToken::new();
/// token.cancel();
///
/// let config = BackoffConfig::constant(Duration::from_secs(60)).with_max_retries(3);
/// let result = retry_with_cancel(
///     || async { Err::<(), _>(Failure::Recoverable("down")) },
///     &config,
///     &token,
/// )
/// .await;
///
/// assert_eq!(result, Err(RetryError::Cancelled { attempts: 1 }));
/// # });
/// ```
pub async fn retry_with_cancel<T, E, F, Fut>(
    operation: F,
    config: &BackoffConfig,
    token: &CancellationToken,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Failure<E>>>,
{
    Retry::new(*config).cancel_on(token.clone()).run(operation).await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Cancelled,
    DeadlineExceeded,
}

impl StopReason {
    fn into_error<E>(self, attempts: u32) -> RetryError<E> {
        #[cfg(feature = "tracing")]
        tracing::warn!(attempts, reason = ?self, "retry stopped");

        match self {
            Self::Cancelled => RetryError::Cancelled { attempts },
            Self::DeadlineExceeded => RetryError::DeadlineExceeded { attempts },
        }
    }
}

#[derive(Debug)]
struct StopSignal<'a> {
    token: Option<&'a CancellationToken>,
    deadline: Option<Instant>,
}

impl StopSignal<'_> {
    fn check(&self) -> Option<StopReason> {
        if self.token.is_some_and(CancellationToken::is_cancelled) {
            return Some(StopReason::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Some(StopReason::DeadlineExceeded);
        }
        None
    }

    /// Resolves when either signal fires; never resolves if neither is set.
    async fn wait(&self) -> StopReason {
        let cancelled = async {
            match self.token {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = cancelled => StopReason::Cancelled,
            () = expired => StopReason::DeadlineExceeded,
        }
    }
}
