//! Error types for retry operations.

use std::fmt;

/// Why a retry session ended without a value.
///
/// Operation errors (`Fatal`, `Exhausted`) carry the error the operation
/// returned; the stop signals (`Cancelled`, `DeadlineExceeded`) deliberately
/// do not, so callers can tell "the caller gave up" apart from "the operation
/// failed".
///
/// # Examples
///
/// ```rust
/// use backwater::{retry, BackoffConfig, Failure, RetryError};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let config = BackoffConfig::constant(Duration::from_millis(1)).with_max_retries(2);
///
/// let result = retry(
///     || async { Err::<(), _>(Failure::Recoverable("always fails")) },
///     &config,
/// )
/// .await;
///
/// match result {
///     Err(RetryError::Exhausted { last_error, attempts }) => {
///         assert_eq!(last_error, "always fails");
///         assert_eq!(attempts, 3); // 1 initial + 2 retries
///     }
///     other => panic!("Expected exhaustion, got {:?}", other),
/// }
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// The operation marked its error fatal; no further attempts were made.
    Fatal(E),
    /// The delay sequence ran out before any attempt succeeded.
    Exhausted {
        /// The error from the final attempt.
        last_error: E,
        /// Total number of attempts made (initial + retries).
        attempts: u32,
    },
    /// The cancellation token fired while waiting for the next attempt.
    Cancelled {
        /// Attempts made before cancellation was observed.
        attempts: u32,
    },
    /// The session deadline passed while waiting for the next attempt.
    DeadlineExceeded {
        /// Attempts made before the deadline was observed.
        attempts: u32,
    },
}

impl<E> RetryError<E> {
    /// Returns true if the operation stopped the session with a fatal error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// Returns true if the retry budget was used up.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Returns true if the session was cancelled or hit its deadline.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::DeadlineExceeded { .. })
    }

    /// Attempts made, when known. A fatal error does not track this.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Fatal(_) => None,
            Self::Exhausted { attempts, .. }
            | Self::Cancelled { attempts }
            | Self::DeadlineExceeded { attempts } => Some(*attempts),
        }
    }

    /// Get a reference to the operation's error, if the operation produced
    /// the final outcome.
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            Self::Fatal(e) | Self::Exhausted { last_error: e, .. } => Some(e),
            Self::Cancelled { .. } | Self::DeadlineExceeded { .. } => None,
        }
    }

    /// Extract the operation's error, discarding retry metadata.
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            Self::Fatal(e) | Self::Exhausted { last_error: e, .. } => Some(e),
            Self::Cancelled { .. } | Self::DeadlineExceeded { .. } => None,
        }
    }

    /// Transform the operation error, keeping the variant and metadata.
    pub fn map_err<F, E2>(self, f: F) -> RetryError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            Self::Fatal(e) => RetryError::Fatal(f(e)),
            Self::Exhausted {
                last_error,
                attempts,
            } => RetryError::Exhausted {
                last_error: f(last_error),
                attempts,
            },
            Self::Cancelled { attempts } => RetryError::Cancelled { attempts },
            Self::DeadlineExceeded { attempts } => RetryError::DeadlineExceeded { attempts },
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal(e) => write!(f, "{}", e),
            Self::Exhausted {
                last_error,
                attempts,
            } => write!(
                f,
                "retry exhausted after {} attempts: {}",
                attempts, last_error
            ),
            Self::Cancelled { attempts } => {
                write!(f, "retry cancelled after {} attempts", attempts)
            }
            Self::DeadlineExceeded { attempts } => {
                write!(f, "retry deadline exceeded after {} attempts", attempts)
            }
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            // Display is transparent for fatal errors, so skip a level.
            Self::Fatal(e) => e.source(),
            Self::Exhausted { last_error, .. } => Some(last_error),
            Self::Cancelled { .. } | Self::DeadlineExceeded { .. } => None,
        }
    }
}
