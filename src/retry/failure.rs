//! Marking operation errors as recoverable or fatal.

use std::fmt;

/// Error returned by a retried operation.
///
/// Plain errors convert into [`Failure::Recoverable`] through `From`, so `?`
/// inside an operation keeps the retry loop going. Wrap an error with
/// [`fatal`] to stop the loop immediately.
///
/// # Examples
///
/// ```rust
/// use backwater::{fatal, Failure};
///
/// fn parse(input: &str) -> Result<i32, Failure<std::num::ParseIntError>> {
///     Ok(input.parse::<i32>()?)
/// }
///
/// assert!(parse("x").unwrap_err().is_recoverable());
///
/// let stop: Failure<&str> = fatal("unauthorized");
/// assert!(stop.is_fatal());
/// assert_eq!(stop.into_inner(), "unauthorized");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure<E> {
    /// Try again after the next delay.
    Recoverable(E),
    /// Stop retrying and surface this error.
    Fatal(E),
}

/// Mark an error as fatal so the retry driver stops at once.
pub fn fatal<E>(error: E) -> Failure<E> {
    Failure::Fatal(error)
}

impl<E> Failure<E> {
    /// Returns true if this error stops the retry loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// Returns true if the retry loop should keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable(_))
    }

    /// Unwrap the underlying error.
    pub fn into_inner(self) -> E {
        match self {
            Self::Recoverable(e) | Self::Fatal(e) => e,
        }
    }

    /// Get a reference to the underlying error.
    pub fn inner(&self) -> &E {
        match self {
            Self::Recoverable(e) | Self::Fatal(e) => e,
        }
    }
}

impl<E> From<E> for Failure<E> {
    fn from(error: E) -> Self {
        Self::Recoverable(error)
    }
}

impl<E: fmt::Display> fmt::Display for Failure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner())
    }
}

impl<E: std::error::Error + 'static> std::error::Error for Failure<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner().source()
    }
}

/// Classified result of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T, E> {
    /// The attempt produced a value.
    Success(T),
    /// The attempt failed and may be retried.
    Recoverable(E),
    /// The attempt failed and retrying must stop.
    Fatal(E),
}

impl<T, E> From<Result<T, Failure<E>>> for Outcome<T, E> {
    fn from(result: Result<T, Failure<E>>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(Failure::Recoverable(e)) => Self::Recoverable(e),
            Err(Failure::Fatal(e)) => Self::Fatal(e),
        }
    }
}

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[test]
    fn test_question_mark_is_recoverable() {
        fn op() -> Result<(), Failure<String>> {
            Err::<(), _>("boom".to_string())?;
            Ok(())
        }

        assert_eq!(op(), Err(Failure::Recoverable("boom".to_string())));
    }

    #[test]
    fn test_fatal_marks_error() {
        let err = fatal(42);
        assert!(err.is_fatal());
        assert!(!err.is_recoverable());
        assert_eq!(*err.inner(), 42);
        assert_eq!(err.into_inner(), 42);
    }

    #[test]
    fn test_display_is_transparent() {
        assert_eq!(fatal("denied").to_string(), "denied");
        assert_eq!(Failure::Recoverable("flaky").to_string(), "flaky");
    }

    #[test]
    fn test_outcome_from_result() {
        let ok: Result<i32, Failure<&str>> = Ok(1);
        assert_eq!(Outcome::from(ok), Outcome::Success(1));

        let soft: Result<i32, Failure<&str>> = Err(Failure::Recoverable("a"));
        assert_eq!(Outcome::from(soft), Outcome::Recoverable("a"));

        let hard: Result<i32, Failure<&str>> = Err(fatal("b"));
        assert_eq!(Outcome::from(hard), Outcome::Fatal("b"));
    }
}
