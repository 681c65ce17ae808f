//! Retry driver built on top of [`backoff`](crate::backoff) delay sequences.
//!
//! The driver runs an operation, and after every recoverable failure waits out
//! the next delay from a [`BackoffConfig`](crate::BackoffConfig) before trying
//! again:
//!
//! - **Recoverable by default**: plain errors convert into
//!   [`Failure::Recoverable`], so `?` keeps the loop going
//! - **Fatal on request**: wrap an error with [`fatal`] to stop immediately
//! - **Interruptible**: waits race a `CancellationToken` and/or a deadline
//!
//! # Quick Start
//!
//! ```rust
//! use backwater::{retry, BackoffConfig, Failure};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let config = BackoffConfig::builder()
//!     .initial_delay(Duration::from_millis(1))
//!     .max_retries(3)
//!     .build();
//!
//! let value = retry(|| async { Ok::<_, Failure<String>>(42) }, &config).await;
//! assert_eq!(value, Ok(42));
//! # });
//! ```
//!
//! # Error Types
//!
//! - [`Failure`]: what an operation returns to say "retry" or "stop"
//! - [`RetryError`]: why a whole session ended without a value

mod blocking;
#[cfg(feature = "async")]
mod driver;
mod error;
mod failure;

pub use blocking::retry_blocking;
#[cfg(feature = "async")]
pub use driver::{retry, retry_with_cancel, Retry};
pub use error::RetryError;
pub use failure::{fatal, Failure, Outcome};
