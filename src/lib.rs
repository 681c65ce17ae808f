//! # Backwater
//!
//! > *"Wait where the water is still, then try again."*
//!
//! A Rust library for exponential and constant backoff.
//!
//! ## Philosophy
//!
//! **Backwater** keeps the same split as any good retry story:
//! - **Schedule** = pure data ([`BackoffConfig`]) and a lazy iterator of delays ([`Delays`])
//! - **Driver** = the imperative loop ([`Retry`]) that sleeps, calls and stops
//!
//! ## Quick Example
//!
//! ```rust
//! use backwater::{fatal, retry, BackoffConfig, Failure};
//! use std::time::Duration;
//!
//! #[derive(Debug, PartialEq)]
//! enum ApiError {
//!     Unavailable,
//!     Unauthorized,
//! }
//!
//! async fn call_api(status: u16) -> Result<&'static str, Failure<ApiError>> {
//!     match status {
//!         200 => Ok("payload"),
//!         401 => Err(fatal(ApiError::Unauthorized)),
//!         _ => Err(ApiError::Unavailable.into()),
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let config = BackoffConfig::builder()
//!     .initial_delay(Duration::from_millis(1))
//!     .max_delay(Duration::from_millis(10))
//!     .max_retries(5)
//!     .build();
//!
//! let body = retry(|| call_api(200), &config).await;
//! assert_eq!(body, Ok("payload"));
//!
//! let denied = retry(|| call_api(401), &config).await;
//! assert!(denied.unwrap_err().is_fatal());
//! # });
//! ```
//!
//! ## Iterating delays directly
//!
//! ```rust
//! use backwater::BackoffConfig;
//! use std::time::Duration;
//!
//! let config = BackoffConfig::exponential().with_max_retries(3);
//! for delay in config.delays() {
//!     assert!(delay <= Duration::from_secs(30));
//! }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod backoff;
pub mod retry;
pub mod testing;

// Re-exports
pub use backoff::{BackoffConfig, BackoffConfigBuilder, Delays};
pub use retry::{fatal, retry_blocking, Failure, Outcome, RetryError};
#[cfg(feature = "async")]
pub use retry::{retry, retry_with_cancel, Retry};
#[cfg(feature = "async")]
pub use tokio_util::sync::CancellationToken;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backoff::{BackoffConfig, BackoffConfigBuilder, Delays};
    pub use crate::retry::{fatal, retry_blocking, Failure, RetryError};
    #[cfg(feature = "async")]
    pub use crate::retry::{retry, retry_with_cancel, Retry};
    #[cfg(feature = "async")]
    pub use tokio_util::sync::CancellationToken;
}
