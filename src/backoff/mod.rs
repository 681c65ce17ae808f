//! Backoff delay sequences.
//!
//! This module is the pure half of the crate: a [`BackoffConfig`] is plain
//! data, and [`Delays`] turns it into a lazy iterator of wait durations. No
//! sleeping happens here, which keeps schedules trivial to test.
//!
//! # Algorithm
//!
//! Starting from `initial_delay`, each step:
//!
//! 1. jitters the tracked delay by up to `±jitter_factor` of itself,
//! 2. floors the result at zero and caps it at `max_delay`,
//! 3. yields it,
//! 4. multiplies the *unjittered* delay by `multiplier`, capped at `max_delay`.
//!
//! Jitter therefore never compounds from one step to the next.
//!
//! # Presets
//!
//! - [`BackoffConfig::exponential`]: 100ms doubling to 30s with ±10% jitter
//! - [`BackoffConfig::constant`]: the same delay every time, no jitter
//!
//! ```rust
//! use backwater::BackoffConfig;
//! use std::time::Duration;
//!
//! for delay in BackoffConfig::constant(Duration::from_millis(5)).with_max_retries(3).delays() {
//!     std::thread::sleep(delay);
//!     // try again...
//! }
//! ```

mod config;
mod delays;

pub use config::{
    BackoffConfig, BackoffConfigBuilder, DEFAULT_CONSTANT_DELAY, DEFAULT_INITIAL_DELAY,
    DEFAULT_JITTER_FACTOR, DEFAULT_MAX_DELAY, DEFAULT_MULTIPLIER, MIN_INITIAL_DELAY,
};
pub use delays::Delays;
