//! The lazy delay sequence produced from a [`BackoffConfig`].

use std::iter::FusedIterator;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::BackoffConfig;

impl BackoffConfig {
    /// Lazy sequence of delays, jittered with an OS-seeded generator.
    ///
    /// Drop the iterator to stop early; nothing is computed ahead of time.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use backwater::BackoffConfig;
    /// use std::time::Duration;
    ///
    /// let config = BackoffConfig::builder()
    ///     .initial_delay(Duration::from_millis(100))
    ///     .max_delay(Duration::from_millis(300))
    ///     .jitter_factor(0.0)
    ///     .max_retries(4)
    ///     .build();
    ///
    /// let delays: Vec<_> = config.delays().collect();
    /// assert_eq!(
    ///     delays,
    ///     vec![
    ///         Duration::from_millis(100),
    ///         Duration::from_millis(200),
    ///         Duration::from_millis(300),
    ///         Duration::from_millis(300),
    ///     ]
    /// );
    /// ```
    pub fn delays(&self) -> Delays<StdRng> {
        self.delays_with_rng(StdRng::from_os_rng())
    }

    /// Lazy sequence of delays whose jitter is reproducible from `seed`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use backwater::BackoffConfig;
    ///
    /// let config = BackoffConfig::exponential().with_max_retries(5);
    ///
    /// let a: Vec<_> = config.delays_seeded(7).collect();
    /// let b: Vec<_> = config.delays_seeded(7).collect();
    /// assert_eq!(a, b);
    /// ```
    pub fn delays_seeded(&self, seed: u64) -> Delays<StdRng> {
        self.delays_with_rng(StdRng::seed_from_u64(seed))
    }

    /// Lazy sequence of delays drawing jitter from `rng`.
    pub fn delays_with_rng<R: Rng>(&self, rng: R) -> Delays<R> {
        Delays {
            config: *self,
            current: self.initial_delay(),
            attempt: 0,
            rng,
        }
    }
}

/// Iterator over backoff delays.
///
/// Created by [`BackoffConfig::delays`] and friends. Each instance owns its
/// own state and random source, so several can walk the same config
/// independently.
#[derive(Debug, Clone)]
pub struct Delays<R> {
    config: BackoffConfig,
    // Unjittered delay for the next step.
    current: Duration,
    attempt: u32,
    rng: R,
}

impl<R> Delays<R> {
    /// Number of delays yielded so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// The config this sequence was built from.
    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }

    fn is_exhausted(&self) -> bool {
        !self.config.is_unlimited() && self.attempt >= self.config.max_retries()
    }
}

impl<R: Rng> Iterator for Delays<R> {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_exhausted() {
            return None;
        }

        let base = self.current;
        let max_delay = self.config.max_delay();

        let jittered = if self.config.has_jitter() {
            let spread = self.rng.random_range(-1.0..=1.0) * self.config.jitter_factor();
            scale(base, 1.0 + spread)
        } else {
            base
        };

        self.current = scale(base, self.config.multiplier())
            .max(base)
            .min(max_delay);
        self.attempt = self.attempt.saturating_add(1);

        Some(jittered.min(max_delay))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.config.is_unlimited() {
            return (usize::MAX, None);
        }
        let remaining = self.config.max_retries().saturating_sub(self.attempt);
        let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl<R: Rng> FusedIterator for Delays<R> {}

/// Multiply a duration by `factor`, truncating toward zero.
///
/// Negative and NaN results become zero; overflow saturates at
/// `Duration::MAX`.
fn scale(delay: Duration, factor: f64) -> Duration {
    let nanos = delay.as_nanos() as f64 * factor;
    if nanos.is_nan() || nanos < u64::MAX as f64 {
        // `as` maps NaN and negatives to 0.
        return Duration::from_nanos(nanos as u64);
    }
    Duration::try_from_secs_f64(nanos / 1e9).unwrap_or(Duration::MAX)
}
