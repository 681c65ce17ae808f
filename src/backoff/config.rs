//! Backoff configuration and its builder.

use std::time::Duration;

/// Delay used when the initial delay is configured as zero.
pub const MIN_INITIAL_DELAY: Duration = Duration::from_millis(1);

/// Cap used when the maximum delay is configured as zero.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Growth factor used when the configured multiplier does not grow.
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// First delay of the exponential preset.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(100);

/// Jitter of the exponential preset (±10%).
pub const DEFAULT_JITTER_FACTOR: f64 = 0.1;

/// Delay of the constant preset when none is given.
pub const DEFAULT_CONSTANT_DELAY: Duration = Duration::from_secs(1);

/// Immutable description of a backoff schedule.
///
/// A config is pure data: it describes the delays between attempts but never
/// sleeps or retries by itself. Build one with [`BackoffConfig::builder`] or
/// take a preset, then call [`BackoffConfig::delays`] for the sequence or hand
/// it to [`Retry`](crate::Retry).
///
/// Every field is normalized when the config is built, so a `BackoffConfig`
/// value always satisfies:
///
/// - `initial_delay > 0`
/// - `max_delay >= initial_delay`
/// - `multiplier > 1.0`, or exactly `1.0` for [`BackoffConfig::constant`]
/// - `jitter_factor >= 0.0`
///
/// # Examples
///
/// ```rust
/// use backwater::BackoffConfig;
/// use std::time::Duration;
///
/// let config = BackoffConfig::builder()
///     .initial_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(1))
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
///         Duration::from_millis(400),
///         Duration::from_millis(800),
///     ]
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "RawBackoffConfig"))]
pub struct BackoffConfig {
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter_factor: f64,
    max_retries: u32,
}

impl BackoffConfig {
    /// Sentinel for `max_retries` meaning the delay sequence never ends.
    pub const UNLIMITED: u32 = u32::MAX;

    /// Start building a config from the exponential preset.
    pub fn builder() -> BackoffConfigBuilder {
        BackoffConfigBuilder::exponential()
    }

    /// Exponential backoff: 100ms doubling up to 30s, ±10% jitter, unlimited
    /// retries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use backwater::BackoffConfig;
    /// use std::time::Duration;
    ///
    /// let config = BackoffConfig::exponential();
    /// assert_eq!(config.initial_delay(), Duration::from_millis(100));
    /// assert_eq!(config.multiplier(), 2.0);
    /// assert!(config.is_unlimited());
    /// ```
    pub fn exponential() -> Self {
        BackoffConfigBuilder::exponential().build()
    }

    /// Constant backoff: every delay equals `delay`, no jitter, unlimited
    /// retries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use backwater::BackoffConfig;
    /// use std::time::Duration;
    ///
    /// let config = BackoffConfig::constant(Duration::from_millis(500))
    ///     .with_max_retries(3);
    ///
    /// let delays: Vec<_> = config.delays().collect();
    /// assert_eq!(delays, vec![Duration::from_millis(500); 3]);
    /// ```
    pub fn constant(delay: Duration) -> Self {
        BackoffConfigBuilder::constant().initial_delay(delay).build()
    }

    /// Copy of this config with a different retry limit.
    pub fn with_max_retries(self, retries: u32) -> Self {
        Self {
            max_retries: retries,
            ..self
        }
    }

    /// Wait before the first retry.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Upper bound on every yielded delay.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Growth factor applied after each delay.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Fraction of each delay that is randomized in both directions.
    pub fn jitter_factor(&self) -> f64 {
        self.jitter_factor
    }

    /// Number of delays the sequence yields.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// True when the sequence never ends on its own.
    pub fn is_unlimited(&self) -> bool {
        self.max_retries == Self::UNLIMITED
    }

    /// True when delays are randomized.
    pub fn has_jitter(&self) -> bool {
        self.jitter_factor > 0.0
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self::exponential()
    }
}

/// Builder for [`BackoffConfig`].
///
/// Each setter normalizes its input right away, mirroring the rules on
/// [`BackoffConfig`]; [`build`](Self::build) then applies the cross-field rule
/// that the cap is never below the initial delay.
///
/// # Examples
///
/// ```rust
/// use backwater::BackoffConfigBuilder;
/// use std::time::Duration;
///
/// let config = BackoffConfigBuilder::exponential()
///     .initial_delay(Duration::ZERO) // normalized to 1ms
///     .multiplier(0.5)               // normalized to 2.0
///     .jitter_factor(-1.0)           // normalized to 0.0
///     .build();
///
/// assert_eq!(config.initial_delay(), Duration::from_millis(1));
/// assert_eq!(config.multiplier(), 2.0);
/// assert_eq!(config.jitter_factor(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffConfigBuilder {
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter_factor: f64,
    max_retries: u32,
}

impl BackoffConfigBuilder {
    /// Builder seeded with the exponential preset.
    pub fn exponential() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
            jitter_factor: DEFAULT_JITTER_FACTOR,
            max_retries: BackoffConfig::UNLIMITED,
        }
    }

    /// Builder seeded with the constant preset (1s, no growth, no jitter).
    ///
    /// Setting only [`initial_delay`](Self::initial_delay) afterwards keeps
    /// the schedule constant at that delay.
    pub fn constant() -> Self {
        Self {
            initial_delay: DEFAULT_CONSTANT_DELAY,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
            jitter_factor: 0.0,
            max_retries: BackoffConfig::UNLIMITED,
        }
    }

    /// Wait before the first retry. Zero becomes 1ms.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = if delay.is_zero() {
            MIN_INITIAL_DELAY
        } else {
            delay
        };
        self
    }

    /// Cap on every delay. Zero becomes 30s.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = if delay.is_zero() {
            DEFAULT_MAX_DELAY
        } else {
            delay
        };
        self
    }

    /// Growth factor per attempt. Anything not above 1.0 becomes 2.0.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = if multiplier > 1.0 {
            multiplier
        } else {
            DEFAULT_MULTIPLIER
        };
        self
    }

    /// Symmetric jitter as a fraction of the delay (0.1 is ±10%). Negative
    /// becomes 0.0.
    pub fn jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = if factor > 0.0 { factor } else { 0.0 };
        self
    }

    /// Number of delays to yield.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Never stop yielding delays.
    pub fn unlimited_retries(self) -> Self {
        self.max_retries(BackoffConfig::UNLIMITED)
    }

    /// Finish the config.
    pub fn build(self) -> BackoffConfig {
        // The constant preset leaves its cap unset so it follows the delay.
        let max_delay = self.max_delay.max(self.initial_delay);

        BackoffConfig {
            initial_delay: self.initial_delay,
            max_delay,
            multiplier: self.multiplier,
            jitter_factor: self.jitter_factor,
            max_retries: self.max_retries,
        }
    }
}

impl Default for BackoffConfigBuilder {
    fn default() -> Self {
        Self::exponential()
    }
}

/// Wire form of [`BackoffConfig`]. Missing fields take the exponential
/// defaults and every value passes through the builder's normalization. A
/// multiplier of exactly 1.0 is kept so constant schedules survive a round
/// trip.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(default)]
struct RawBackoffConfig {
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter_factor: f64,
    max_retries: u32,
}

#[cfg(feature = "serde")]
impl Default for RawBackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
            jitter_factor: DEFAULT_JITTER_FACTOR,
            max_retries: BackoffConfig::UNLIMITED,
        }
    }
}

#[cfg(feature = "serde")]
impl From<RawBackoffConfig> for BackoffConfig {
    fn from(raw: RawBackoffConfig) -> Self {
        let builder = BackoffConfigBuilder::exponential()
            .initial_delay(raw.initial_delay)
            .max_delay(raw.max_delay)
            .jitter_factor(raw.jitter_factor)
            .max_retries(raw.max_retries);

        let builder = if raw.multiplier == 1.0 {
            BackoffConfigBuilder {
                multiplier: 1.0,
                ..builder
            }
        } else {
            builder.multiplier(raw.multiplier)
        };

        builder.build()
    }
}
