//! Retry policy for upstream fetches: fixed or capped exponential backoff.

use std::time::Duration;

/// Wait between a failed attempt and the next one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed { delay: Duration },
    /// `base * factor^retry`, never more than `max`.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
        /// Spread each delay uniformly over ±50%.
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Fixed {
            delay: Duration::from_secs(1),
        }
    }
}

impl Backoff {
    /// Doubling backoff from one second, capped at `max`, without jitter.
    pub const fn capped_exponential(max: Duration) -> Self {
        Self::Exponential {
            base: Duration::from_secs(1),
            factor: 2.0,
            max,
            jitter: false,
        }
    }

    /// Same backoff with the delay spread uniformly over ±50%.
    ///
    /// Has no effect on [`Backoff::Fixed`].
    pub fn jittered(self) -> Self {
        match self {
            Self::Exponential {
                base, factor, max, ..
            } => Self::Exponential {
                base,
                factor,
                max,
                jitter: true,
            },
            fixed @ Self::Fixed { .. } => fixed,
        }
    }

    /// Delay before retry number `retry` (0 for the first retry).
    pub fn delay(self, retry: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
                let grown = base.as_secs_f64() * factor.powi(exponent);
                let mut seconds = if grown.is_finite() {
                    grown.min(max.as_secs_f64())
                } else {
                    max.as_secs_f64()
                };

                if jitter {
                    // Uniform in [0.5, 1.5) of the capped delay.
                    seconds *= 0.5 + fastrand::f64();
                }

                Duration::from_secs_f64(seconds.max(0.0))
            }
        }
    }
}

/// How many times to attempt an upstream fetch and how long to wait between attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts allowed; `None` retries until success or shutdown.
    pub max_attempts: Option<u32>,
    /// The backoff strategy to use between retries.
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    /// One-second fixed delay, unbounded attempts.
    fn default() -> Self {
        Self {
            max_attempts: None,
            backoff: Backoff::default(),
        }
    }
}

impl RetryPolicy {
    /// Retry forever with a fixed delay.
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            backoff: Backoff::Fixed { delay },
        }
    }

    /// Give up after `max_attempts` total attempts.
    pub fn bounded(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            backoff,
        }
    }

    /// Whether the 1-based `attempt` may be issued.
    pub fn allows_attempt(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt <= max)
    }

    /// Delay to wait after the 1-based `failed_attempt` before the next one.
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        self.backoff.delay(failed_attempt.saturating_sub(1))
    }
}
