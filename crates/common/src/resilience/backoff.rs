//! Backoff schedules and retry decisions

use std::time::Duration;

/// Decision for whether to retry an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation with the default backoff delay
    Retry,
    /// Retry the operation with a custom delay
    RetryAfter(Duration),
    /// Don't retry the operation
    Stop,
}

impl RetryDecision {
    /// Resolve the decision into a concrete wait, using `backoff` for
    /// [`RetryDecision::Retry`]
    pub fn delay(self, backoff: &BackoffStrategy, attempt: u32) -> Option<Duration> {
        match self {
            Self::Retry => Some(backoff.calculate_delay(attempt)),
            Self::RetryAfter(delay) => Some(delay),
            Self::Stop => None,
        }
    }
}

/// Backoff strategy for calculating retry delays
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),
    /// Exponential backoff: `initial_delay * base^attempt`, capped at
    /// `max_delay`
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
}

impl BackoffStrategy {
    /// Doubling backoff between `min` and `max`
    pub fn doubling(min: Duration, max: Duration) -> Self {
        Self::Exponential { initial_delay: min, base: 2.0, max_delay: max }
    }

    /// Calculate the delay for the given zero-based attempt
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            BackoffStrategy::Fixed(delay) => *delay,
            BackoffStrategy::Exponential { initial_delay, base, max_delay } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let delay = initial_delay.as_secs_f64() * base.powi(exponent);
                if !delay.is_finite() || delay >= max_delay.as_secs_f64() {
                    return *max_delay;
                }
                Duration::from_secs_f64(delay.max(0.0))
            }
        }
    }
}
