//! Token bucket rate limiting for outgoing requests
//!
//! The bucket allows bursts up to its capacity, then refills at a fixed rate.
//! Time is read from `tokio::time::Instant` so paused-clock tests can drive
//! refills deterministically.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Configuration for token bucket rate limiter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBucketConfig {
    /// Maximum number of tokens the bucket can hold
    pub capacity: u64,
    /// Number of tokens to refill per interval
    pub refill_amount: u64,
    /// Time interval for token refill
    pub refill_interval: Duration,
}

impl TokenBucketConfig {
    /// `limit` requests per second, one token released every `1s / limit`
    pub fn per_second(limit: u32) -> Result<Self, String> {
        if limit == 0 {
            return Err("limit must be greater than 0".to_string());
        }
        let config = Self {
            capacity: u64::from(limit),
            refill_amount: 1,
            refill_interval: Duration::from_secs(1) / limit,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be greater than 0".to_string());
        }
        if self.refill_amount == 0 {
            return Err("refill_amount must be greater than 0".to_string());
        }
        if self.refill_interval.is_zero() {
            return Err("refill_interval must be greater than zero".to_string());
        }
        Ok(())
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: u64,
    last_refill: Instant,
}

/// Token bucket rate limiter
///
/// Cloning yields a handle onto the same bucket.
///
/// # Examples
///
/// ```rust
/// use propgrid_common::resilience::{RateLimiter, TokenBucketConfig};
///
/// # async fn example() -> Result<(), String> {
/// let limiter = RateLimiter::new(TokenBucketConfig::per_second(5)?)?;
/// limiter.acquire().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: TokenBucketConfig,
    state: Arc<Mutex<BucketState>>,
}

impl RateLimiter {
    /// Create a full bucket
    pub fn new(config: TokenBucketConfig) -> Result<Self, String> {
        config.validate()?;
        let state = BucketState { tokens: config.capacity, last_refill: Instant::now() };
        Ok(Self { config, state: Arc::new(Mutex::new(state)) })
    }

    /// Shorthand for [`TokenBucketConfig::per_second`]
    pub fn per_second(limit: u32) -> Result<Self, String> {
        Self::new(TokenBucketConfig::per_second(limit)?)
    }

    /// The configuration this bucket was built with
    pub fn config(&self) -> &TokenBucketConfig {
        &self.config
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last_refill);
        let refills = elapsed.as_nanos() / self.config.refill_interval.as_nanos();
        if refills == 0 {
            return;
        }

        let refills = u64::try_from(refills).unwrap_or(u64::MAX);
        let added = refills.saturating_mul(self.config.refill_amount);
        state.tokens = state.tokens.saturating_add(added).min(self.config.capacity);
        let advanced = u32::try_from(refills)
            .map(|n| self.config.refill_interval.saturating_mul(n))
            .unwrap_or(elapsed);
        state.last_refill += advanced;
        if state.tokens == self.config.capacity {
            state.last_refill = now;
        }
    }

    /// Take one token if available, otherwise report how long until the next
    /// refill
    fn take(&self) -> Result<(), Duration> {
        let now = Instant::now();
        let mut state = self.state.lock();
        self.refill(&mut state, now);

        if state.tokens > 0 {
            state.tokens -= 1;
            return Ok(());
        }

        let next = state.last_refill + self.config.refill_interval;
        Err(next.saturating_duration_since(now))
    }

    /// Try to acquire a single token without waiting
    pub fn try_acquire(&self) -> bool {
        self.take().is_ok()
    }

    /// Wait until a token is available, then take it
    ///
    /// Cancellation is the caller's concern: drop the future to abandon the
    /// wait.
    pub async fn acquire(&self) {
        loop {
            match self.take() {
                Ok(()) => return,
                Err(wait) => {
                    debug!(wait_ms = wait.as_millis() as u64, "rate limit reached, waiting for token");
                    tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
                }
            }
        }
    }

    /// Get the current number of available tokens
    pub fn available_tokens(&self) -> u64 {
        let mut state = self.state.lock();
        self.refill(&mut state, Instant::now());
        state.tokens
    }
}
