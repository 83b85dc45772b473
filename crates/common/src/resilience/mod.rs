//! Resilience building blocks for the HTTP session
//!
//! - **Backoff**: delay schedules shared by retry policies
//! - **Rate limiting**: a token bucket that paces outgoing requests
//!
//! Neither depends on HTTP types: the session layer decides *when*
//! to retry and only asks these primitives *how long* to wait.

pub mod backoff;
pub mod rate_limiter;

pub use backoff::{BackoffStrategy, RetryDecision};
pub use rate_limiter::{RateLimiter, TokenBucketConfig};
