//! Modular common utilities shared across propgrid crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: validation framework and serde helpers
//! - `runtime`: async resilience building blocks (backoff, rate limiting)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod utils;
#[cfg(feature = "foundation")]
pub mod validation;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use resilience::{BackoffStrategy, RateLimiter, RetryDecision};
#[cfg(feature = "foundation")]
pub use utils::serde::time_delta_millis;
#[cfg(feature = "foundation")]
pub use validation::{
    FieldError, FieldValidator, OneOfValidator, RequiredValidator, StringValidator, Validate,
    ValidationError, ValidationResult, Validator,
};
