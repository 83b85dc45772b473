//! # Propgrid Domain
//!
//! Typed request and response models for the property, rule-format, search
//! and site shield APIs.
//!
//! This crate contains:
//! - Request/response data types and their pre-flight validation rules
//! - The typed API error decoded from non-success responses
//! - Wire-level constants shared with the HTTP layer
//!
//! ## Architecture
//! - Depends only on `propgrid-common` (validation framework)
//! - No I/O; everything here is plain data

pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::ApiError;
pub use types::*;
