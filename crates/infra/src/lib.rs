//! # Propgrid Infrastructure
//!
//! Everything that performs I/O against the remote APIs.
//!
//! This crate contains:
//! - The HTTP session: request signing, execution, response decoding, retry
//!   policy and rate-limit aware backoff
//! - Endpoint clients for rule trees, rule formats, property search and site
//!   shield maps
//! - Configuration loading
//!
//! ## Architecture
//! - Request/response models and the API error live in `propgrid-domain`
//! - Validation and resilience primitives come from `propgrid-common`

pub mod config;
pub mod errors;
pub mod papi;
pub mod session;
pub mod siteshield;

// Re-export commonly used items
pub use errors::{ClientError, ClientResult, Operation};
pub use papi::Papi;
pub use session::{
    ApiRequest, ApiResponse, EdgeGridCredentials, EdgeGridSigner, RequestContext, RetryConfig,
    Session, SessionBuilder, SessionError, SignError, Signer,
};
pub use siteshield::SiteShield;
