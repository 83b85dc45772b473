//! Errors produced while executing a request through the session

use bytes::Bytes;
use propgrid_common::validation::ValidationError;
use thiserror::Error;

use super::signer::SignError;

/// Failure of one logical request execution
///
/// Transport failures are carried unmodified; non-2xx responses are not
/// errors at this layer.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Caller misuse detected before any I/O
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("marshaling input: {0}")]
    Marshaling(#[source] serde_json::Error),

    /// The body was received but did not decode into the expected shape
    #[error("unmarshaling output (status {status}): {source}")]
    Unmarshaling {
        #[source]
        source: serde_json::Error,
        status: u16,
        /// Buffered response body, kept for diagnostics
        body: Bytes,
    },

    #[error("signing request: {0}")]
    Signing(#[from] SignError),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("context cancelled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("retry configuration failed: {0}")]
    RetryConfig(#[source] ValidationError),

    #[error("stopped after {0} redirects")]
    TooManyRedirects(usize),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The underlying HTTP client could not be constructed
    #[error("building http client: {0}")]
    Client(#[source] reqwest::Error),
}

impl SessionError {
    /// Whether the call was aborted by its context
    pub fn is_context_error(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Raw body of a response that failed to decode
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            Self::Unmarshaling { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Result alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;
