//! Error type returned by endpoint methods
//!
//! Every failure carries the operation that produced it as a stable prefix,
//! while the underlying validation, session or API error stays reachable as
//! the source for matching.

use std::fmt;

use propgrid_common::validation::ValidationError;
use propgrid_domain::ApiError;
use reqwest::StatusCode;
use thiserror::Error;

use crate::session::{ApiResponse, SessionError};

/// Remote operation an endpoint method performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetRuleTree,
    UpdateRuleTree,
    GetRuleFormats,
    SearchProperties,
    GetSiteShieldMaps,
    GetSiteShieldMap,
    AckSiteShieldMap,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetRuleTree => "fetching rule tree",
            Self::UpdateRuleTree => "updating rule tree",
            Self::GetRuleFormats => "fetching rule formats",
            Self::SearchProperties => "searching for properties",
            Self::GetSiteShieldMaps => "fetching site shield maps",
            Self::GetSiteShieldMap => "fetching site shield map",
            Self::AckSiteShieldMap => "acknowledging site shield map",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request was rejected before any network call
    #[error("{op}: struct validation: {source}")]
    Validation {
        op: Operation,
        #[source]
        source: ValidationError,
    },

    /// The call could not be completed
    #[error("{op}: request failed: {source}")]
    Request {
        op: Operation,
        #[source]
        source: SessionError,
    },

    /// The API answered with an unexpected status
    #[error("{op}: {source}")]
    Api {
        op: Operation,
        #[source]
        source: ApiError,
    },
}

impl ClientError {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Validation { op, .. } | Self::Request { op, .. } | Self::Api { op, .. } => *op,
        }
    }

    /// API error with status 404
    pub fn is_not_found(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_not_found)
    }

    /// Request rejected by pre-flight validation
    pub fn is_struct_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn validation_error(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn session_error(&self) -> Option<&SessionError> {
        match self {
            Self::Request { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Attach `op` to a session result
pub(crate) trait OperationExt<T> {
    fn during(self, op: Operation) -> ClientResult<T>;
}

impl<T> OperationExt<T> for Result<T, SessionError> {
    fn during(self, op: Operation) -> ClientResult<T> {
        self.map_err(|source| ClientError::Request { op, source })
    }
}

impl<T> OperationExt<T> for Result<T, ValidationError> {
    fn during(self, op: Operation) -> ClientResult<T> {
        self.map_err(|source| ClientError::Validation { op, source })
    }
}

/// Payload of a response with the `expected` status, else the decoded
/// API error
pub(crate) fn expect_data<T>(
    op: Operation,
    response: ApiResponse<T>,
    expected: StatusCode,
) -> ClientResult<T> {
    if response.status != expected {
        return Err(ClientError::Api { op, source: response.api_error() });
    }
    let error = response.api_error();
    response.into_data().ok_or(ClientError::Api { op, source: error })
}
