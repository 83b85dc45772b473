//! Typed API error decoded from non-success responses

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use serde_with::{serde_as, DefaultOnNull};

use crate::constants::{LIMIT_KEY_DEFAULT_CERTS, TYPE_SBD_NOT_ENABLED};

/// Problem-details style error reported by the remote API
///
/// Always carries `status_code`, even when the response body was missing or
/// could not be decoded. String fields sent as `null` decode as empty.
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub detail: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instance: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub behavior_name: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_location: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Value>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub limit_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<i64>,
}

fn is_zero(code: &u16) -> bool {
    *code == 0
}

impl ApiError {
    /// Literal error for matching, e.g. in tests or caller checks
    pub fn new(
        status_code: u16,
        error_type: impl Into<String>,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            error_type: error_type.into(),
            title: title.into(),
            detail: detail.into(),
            status_code,
            ..Self::default()
        }
    }

    /// Best-effort decode of an error body
    ///
    /// A body that is not a JSON object of the expected shape yields an error
    /// with only `status_code` set.
    pub fn from_response(body: &[u8], status_code: u16) -> Self {
        let mut error = serde_json::from_slice::<Self>(body).unwrap_or_default();
        error.status_code = status_code;
        error
    }

    /// Status-only check for "resource not found"
    pub fn is_not_found(&self) -> bool {
        self.status_code == 404
    }

    /// The contract has no DEFAULT certificate slots left
    pub fn is_default_cert_limit_reached(&self) -> bool {
        self.status_code == 429
            && self.limit_key == LIMIT_KEY_DEFAULT_CERTS
            && self.remaining == Some(0)
    }

    /// Secure-by-default provisioning is not enabled for the account
    pub fn is_sbd_not_enabled(&self) -> bool {
        self.status_code == 403 && self.error_type == TYPE_SBD_NOT_ENABLED
    }
}

/// Two errors are the same kind when type, title, detail and status agree
impl PartialEq for ApiError {
    fn eq(&self, other: &Self) -> bool {
        self.status_code == other.status_code
            && self.error_type == other.error_type
            && self.title == other.title
            && self.detail == other.detail
    }
}

impl Eq for ApiError {}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut body = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut body, PrettyFormatter::with_indent(b"\t"));
        match self.serialize(&mut ser) {
            Ok(()) => write!(f, "API error: \n{}", String::from_utf8_lossy(&body)),
            Err(err) => write!(f, "error marshaling API error: {err}"),
        }
    }
}

impl std::error::Error for ApiError {}
