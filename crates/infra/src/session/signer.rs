//! Request signing
//!
//! The session signs every outgoing request, including each redirect hop,
//! through the [`Signer`] capability. [`EdgeGridSigner`] implements the
//! EG1-HMAC-SHA256 scheme used by the configuration APIs.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderValue, InvalidHeaderValue, AUTHORIZATION};
use reqwest::{Method, Request};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

const AUTH_SCHEME: &str = "EG1-HMAC-SHA256";
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H:%M:%S+0000";
const ACCOUNT_SWITCH_KEY: &str = "accountSwitchKey";

/// Largest POST body prefix included in the content hash by default
pub const DEFAULT_MAX_BODY: usize = 131_072;

#[derive(Debug, Error)]
pub enum SignError {
    #[error("request body is streamed and cannot be hashed")]
    UnbufferedBody,

    #[error("request url has no host")]
    MissingHost,

    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("invalid authorization header: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),
}

/// Computes authentication headers for an outgoing request
pub trait Signer: Send + Sync + fmt::Debug {
    /// Attach authentication to `request`, replacing any previous signature
    fn sign(&self, request: &mut Request) -> Result<(), SignError>;
}

/// API client credentials
#[derive(Clone, PartialEq, Eq)]
pub struct EdgeGridCredentials {
    /// API hostname without scheme, e.g. `akab-xxx.luna.akamaiapis.net`
    pub host: String,
    pub client_token: String,
    pub client_secret: String,
    pub access_token: String,
    /// Headers whose values are covered by the signature
    pub headers_to_sign: Vec<String>,
    pub max_body: usize,
    /// Account to act on behalf of, sent as `accountSwitchKey`
    pub account_key: Option<String>,
}

impl EdgeGridCredentials {
    pub fn new(
        host: impl Into<String>,
        client_token: impl Into<String>,
        client_secret: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            client_token: client_token.into(),
            client_secret: client_secret.into(),
            access_token: access_token.into(),
            headers_to_sign: Vec::new(),
            max_body: DEFAULT_MAX_BODY,
            account_key: None,
        }
    }

    pub fn with_account_key(mut self, account_key: impl Into<String>) -> Self {
        self.account_key = Some(account_key.into());
        self
    }

    pub fn with_headers_to_sign<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers_to_sign = headers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_body(mut self, max_body: usize) -> Self {
        self.max_body = max_body;
        self
    }

    /// Base URL derived from `host`
    pub fn base_url(&self) -> String {
        if self.host.contains("://") {
            self.host.clone()
        } else {
            format!("https://{}", self.host)
        }
    }
}

impl fmt::Debug for EdgeGridCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeGridCredentials")
            .field("host", &self.host)
            .field("client_token", &self.client_token)
            .field("client_secret", &"[REDACTED]")
            .field("access_token", &self.access_token)
            .field("headers_to_sign", &self.headers_to_sign)
            .field("max_body", &self.max_body)
            .field("account_key", &self.account_key)
            .finish()
    }
}

/// EG1-HMAC-SHA256 signer
#[derive(Debug, Clone)]
pub struct EdgeGridSigner {
    credentials: EdgeGridCredentials,
}

impl EdgeGridSigner {
    pub fn new(credentials: EdgeGridCredentials) -> Self {
        Self { credentials }
    }

    pub fn credentials(&self) -> &EdgeGridCredentials {
        &self.credentials
    }

    /// Authorization header value for `request` at a fixed timestamp and nonce
    pub fn authorization(
        &self,
        request: &Request,
        timestamp: &str,
        nonce: &str,
    ) -> Result<String, SignError> {
        let creds = &self.credentials;
        let unsigned = format!(
            "{AUTH_SCHEME} client_token={};access_token={};timestamp={timestamp};nonce={nonce};",
            creds.client_token, creds.access_token
        );

        let signing_key = hmac_base64(creds.client_secret.as_bytes(), timestamp.as_bytes())?;
        let data = self.data_to_sign(request, &unsigned)?;
        let signature = hmac_base64(signing_key.as_bytes(), data.as_bytes())?;

        Ok(format!("{unsigned}signature={signature}"))
    }

    fn data_to_sign(&self, request: &Request, unsigned: &str) -> Result<String, SignError> {
        let url = request.url();
        let host = url.host_str().ok_or(SignError::MissingHost)?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let mut path = url.path().to_string();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }

        Ok([
            request.method().as_str(),
            url.scheme(),
            host.as_str(),
            path.as_str(),
            self.canonical_headers(request).as_str(),
            self.content_hash(request)?.as_str(),
            unsigned,
        ]
        .join("\t"))
    }

    fn canonical_headers(&self, request: &Request) -> String {
        self.credentials
            .headers_to_sign
            .iter()
            .filter_map(|name| {
                let value = request.headers().get(name.as_str())?;
                let value = String::from_utf8_lossy(value.as_bytes());
                let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
                Some(format!("{}:{collapsed}", name.to_ascii_lowercase()))
            })
            .collect::<Vec<_>>()
            .join("\t")
    }

    fn content_hash(&self, request: &Request) -> Result<String, SignError> {
        if request.method() != Method::POST {
            return Ok(String::new());
        }
        let Some(body) = request.body() else {
            return Ok(String::new());
        };
        let bytes = body.as_bytes().ok_or(SignError::UnbufferedBody)?;
        if bytes.is_empty() {
            return Ok(String::new());
        }

        let end = bytes.len().min(self.credentials.max_body);
        Ok(STANDARD.encode(Sha256::digest(&bytes[..end])))
    }
}

impl Signer for EdgeGridSigner {
    fn sign(&self, request: &mut Request) -> Result<(), SignError> {
        if let Some(account_key) = &self.credentials.account_key {
            let present = request.url().query_pairs().any(|(key, _)| key == ACCOUNT_SWITCH_KEY);
            if !present {
                super::canonicalize_query(
                    request.url_mut(),
                    &[(ACCOUNT_SWITCH_KEY.to_string(), account_key.clone())],
                );
            }
        }

        let timestamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let nonce = Uuid::new_v4().to_string();
        let header = self.authorization(request, &timestamp, &nonce)?;

        request.headers_mut().insert(AUTHORIZATION, HeaderValue::from_str(&header)?);
        Ok(())
    }
}

fn hmac_base64(key: &[u8], data: &[u8]) -> Result<String, SignError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| SignError::InvalidKey(e.to_string()))?;
    mac.update(data);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
