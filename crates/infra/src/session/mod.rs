//! HTTP session: the execution pipeline shared by every endpoint method
//!
//! A [`Session`] is built once, is immutable afterwards, and can be shared
//! across concurrent calls. Each call goes through the same steps:
//! 1. Merge headers (explicit request headers, then context headers, then
//!    defaults) and canonicalize the query string
//! 2. Serialize the optional JSON body
//! 3. Sign and dispatch through the retrying transport
//! 4. Buffer the body and decode it for 2xx statuses other than 204/205

pub mod errors;
pub mod pattern;
pub mod request;
pub mod retry;
pub mod signer;
mod transport;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use propgrid_common::resilience::RateLimiter;
use propgrid_domain::constants::MEDIA_TYPE_JSON;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Body, Client, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info_span, Instrument, Span};
use url::Url;

pub use errors::{SessionError, SessionResult};
pub use request::{ApiRequest, ApiResponse, RequestContext};
pub use retry::{
    rate_limit_backoff, Attempt, BaseRetryPolicy, DefaultRetryPolicy, Outcome, RetryConfig,
    RetryPolicy,
};
pub use signer::{EdgeGridCredentials, EdgeGridSigner, SignError, Signer};

use crate::config::SessionConfig;
use transport::{format_headers, Transport};

/// Default `User-Agent`
pub const DEFAULT_USER_AGENT: &str = concat!("propgrid/", env!("CARGO_PKG_VERSION"));

/// Redirects followed per attempt before giving up
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Signed, retrying HTTP session
#[derive(Clone)]
pub struct Session {
    base_url: Url,
    transport: Transport,
    user_agent: HeaderValue,
    span: Span,
    http_tracing: bool,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Span for `ctx`, falling back to the session span
    pub fn log(&self, ctx: &RequestContext) -> Span {
        ctx.span().cloned().unwrap_or_else(|| self.span.clone())
    }

    /// Sign a request the caller will dispatch itself
    pub fn sign(&self, request: &mut Request) -> SessionResult<()> {
        self.transport.signer().sign(request)?;
        Ok(())
    }

    /// Execute `request` and decode a successful JSON response into `T`
    pub async fn exec<T>(
        &self,
        ctx: &RequestContext,
        request: ApiRequest,
    ) -> SessionResult<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        self.execute(ctx, request, None, true).await
    }

    /// Execute `request` with a JSON body and decode the response into `T`
    pub async fn exec_with_body<T, B>(
        &self,
        ctx: &RequestContext,
        request: ApiRequest,
        body: &B,
    ) -> SessionResult<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(body).map_err(SessionError::Marshaling)?;
        self.execute(ctx, request, Some(body), true).await
    }

    /// Execute `request` without decoding; the body stays in the envelope
    pub async fn exec_raw(
        &self,
        ctx: &RequestContext,
        request: ApiRequest,
        body: Option<Vec<u8>>,
    ) -> SessionResult<ApiResponse<()>> {
        self.execute(ctx, request, body, false).await
    }

    async fn execute<T>(
        &self,
        ctx: &RequestContext,
        request: ApiRequest,
        body: Option<Vec<u8>>,
        decode: bool,
    ) -> SessionResult<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let span = self.log(ctx);
        async move {
            ctx.err()?;

            let http_request = self.build_request(ctx, &request, body)?;
            let response = self.transport.send(ctx, http_request).await?;

            let status = response.status();
            let headers = response.headers().clone();
            let bytes = ctx.run(response.bytes()).await??;

            if self.http_tracing {
                debug!(
                    status = status.as_u16(),
                    headers = %format_headers(&headers),
                    body = %String::from_utf8_lossy(&bytes),
                    "http response"
                );
            }

            let data = if decode && expects_body(status) {
                let value = serde_json::from_slice(&bytes).map_err(|source| {
                    SessionError::Unmarshaling { source, status: status.as_u16(), body: bytes.clone() }
                })?;
                Some(value)
            } else {
                None
            };

            Ok(ApiResponse { status, headers, body: bytes, data })
        }
        .instrument(span)
        .await
    }

    fn build_request(
        &self,
        ctx: &RequestContext,
        request: &ApiRequest,
        body: Option<Vec<u8>>,
    ) -> SessionResult<Request> {
        let mut url = self.base_url.join(&request.path)?;
        canonicalize_query(&mut url, &request.query);

        let mut http_request = Request::new(request.method.clone(), url);
        let headers = http_request.headers_mut();
        *headers = request.header_map()?;

        for name in ctx.headers().keys() {
            if headers.contains_key(name) {
                continue;
            }
            for value in ctx.headers().get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        headers.entry(USER_AGENT).or_insert_with(|| self.user_agent.clone());
        headers.entry(CONTENT_TYPE).or_insert(HeaderValue::from_static(MEDIA_TYPE_JSON));
        headers.entry(ACCEPT).or_insert(HeaderValue::from_static(MEDIA_TYPE_JSON));

        if let Some(body) = body {
            *http_request.body_mut() = Some(Body::from(body));
        }
        Ok(http_request)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url.as_str())
            .field("user_agent", &self.user_agent)
            .field("http_tracing", &self.http_tracing)
            .finish_non_exhaustive()
    }
}

fn expects_body(status: StatusCode) -> bool {
    status.is_success() && status != StatusCode::NO_CONTENT && status != StatusCode::RESET_CONTENT
}

/// Re-encode the query sorted by key, appending `extra` pairs first
fn canonicalize_query(url: &mut Url, extra: &[(String, String)]) {
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    pairs.extend(extra.iter().cloned());
    if pairs.is_empty() {
        url.set_query(None);
        return;
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    url.query_pairs_mut().clear().extend_pairs(pairs);
}

fn parse_base_url(raw: &str) -> SessionResult<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(SessionError::InvalidArgument("base url is required".to_string()));
    }
    if raw.contains("://") {
        Ok(Url::parse(raw)?)
    } else {
        Ok(Url::parse(&format!("https://{raw}"))?)
    }
}

/// Builder for [`Session`]
pub struct SessionBuilder {
    base_url: Option<String>,
    signer: Option<Arc<dyn Signer>>,
    user_agent: Option<String>,
    span: Option<Span>,
    request_limit: u32,
    http_tracing: bool,
    timeout: Option<Duration>,
    retry: Option<RetryConfig>,
    base_policy: Option<Arc<dyn BaseRetryPolicy>>,
    max_redirects: usize,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            signer: None,
            user_agent: None,
            span: None,
            request_limit: 0,
            http_tracing: false,
            timeout: None,
            retry: None,
            base_policy: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("base_url", &self.base_url)
            .field("signer", &self.signer)
            .field("user_agent", &self.user_agent)
            .field("request_limit", &self.request_limit)
            .field("http_tracing", &self.http_tracing)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("max_redirects", &self.max_redirects)
            .finish_non_exhaustive()
    }
}

impl SessionBuilder {
    /// API base URL; `https://` is assumed when no scheme is given
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Sign with EdgeGrid credentials and target their host
    pub fn edgegrid(mut self, credentials: EdgeGridCredentials) -> Self {
        self.base_url = Some(credentials.base_url());
        self.signer = Some(Arc::new(EdgeGridSigner::new(credentials)));
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Default span for calls whose context carries none
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Maximum requests per second across the session; `0` disables the cap
    pub fn request_limit(mut self, limit: u32) -> Self {
        self.request_limit = limit;
        self
    }

    /// Log full requests and responses at debug level
    pub fn http_tracing(mut self, enabled: bool) -> Self {
        self.http_tracing = enabled;
        self
    }

    /// Per-request timeout of the underlying HTTP client
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable retries
    pub fn retries(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }

    /// Replace the classification used when no special retry rule applies
    pub fn base_retry_policy(mut self, policy: Arc<dyn BaseRetryPolicy>) -> Self {
        self.base_policy = Some(policy);
        self
    }

    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Apply a loaded configuration; empty optional values are left unset
    pub fn config(mut self, config: SessionConfig) -> Self {
        if !config.base_url.is_empty() {
            self.base_url = Some(config.base_url);
        }
        if let Some(user_agent) = config.user_agent {
            self.user_agent = Some(user_agent);
        }
        self.request_limit = config.request_limit;
        self.http_tracing = config.http_tracing;
        if let Some(secs) = config.timeout_secs.filter(|secs| *secs > 0) {
            self.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(retry) = config.retry {
            self.retry = Some(retry);
        }
        self
    }

    /// Validate the settings and build the session
    ///
    /// # Errors
    /// `InvalidArgument` for a missing base URL, signer or user agent,
    /// `RetryConfig` listing every retry setting violation, `Client` when the
    /// HTTP client cannot be created.
    pub fn build(self) -> SessionResult<Session> {
        let base_url = parse_base_url(self.base_url.as_deref().unwrap_or_default())?;
        let signer = self
            .signer
            .ok_or_else(|| SessionError::InvalidArgument("signer is required".to_string()))?;

        let user_agent = self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        if user_agent.trim().is_empty() {
            return Err(SessionError::InvalidArgument("user agent cannot be empty".to_string()));
        }
        let user_agent = HeaderValue::from_str(&user_agent)
            .map_err(|e| SessionError::InvalidArgument(format!("user agent: {e}")))?;

        let retry = self
            .retry
            .map(|config| {
                let base = self.base_policy.unwrap_or_else(|| Arc::new(DefaultRetryPolicy));
                RetryPolicy::new(&config, base)
            })
            .transpose()?;

        let limiter = if self.request_limit > 0 {
            Some(RateLimiter::per_second(self.request_limit).map_err(SessionError::InvalidArgument)?)
        } else {
            None
        };

        let mut client = Client::builder().redirect(Policy::none());
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }
        let client = client.build().map_err(SessionError::Client)?;

        debug!(
            base_url = %base_url,
            retries = retry.as_ref().map_or(0, RetryPolicy::max_retries),
            request_limit = self.request_limit,
            "session created"
        );

        Ok(Session {
            base_url,
            transport: Transport::new(
                client,
                signer,
                retry,
                limiter,
                self.max_redirects,
                self.http_tracing,
            ),
            user_agent,
            span: self.span.unwrap_or_else(|| info_span!("propgrid.session")),
            http_tracing: self.http_tracing,
        })
    }
}
