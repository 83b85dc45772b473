//! Request descriptor, response envelope and per-call context

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use propgrid_domain::ApiError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use super::errors::{SessionError, SessionResult};

/// Per-call context: ambient header overrides, a logging span, and the
/// cancellation/deadline that bound every suspension point of the call.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    headers: HeaderMap,
    span: Option<Span>,
    cancellation: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header applied to every request made with this context, unless
    /// the request sets the same header itself
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Log under `span` instead of the session's span
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// `Err` once the context is cancelled or past its deadline
    pub fn err(&self) -> SessionResult<()> {
        if self.cancellation.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(SessionError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(SessionError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the context ends first
    pub async fn run<F>(&self, fut: F) -> SessionResult<F::Output>
    where
        F: Future,
    {
        self.err()?;

        let cancelled = async {
            match &self.cancellation {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = cancelled => Err(SessionError::Cancelled),
            () = expired => Err(SessionError::DeadlineExceeded),
            output = fut => Ok(output),
        }
    }

    /// Sleep for `duration`, waking early with an error if the context ends
    pub async fn sleep(&self, duration: Duration) -> SessionResult<()> {
        self.run(tokio::time::sleep(duration)).await
    }
}

/// Description of one logical API call, relative to the session base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path, optionally with a query string, e.g. `/papi/v1/rule-formats`
    pub path: String,
    /// Extra query parameters merged with any already in `path`
    pub query: Vec<(String, String)>,
    /// Explicit headers; these always win over context and defaults
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), headers: Vec::new() }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub(crate) fn header_map(&self) -> SessionResult<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SessionError::InvalidArgument(format!("header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                SessionError::InvalidArgument(format!("header value for {name}: {e}"))
            })?;
            map.append(name, value);
        }
        Ok(map)
    }
}

/// Outcome of an executed call: status, headers, the buffered body and,
/// for decodable successes, the typed payload
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the buffered body as an API error, keeping the status even when
    /// the body is not a problem document
    pub fn api_error(&self) -> ApiError {
        ApiError::from_response(&self.body, self.status.as_u16())
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes_without_limits() {
        let ctx = RequestContext::new();
        assert_eq!(ctx.run(async { 7 }).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_cancelled_context_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = RequestContext::new().with_cancellation(token);

        assert!(matches!(ctx.err(), Err(SessionError::Cancelled)));
        assert!(matches!(ctx.run(async { 1 }).await, Err(SessionError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_interrupts_sleep() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(50));
        let started = Instant::now();

        let result = ctx.sleep(Duration::from_secs(60)).await;

        assert!(matches!(result, Err(SessionError::DeadlineExceeded)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_sleep() {
        let token = CancellationToken::new();
        let ctx = RequestContext::new().with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let result = ctx.sleep(Duration::from_secs(30)).await;
        assert!(matches!(result, Err(SessionError::Cancelled)));
        canceller.await.unwrap();
    }

    #[test]
    fn test_deadline_keeps_earliest() {
        let now = Instant::now();
        let ctx = RequestContext::new()
            .with_deadline(now + Duration::from_secs(5))
            .with_deadline(now + Duration::from_secs(10));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(5)));
    }

    #[test]
    fn test_invalid_header_is_argument_error() {
        let request = ApiRequest::get("/x").header("bad header", "v");
        assert!(matches!(request.header_map(), Err(SessionError::InvalidArgument(_))));
    }

    #[test]
    fn test_api_error_keeps_status_for_garbage_body() {
        let response: ApiResponse<()> = ApiResponse {
            status: StatusCode::BAD_GATEWAY,
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"<html>"),
            data: None,
        };
        let err = response.api_error();
        assert_eq!(err.status_code, 502);
        assert!(err.title.is_empty());
    }
}
