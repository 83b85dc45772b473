//! Retrying, redirect-following transport
//!
//! The HTTP client is built with redirects disabled; this layer follows them
//! itself so every hop carries a fresh signature. Each attempt waits for a
//! rate-limit token, and the retry policy decides between attempts.

use std::sync::Arc;

use propgrid_common::resilience::RateLimiter;
use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::{Body, Client, Method, Request, Response, StatusCode};
use tracing::debug;

use super::errors::{SessionError, SessionResult};
use super::request::RequestContext;
use super::retry::{Attempt, Outcome, RetryPolicy};
use super::signer::Signer;

const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone)]
pub(crate) struct Transport {
    client: Client,
    signer: Arc<dyn Signer>,
    retry: Option<RetryPolicy>,
    limiter: Option<RateLimiter>,
    max_redirects: usize,
    http_tracing: bool,
}

impl Transport {
    pub(crate) fn new(
        client: Client,
        signer: Arc<dyn Signer>,
        retry: Option<RetryPolicy>,
        limiter: Option<RateLimiter>,
        max_redirects: usize,
        http_tracing: bool,
    ) -> Self {
        Self { client, signer, retry, limiter, max_redirects, http_tracing }
    }

    pub(crate) fn signer(&self) -> &dyn Signer {
        self.signer.as_ref()
    }

    /// Send `request`, retrying per policy; the last attempt's response or
    /// error is returned as is once retries stop
    pub(crate) async fn send(
        &self,
        ctx: &RequestContext,
        request: Request,
    ) -> SessionResult<Response> {
        let mut retry = 0u32;

        loop {
            let attempt = request.try_clone().ok_or_else(|| {
                SessionError::InvalidArgument("request body cannot be replayed".to_string())
            })?;

            if let Some(limiter) = &self.limiter {
                ctx.run(limiter.acquire()).await?;
            }
            let result = ctx.run(self.dispatch(attempt)).await?;

            let Some(policy) = &self.retry else {
                return result;
            };

            // Exclusions match the path that produced the response, i.e. the last redirect hop.
            let (path, outcome) = match &result {
                Ok(response) => (
                    response.url().path(),
                    Some(Outcome::Response { status: response.status(), headers: response.headers() }),
                ),
                Err(SessionError::Transport(err)) => {
                    (request.url().path(), Some(Outcome::Failed { retryable: is_transient(err) }))
                }
                Err(_) => (request.url().path(), None),
            };
            let Some(outcome) = outcome else {
                return result;
            };

            let attempt = Attempt { method: request.method(), path, outcome };
            let Some(wait) = policy.evaluate(ctx, &attempt, retry)? else {
                return result;
            };
            if retry >= policy.max_retries() {
                debug!(retries = retry, "retries exhausted");
                return result;
            }

            match &result {
                Ok(response) => debug!(
                    retry = retry + 1,
                    status = response.status().as_u16(),
                    wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                    "retrying request"
                ),
                Err(err) => debug!(
                    retry = retry + 1,
                    error = %err,
                    wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                    "retrying request"
                ),
            }
            drop(result);

            ctx.sleep(wait).await?;
            retry += 1;
        }
    }

    /// One attempt: sign, send, and follow redirects re-signing each hop
    async fn dispatch(&self, mut request: Request) -> SessionResult<Response> {
        let mut redirects = 0usize;

        loop {
            request.headers_mut().remove(AUTHORIZATION);
            self.signer.sign(&mut request)?;
            if self.http_tracing {
                trace_request(&request);
            }

            let replay = request.try_clone();
            let response = self.client.execute(request).await?;
            let status = response.status();

            let Some(location) = redirect_location(&response) else {
                return Ok(response);
            };
            let Some(mut next) = replay else {
                return Ok(response);
            };
            if redirects >= self.max_redirects {
                return Err(SessionError::TooManyRedirects(redirects));
            }
            redirects += 1;

            let target = response.url().join(&location)?;
            debug!(status = status.as_u16(), from = %response.url(), to = %target, "following redirect");
            *next.url_mut() = target;

            let switch_to_get = matches!(
                status,
                StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER
            ) && next.method() != Method::HEAD;
            if switch_to_get {
                *next.method_mut() = Method::GET;
                *next.body_mut() = None;
                next.headers_mut().remove(CONTENT_LENGTH);
                next.headers_mut().remove(CONTENT_TYPE);
            }

            request = next;
        }
    }
}

fn redirect_location(response: &Response) -> Option<String> {
    let followed = matches!(
        response.status(),
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    );
    if !followed {
        return None;
    }
    response.headers().get(LOCATION)?.to_str().ok().map(str::to_string)
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || err.is_request() || err.is_body()
}

pub(crate) fn format_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if name == AUTHORIZATION {
                REDACTED.into()
            } else {
                String::from_utf8_lossy(value.as_bytes())
            };
            format!("{name}: {value}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn trace_request(request: &Request) {
    let body = request
        .body()
        .and_then(Body::as_bytes)
        .map(String::from_utf8_lossy)
        .unwrap_or_default();
    debug!(
        method = %request.method(),
        url = %request.url(),
        headers = %format_headers(request.headers()),
        body = %body,
        "http request"
    );
}
