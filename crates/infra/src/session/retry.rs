//! Retry policy engine
//!
//! Decides after every attempt whether to try again and how long to wait.
//! Only `GET` is ever retried. Paths matching an excluded pattern are never
//! retried. `429` on the rules API and `409` anywhere are always retried, and
//! a `429` carrying `X-RateLimit-Next` and `Date` waits exactly until the
//! advertised instant. Everything else is classified by a pluggable
//! [`BaseRetryPolicy`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta};
use propgrid_common::resilience::{BackoffStrategy, RetryDecision};
use propgrid_common::time_delta_millis;
use propgrid_common::validation::{Validate, ValidationError, Validator};
use propgrid_domain::constants::{HEADER_RATE_LIMIT_NEXT, HEADER_RETRY_AFTER, PAPI_PREFIX};
use reqwest::header::{HeaderMap, DATE};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::errors::{SessionError, SessionResult};
use super::pattern::{EndpointPattern, ExcludedEndpoints};
use super::request::RequestContext;

/// Retry settings
///
/// Waits are signed so that configuration files can express, and validation
/// can reject, negative values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: i32,
    #[serde(rename = "min_wait_ms", with = "time_delta_millis")]
    pub min_wait: TimeDelta,
    #[serde(rename = "max_wait_ms", with = "time_delta_millis")]
    pub max_wait: TimeDelta,
    /// Path patterns never retried, see [`super::pattern`] for the syntax
    pub excluded_endpoints: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            min_wait: TimeDelta::seconds(1),
            max_wait: TimeDelta::seconds(30),
            excluded_endpoints: Vec::new(),
        }
    }
}

impl Validate for RetryConfig {
    fn validate_into(&self, v: &mut Validator) {
        if self.max_retries < 0 {
            v.add_error("MaxRetries", "maximum number of retries cannot be negative");
        }
        if self.min_wait < TimeDelta::zero() {
            v.add_error("MinWait", "minimum retry wait time cannot be negative");
        }
        if self.max_wait < TimeDelta::zero() {
            v.add_error("MaxWait", "maximum retry wait time cannot be negative");
        } else if self.min_wait >= TimeDelta::zero() && self.max_wait < self.min_wait {
            v.add_error(
                "MaxWait",
                "maximum retry wait time cannot be shorter than minimum retry wait time",
            );
        }
        for (index, pattern) in self.excluded_endpoints.iter().enumerate() {
            if let Err(err) = EndpointPattern::new(pattern) {
                v.add_error(
                    &format!("ExcludedEndpoints[{index}]"),
                    format!("malformed exclude endpoint pattern: {err}: {pattern}"),
                );
            }
        }
    }
}

/// What came back from one attempt
#[derive(Debug, Clone, Copy)]
pub enum Outcome<'a> {
    Response { status: StatusCode, headers: &'a HeaderMap },
    /// No response; `retryable` marks transient transport failures
    Failed { retryable: bool },
}

/// One completed attempt, as seen by the retry policy
#[derive(Debug, Clone, Copy)]
pub struct Attempt<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub outcome: Outcome<'a>,
}

/// Classification applied when no special rule decides
pub trait BaseRetryPolicy: Send + Sync + fmt::Debug {
    fn decide(&self, attempt: &Attempt<'_>) -> RetryDecision;
}

/// Retries transient transport failures, `429` and `5xx` except `501`,
/// honouring an integer `Retry-After` on `429`/`503`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRetryPolicy;

impl BaseRetryPolicy for DefaultRetryPolicy {
    fn decide(&self, attempt: &Attempt<'_>) -> RetryDecision {
        match attempt.outcome {
            Outcome::Failed { retryable: true } => RetryDecision::Retry,
            Outcome::Failed { retryable: false } => RetryDecision::Stop,
            Outcome::Response { status, headers } => {
                let transient = status == StatusCode::TOO_MANY_REQUESTS
                    || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED);
                if !transient {
                    return RetryDecision::Stop;
                }
                if matches!(status, StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE)
                {
                    if let Some(wait) = retry_after(headers) {
                        return RetryDecision::RetryAfter(wait);
                    }
                }
                RetryDecision::Retry
            }
        }
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(HEADER_RETRY_AFTER)?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Validated, frozen retry policy owned by a session
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: BackoffStrategy,
    excluded: ExcludedEndpoints,
    base: Arc<dyn BaseRetryPolicy>,
}

impl RetryPolicy {
    /// Validate `config` and compile its patterns, reporting every violation
    pub fn new(config: &RetryConfig, base: Arc<dyn BaseRetryPolicy>) -> SessionResult<Self> {
        config.validate().map_err(SessionError::RetryConfig)?;

        let excluded = ExcludedEndpoints::compile(&config.excluded_endpoints).map_err(
            |(index, err)| {
                SessionError::RetryConfig(ValidationError::field(
                    format!("ExcludedEndpoints[{index}]"),
                    err.to_string(),
                ))
            },
        )?;

        Ok(Self {
            max_retries: u32::try_from(config.max_retries).unwrap_or_default(),
            backoff: BackoffStrategy::doubling(
                config.min_wait.to_std().unwrap_or_default(),
                config.max_wait.to_std().unwrap_or_default(),
            ),
            excluded,
            base,
        })
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Wait before the next attempt, or `None` to stop
    ///
    /// `retry` is the number of retries already made. An ended context is
    /// returned as an error so the caller surfaces it instead of the attempt.
    pub fn evaluate(
        &self,
        ctx: &RequestContext,
        attempt: &Attempt<'_>,
        retry: u32,
    ) -> SessionResult<Option<Duration>> {
        ctx.err()?;
        Ok(self.decide(attempt).delay(&self.backoff, retry))
    }

    /// Classify one attempt
    pub fn decide(&self, attempt: &Attempt<'_>) -> RetryDecision {
        if *attempt.method != Method::GET || self.excluded.is_excluded(attempt.path) {
            return RetryDecision::Stop;
        }

        let Outcome::Response { status, headers } = attempt.outcome else {
            return self.base.decide(attempt);
        };

        let forced = status == StatusCode::CONFLICT
            || (status == StatusCode::TOO_MANY_REQUESTS && attempt.path.starts_with(PAPI_PREFIX));
        let decision = match self.base.decide(attempt) {
            RetryDecision::Stop if forced => RetryDecision::Retry,
            decision => decision,
        };

        if decision != RetryDecision::Stop && status == StatusCode::TOO_MANY_REQUESTS {
            if let Some(wait) = rate_limit_backoff(headers) {
                return RetryDecision::RetryAfter(wait);
            }
        }
        decision
    }
}

/// Time between the response `Date` and `X-RateLimit-Next`
///
/// `Date` has second resolution, so the result may overshoot by up to a
/// second but never undershoots.
pub fn rate_limit_backoff(headers: &HeaderMap) -> Option<Duration> {
    let next_header = headers.get(HEADER_RATE_LIMIT_NEXT)?.to_str().ok()?;
    let next = match DateTime::parse_from_rfc3339(next_header) {
        Ok(next) => next,
        Err(err) => {
            error!(error = %err, value = next_header, "could not parse X-RateLimit-Next header");
            return None;
        }
    };

    let Some(date_header) = headers.get(DATE).and_then(|v| v.to_str().ok()) else {
        warn!(next = next_header, "no Date header for X-RateLimit-Next");
        return None;
    };
    let date = match DateTime::parse_from_rfc2822(date_header) {
        Ok(date) => date,
        Err(err) => {
            error!(error = %err, value = date_header, "could not parse Date header");
            return None;
        }
    };

    if next < date {
        warn!(next = next_header, date = date_header, "X-RateLimit-Next before Date");
        return None;
    }
    (next - date).to_std().ok()
}
