//! Shared helpers for infra integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::TimeDelta;
use propgrid_infra::session::{RetryConfig, Session, SessionBuilder, SignError, Signer};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use wiremock::MockServer;

/// Signer that stamps a numbered, path-scoped marker into `Authorization`
#[derive(Debug, Default)]
pub struct TestSigner {
    count: AtomicUsize,
}

impl TestSigner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn signatures(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Signer for TestSigner {
    fn sign(&self, request: &mut reqwest::Request) -> Result<(), SignError> {
        let n = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        let value = format!("test-signature {n} {}", request.url().path());
        request.headers_mut().insert(AUTHORIZATION, HeaderValue::from_str(&value)?);
        Ok(())
    }
}

/// Session builder pointed at `server`
pub fn builder(server: &MockServer, signer: Arc<TestSigner>) -> SessionBuilder {
    Session::builder().base_url(server.uri()).signer(signer)
}

/// Session without retries
pub fn session(server: &MockServer, signer: Arc<TestSigner>) -> Arc<Session> {
    Arc::new(builder(server, signer).build().expect("session should build"))
}

/// Retry settings with millisecond waits
pub fn fast_retries(max_retries: i32) -> RetryConfig {
    RetryConfig {
        max_retries,
        min_wait: TimeDelta::milliseconds(1),
        max_wait: TimeDelta::milliseconds(5),
        excluded_endpoints: Vec::new(),
    }
}

/// Authorization headers received by `server`, in order
pub async fn authorizations(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|r| r.headers.get("authorization").and_then(|v| v.to_str().ok()).map(str::to_string))
        .collect()
}

pub async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map_or(0, |requests| requests.len())
}
