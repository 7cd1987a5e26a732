//! Outbound HTTP with one bounded retry.
//!
//! [`Transport`] owns the retry and status classification policy; the actual
//! I/O happens behind the [`Connector`] trait so the policy can be exercised
//! without a network ([`crate::testing::MockConnector`]).

mod pacer;
mod reqwest_connector;

pub use pacer::Pacer;
pub use reqwest_connector::ReqwestConnector;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::metrics;

const OP: &str = "transport.send";

/// HTTP method of a [`TransportRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A single outbound request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// JSON body, POST only.
    pub body: Option<Vec<u8>>,
}

impl TransportRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(body),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Status and payload of a completed exchange, before classification.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Network-level failure: refused connection, timeout, DNS, truncated body.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConnectError(pub String);

/// Performs one HTTP exchange.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn execute(&self, request: &TransportRequest) -> Result<RawResponse, ConnectError>;
}

/// Retry-once transport shared by the page fetcher and the detail enricher.
pub struct Transport {
    connector: Arc<dyn Connector>,
    retry_delay: Duration,
}

impl Transport {
    pub fn new(connector: Arc<dyn Connector>, retry_delay: Duration) -> Self {
        Self {
            connector,
            retry_delay,
        }
    }

    /// Send a request and return the body of a 2xx response.
    ///
    /// A network failure is retried exactly once after `retry_delay`; a second
    /// failure is a [`SyncError::Transport`]. A non-success status is returned
    /// immediately as [`SyncError::ApiResponse`] without retrying.
    pub async fn send(&self, request: &TransportRequest) -> Result<Vec<u8>, SyncError> {
        let started = Instant::now();
        debug!("{:?} {}", request.method, request.url);

        let response = match self.connector.execute(request).await {
            Ok(response) => response,
            Err(first) => {
                warn!(
                    "Request to {} failed ({}), retrying in {:?}",
                    request.url, first, self.retry_delay
                );
                metrics::TRANSPORT_RETRIES.inc();
                sleep(self.retry_delay).await;

                self.connector.execute(request).await.map_err(|e| {
                    metrics::REMOTE_REQUESTS
                        .with_label_values(&["transport_error"])
                        .inc();
                    SyncError::transport(OP, format!("{} (after one retry): {}", request.url, e))
                })?
            }
        };

        metrics::REMOTE_REQUEST_DURATION.observe(started.elapsed().as_secs_f64());

        if !(200..300).contains(&response.status) {
            metrics::REMOTE_REQUESTS
                .with_label_values(&["api_error"])
                .inc();
            return Err(SyncError::api_response(
                OP,
                response.status,
                status_text(response.status),
            ));
        }

        metrics::REMOTE_REQUESTS.with_label_values(&["success"]).inc();
        Ok(response.body)
    }
}

/// `"404 Not Found"` style status line.
fn status_text(code: u16) -> String {
    match StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason())
    {
        Some(reason) => format!("{} {}", code, reason),
        None => code.to_string(),
    }
}
