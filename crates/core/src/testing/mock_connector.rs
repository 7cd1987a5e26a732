//! Mock connector for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::transport::{ConnectError, Connector, Method, RawResponse, TransportRequest};

/// Scripted outcome of one exchange.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Respond with a status and raw body.
    Response { status: u16, body: Vec<u8> },
    /// Fail at the network level.
    ConnectFailure(String),
}

impl MockReply {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self::Response {
            status,
            body: body.to_string().into_bytes(),
        }
    }

    pub fn raw(status: u16, body: Vec<u8>) -> Self {
        Self::Response { status, body }
    }

    pub fn connect_failure(message: &str) -> Self {
        Self::ConnectFailure(message.to_string())
    }
}

/// Mock implementation of the [`Connector`] trait.
///
/// Replies are scripted per URL: queued replies are consumed first in FIFO
/// order, then the URL's default reply (if any) is served for every further
/// request. A URL with neither fails like an unreachable host.
///
/// # Example
///
/// ```rust,ignore
/// use mirror_core::testing::{MockConnector, MockReply};
///
/// let connector = MockConnector::new();
/// connector.push_reply(url, MockReply::connect_failure("refused")).await;
/// connector.push_reply(url, MockReply::json(200, body)).await;
///
/// // ... run the code under test ...
///
/// assert_eq!(connector.request_count().await, 2);
/// ```
#[derive(Debug)]
pub struct MockConnector {
    /// Queued replies by URL.
    queued: Arc<RwLock<HashMap<String, VecDeque<MockReply>>>>,
    /// Fallback replies by URL.
    defaults: Arc<RwLock<HashMap<String, MockReply>>>,
    /// Every request seen, in order.
    requests: Arc<RwLock<Vec<TransportRequest>>>,
    /// Simulated latency per exchange.
    latency: Arc<RwLock<Duration>>,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnector {
    /// Create a new mock connector with nothing scripted.
    pub fn new() -> Self {
        Self {
            queued: Arc::new(RwLock::new(HashMap::new())),
            defaults: Arc::new(RwLock::new(HashMap::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
            latency: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Queue a one-shot reply for `url`.
    pub async fn push_reply(&self, url: &str, reply: MockReply) {
        self.queued
            .write()
            .await
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Reply served for `url` once its queue is empty.
    pub async fn set_default_reply(&self, url: &str, reply: MockReply) {
        self.defaults.write().await.insert(url.to_string(), reply);
    }

    /// Delay every exchange by `latency`.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = latency;
    }

    /// Get all recorded requests.
    pub async fn recorded_requests(&self) -> Vec<TransportRequest> {
        self.requests.read().await.clone()
    }

    /// Get the number of requests made.
    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Requests made to `url`.
    pub async fn requests_to(&self, url: &str) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    /// Page numbers of every search POST, in request order.
    pub async fn search_pages_requested(&self) -> Vec<u32> {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.method == Method::Post)
            .filter_map(|r| r.body.as_deref())
            .filter_map(|body| serde_json::from_slice::<serde_json::Value>(body).ok())
            .filter_map(|body| body["page"].as_u64())
            .map(|page| page as u32)
            .collect()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn execute(&self, request: &TransportRequest) -> Result<RawResponse, ConnectError> {
        self.requests.write().await.push(request.clone());

        let latency = *self.latency.read().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let queued = self
            .queued
            .write()
            .await
            .get_mut(&request.url)
            .and_then(|queue| queue.pop_front());
        let reply = match queued {
            Some(reply) => Some(reply),
            None => self.defaults.read().await.get(&request.url).cloned(),
        };

        match reply {
            Some(MockReply::Response { status, body }) => Ok(RawResponse { status, body }),
            Some(MockReply::ConnectFailure(message)) => Err(ConnectError(message)),
            None => Err(ConnectError(format!("no route to {}", request.url))),
        }
    }
}
