use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{ConnectError, Connector, Method, RawResponse, TransportRequest};
use crate::error::SyncError;

/// [`Connector`] backed by a shared `reqwest` client.
pub struct ReqwestConnector {
    client: Client,
}

impl ReqwestConnector {
    /// Build a connector whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("catalog-mirror/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::transport("transport.new", e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Connector for ReqwestConnector {
    async fn execute(&self, request: &TransportRequest) -> Result<RawResponse, ConnectError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ConnectError(e.to_string()))?;
        let status = response.status().as_u16();
        // A body cut short mid-read is a network failure, not a bad response
        let body = response
            .bytes()
            .await
            .map_err(|e| ConnectError(format!("reading body: {}", e)))?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}
