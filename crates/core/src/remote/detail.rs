use std::sync::Arc;

use tracing::debug;

use super::types::SeriesDetail;
use crate::config::RemoteConfig;
use crate::error::SyncError;
use crate::transport::{Transport, TransportRequest};

const OP: &str = "describe";
const CONSUMER_KEY_HEADER: &str = "X-Consumer-Key";

/// Looks up the long-form description of one series.
pub struct DetailEnricher {
    transport: Arc<Transport>,
    detail_base_url: String,
    consumer_key: String,
}

impl DetailEnricher {
    pub fn new(transport: Arc<Transport>, config: &RemoteConfig) -> Self {
        Self {
            transport,
            detail_base_url: config.detail_base_url.trim_end_matches('/').to_string(),
            consumer_key: config.consumer_key.clone(),
        }
    }

    pub fn detail_url(&self, id: &str) -> String {
        format!(
            "{}/api/comics/1/series/{}/?trans=en",
            self.detail_base_url,
            urlencoding::encode(id)
        )
    }

    /// Fetch the description for `id`.
    ///
    /// An empty string is a valid description. A missing, null or non-string
    /// `description` field is a decode error, never an empty default.
    pub async fn describe(&self, id: &str) -> Result<String, SyncError> {
        let request = TransportRequest::get(self.detail_url(id))
            .header(CONSUMER_KEY_HEADER, self.consumer_key.as_str());

        let raw = self
            .transport
            .send(&request)
            .await
            .map_err(|e| e.within(OP))?;

        let detail: SeriesDetail = serde_json::from_slice(&raw)
            .map_err(|e| SyncError::decode(OP, format!("series {}: {}", id, e)))?;

        debug!("Described series {} ({} bytes)", id, detail.description.len());
        Ok(detail.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockConnector, MockReply};
    use serde_json::json;

    fn enricher(connector: &Arc<MockConnector>) -> DetailEnricher {
        let transport = Arc::new(fixtures::transport(connector));
        DetailEnricher::new(transport, &fixtures::remote_config())
    }

    #[tokio::test]
    async fn test_describe_returns_description() {
        let connector = Arc::new(MockConnector::new());
        connector
            .push_reply(
                &fixtures::detail_url("s1"),
                MockReply::json(200, fixtures::detail("A dark knight returns.")),
            )
            .await;

        let description = enricher(&connector).describe("s1").await.unwrap();
        assert_eq!(description, "A dark knight returns.");
    }

    #[tokio::test]
    async fn test_describe_sends_consumer_key() {
        let connector = Arc::new(MockConnector::new());
        connector
            .push_reply(
                &fixtures::detail_url("s1"),
                MockReply::json(200, fixtures::detail("")),
            )
            .await;

        enricher(&connector).describe("s1").await.unwrap();

        let requests = connector.recorded_requests().await;
        assert_eq!(requests.len(), 1);
        assert!(requests[0]
            .headers
            .iter()
            .any(|(name, value)| name == "X-Consumer-Key" && value == fixtures::CONSUMER_KEY));
        assert!(requests[0].body.is_none());
    }

    #[tokio::test]
    async fn test_empty_description_is_valid() {
        let connector = Arc::new(MockConnector::new());
        connector
            .push_reply(
                &fixtures::detail_url("s1"),
                MockReply::json(200, fixtures::detail("")),
            )
            .await;

        assert_eq!(enricher(&connector).describe("s1").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_missing_description_is_decode_error() {
        let connector = Arc::new(MockConnector::new());
        connector
            .push_reply(
                &fixtures::detail_url("s1"),
                MockReply::json(200, json!({"title": "no description here"})),
            )
            .await;

        let err = enricher(&connector).describe("s1").await.unwrap_err();
        assert!(matches!(err, SyncError::Decode { .. }));
        assert!(!err.is_skippable());
    }

    #[tokio::test]
    async fn test_non_string_description_is_decode_error() {
        let connector = Arc::new(MockConnector::new());
        connector
            .push_reply(
                &fixtures::detail_url("s1"),
                MockReply::json(200, json!({"description": 42})),
            )
            .await;

        let err = enricher(&connector).describe("s1").await.unwrap_err();
        assert!(matches!(err, SyncError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_not_found_is_skippable() {
        let connector = Arc::new(MockConnector::new());
        connector
            .push_reply(&fixtures::detail_url("gone"), MockReply::json(404, json!({})))
            .await;

        let err = enricher(&connector).describe("gone").await.unwrap_err();
        assert!(err.is_skippable());
        assert_eq!(err.to_string(), "describe: transport.send: 404 Not Found");
    }

    #[test]
    fn test_detail_url_encodes_id() {
        let connector = Arc::new(MockConnector::new());
        let enricher = enricher(&connector);
        assert_eq!(
            enricher.detail_url("a b/c"),
            format!("{}/api/comics/1/series/a%20b%2Fc/?trans=en", fixtures::MOCK_BASE)
        );
    }
}
