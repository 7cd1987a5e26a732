use std::sync::Arc;

use futures::stream::{self, Stream, TryStreamExt};
use tracing::{debug, info, warn};

use super::types::{SearchRequestBody, SearchResponse};
use crate::config::RemoteConfig;
use crate::error::SyncError;
use crate::metrics;
use crate::mirror::SearchPage;
use crate::transport::{Pacer, Transport, TransportRequest};

const OP: &str = "fetch_page";

enum Cursor {
    First,
    Next { page: u32, total_pages: u32 },
}

/// Walks the bulk search endpoint page by page.
pub struct PageFetcher {
    transport: Arc<Transport>,
    pacer: Arc<Pacer>,
    search_url: String,
    engine_key: String,
    page_size: u32,
}

impl PageFetcher {
    pub fn new(transport: Arc<Transport>, pacer: Arc<Pacer>, config: &RemoteConfig) -> Self {
        Self {
            transport,
            pacer,
            search_url: config.search_url.clone(),
            engine_key: config.engine_key.clone(),
            page_size: config.page_size,
        }
    }

    /// Fetch and decode a single page (1-based).
    pub async fn fetch_page(&self, page: u32) -> Result<SearchPage, SyncError> {
        self.pacer.wait().await;

        let body = serde_json::to_vec(&SearchRequestBody::new(
            &self.engine_key,
            page,
            self.page_size,
        ))
        .map_err(|e| SyncError::decode(OP, e.to_string()))?;

        let request = TransportRequest::post_json(&self.search_url, body);
        let raw = self
            .transport
            .send(&request)
            .await
            .map_err(|e| e.within(OP))?;

        let response: SearchResponse = serde_json::from_slice(&raw)
            .map_err(|e| SyncError::decode(OP, format!("page {}: {}", page, e)))?;
        debug!(
            "Search page {} decoded, record_count={}",
            page, response.record_count
        );
        metrics::PAGES_FETCHED.inc();

        Ok(SearchPage::from(response))
    }

    /// Every page of the catalog, in order.
    ///
    /// Page 1's `total_pages` bounds the walk; later pages reporting a
    /// different total are logged and otherwise ignored. The first error ends
    /// the stream. Nothing is requested until the stream is polled, so a
    /// consumer can stop between pages.
    pub fn fetch_all(&self) -> impl Stream<Item = Result<SearchPage, SyncError>> + '_ {
        stream::try_unfold(Cursor::First, move |cursor| self.advance(cursor))
    }

    async fn advance(&self, cursor: Cursor) -> Result<Option<(SearchPage, Cursor)>, SyncError> {
        match cursor {
            Cursor::First => {
                let first = self.fetch_page(1).await?;
                let total_pages = first.total_pages;
                info!(
                    "Retrieving records 1/{} ({} series)",
                    total_pages, first.total_results
                );
                Ok(Some((
                    first,
                    Cursor::Next {
                        page: 2,
                        total_pages,
                    },
                )))
            }
            Cursor::Next { page, total_pages } if page <= total_pages => {
                info!("Retrieving records {}/{}", page, total_pages);
                let next = self.fetch_page(page).await?;
                if next.total_pages != total_pages {
                    warn!(
                        "Page {} reports {} pages, keeping {} from page 1",
                        page, next.total_pages, total_pages
                    );
                }
                Ok(Some((
                    next,
                    Cursor::Next {
                        page: page + 1,
                        total_pages,
                    },
                )))
            }
            Cursor::Next { .. } => Ok(None),
        }
    }

    /// Collect [`PageFetcher::fetch_all`] into memory.
    pub async fn fetch_all_pages(&self) -> Result<Vec<SearchPage>, SyncError> {
        self.fetch_all().try_collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockConnector, MockReply};
    use futures::StreamExt;
    use serde_json::json;

    fn fetcher(connector: &Arc<MockConnector>) -> PageFetcher {
        let config = fixtures::remote_config();
        let transport = Arc::new(fixtures::transport(connector));
        PageFetcher::new(transport, Arc::new(fixtures::pacer("search")), &config)
    }

    async fn push_pages(connector: &MockConnector, total_pages: u32, per_page: u32) {
        for page in 1..=total_pages {
            let records = (0..per_page)
                .map(|i| fixtures::series_record(&format!("p{}-{}", page, i), "Series", 1))
                .collect();
            connector
                .push_reply(
                    fixtures::SEARCH_URL,
                    MockReply::json(
                        200,
                        fixtures::search_page(records, page, total_pages, 0),
                    ),
                )
                .await;
        }
    }

    #[tokio::test]
    async fn test_fetches_every_page_in_order() {
        let connector = Arc::new(MockConnector::new());
        push_pages(&connector, 3, 2).await;

        let pages = fetcher(&connector).fetch_all_pages().await.unwrap();

        assert_eq!(pages.len(), 3);
        assert_eq!(pages.iter().map(|p| p.items.len()).sum::<usize>(), 6);
        assert_eq!(connector.search_pages_requested().await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_single_page_catalog() {
        let connector = Arc::new(MockConnector::new());
        push_pages(&connector, 1, 5).await;

        let pages = fetcher(&connector).fetch_all_pages().await.unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(connector.search_pages_requested().await, vec![1]);
    }

    #[tokio::test]
    async fn test_request_carries_engine_key_and_page_size() {
        let connector = Arc::new(MockConnector::new());
        push_pages(&connector, 1, 1).await;

        fetcher(&connector).fetch_page(1).await.unwrap();

        let requests = connector.recorded_requests().await;
        let body: serde_json::Value =
            serde_json::from_slice(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["engine_key"], fixtures::ENGINE_KEY);
        assert_eq!(body["per_page"], 100);
        assert!(requests[0]
            .headers
            .iter()
            .all(|(name, _)| name != "X-Consumer-Key"));
    }

    #[tokio::test]
    async fn test_page_count_drift_keeps_first_total() {
        let connector = Arc::new(MockConnector::new());
        connector
            .push_reply(
                fixtures::SEARCH_URL,
                MockReply::json(200, fixtures::search_page(vec![], 1, 2, 0)),
            )
            .await;
        connector
            .push_reply(
                fixtures::SEARCH_URL,
                MockReply::json(200, fixtures::search_page(vec![], 2, 5, 0)),
            )
            .await;

        let pages = fetcher(&connector).fetch_all_pages().await.unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(connector.request_count().await, 2);
    }

    #[tokio::test]
    async fn test_error_ends_stream() {
        let connector = Arc::new(MockConnector::new());
        connector
            .push_reply(
                fixtures::SEARCH_URL,
                MockReply::json(200, fixtures::search_page(vec![], 1, 3, 0)),
            )
            .await;
        connector
            .push_reply(fixtures::SEARCH_URL, MockReply::json(500, json!({})))
            .await;

        let fetcher = fetcher(&connector);
        let results: Vec<_> = fetcher.fetch_all().collect().await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        let err = results[1].as_ref().unwrap_err();
        assert!(matches!(err, SyncError::ApiResponse { code: 500, .. }));
        assert_eq!(connector.search_pages_requested().await, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_malformed_page_is_decode_error() {
        let connector = Arc::new(MockConnector::new());
        connector
            .push_reply(
                fixtures::SEARCH_URL,
                MockReply::raw(200, b"<html>maintenance</html>".to_vec()),
            )
            .await;

        let err = fetcher(&connector).fetch_all_pages().await.unwrap_err();

        assert!(matches!(err, SyncError::Decode { .. }));
        assert!(err.to_string().starts_with("fetch_page"));
    }

    #[tokio::test]
    async fn test_stream_is_lazy() {
        let connector = Arc::new(MockConnector::new());
        push_pages(&connector, 3, 1).await;

        let fetcher = fetcher(&connector);
        let stream = fetcher.fetch_all();
        futures::pin_mut!(stream);
        assert!(stream.next().await.unwrap().is_ok());

        assert_eq!(connector.request_count().await, 1);
    }
}
