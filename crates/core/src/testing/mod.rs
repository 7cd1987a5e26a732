//! Testing utilities and mock implementations.
//!
//! [`MockConnector`] stands in for the network underneath the real
//! transport, so the retry policy, pagination, enrichment and the full sync
//! cycle can be exercised against scripted remote responses.
//!
//! # Example
//!
//! ```rust,ignore
//! use mirror_core::testing::{fixtures, MockConnector};
//!
//! let connector = Arc::new(MockConnector::new());
//! fixtures::mock_catalog(&connector, vec![
//!     vec![fixtures::series_record("s1", "Watchmen", 12)],
//! ]).await;
//!
//! let orchestrator = fixtures::orchestrator(&connector, store);
//! ```

mod mock_connector;

pub use mock_connector::{MockConnector, MockReply};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::{json, Value};

    use super::{MockConnector, MockReply};
    use crate::config::{
        Config, DatabaseConfig, LoggingConfig, RemoteConfig, ServerConfig, SyncConfig,
    };
    use crate::mirror::{CatalogItem, SeriesStore};
    use crate::sync::SyncOrchestrator;
    use crate::transport::{Connector, Pacer, Transport};

    /// Base URL of every mocked remote endpoint.
    pub const MOCK_BASE: &str = "http://catalog.test";
    pub const SEARCH_URL: &str = "http://catalog.test/api/v1/public/engines/search.json";
    pub const ENGINE_KEY: &str = "test-engine-key";
    pub const CONSUMER_KEY: &str = "test-consumer-key";

    /// Remote config pointing at [`MOCK_BASE`] with no pacing or backoff.
    pub fn remote_config() -> RemoteConfig {
        RemoteConfig {
            search_url: SEARCH_URL.to_string(),
            detail_base_url: MOCK_BASE.to_string(),
            site_base_url: MOCK_BASE.to_string(),
            engine_key: ENGINE_KEY.to_string(),
            consumer_key: CONSUMER_KEY.to_string(),
            page_size: 100,
            request_timeout_secs: 5,
            retry_delay_ms: 0,
            request_delay_ms: 0,
        }
    }

    /// Full config around [`remote_config`].
    pub fn config() -> Config {
        Config {
            remote: remote_config(),
            sync: SyncConfig::default(),
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Transport over the mock with no retry backoff.
    pub fn transport(connector: &Arc<MockConnector>) -> Transport {
        Transport::new(
            Arc::clone(connector) as Arc<dyn Connector>,
            Duration::ZERO,
        )
    }

    /// Pacer that never waits.
    pub fn pacer(name: &'static str) -> Pacer {
        Pacer::new(name, Duration::ZERO)
    }

    /// Orchestrator over the mock with default sync settings.
    pub fn orchestrator(
        connector: &Arc<MockConnector>,
        store: Arc<dyn SeriesStore>,
    ) -> SyncOrchestrator {
        SyncOrchestrator::from_config(
            &remote_config(),
            &SyncConfig::default(),
            Arc::clone(connector) as Arc<dyn Connector>,
            store,
        )
    }

    /// One search record as the remote encodes it.
    pub fn series_record(id: &str, title: &str, books: u32) -> Value {
        json!({
            "uuid": id,
            "title": title,
            "slug": title.to_lowercase().replace(' ', "-"),
            "genres": ["Superhero"],
            "imprints": ["DC"],
            "books_count": books,
            "issue_count": books,
            "volume_count": 0,
            "omnibus_count": 0
        })
    }

    /// One search response page.
    pub fn search_page(
        records: Vec<Value>,
        page: u32,
        total_pages: u32,
        total_results: u64,
    ) -> Value {
        json!({
            "record_count": records.len(),
            "records": { "comicseries": records },
            "info": {
                "comicseries": {
                    "current_page": page,
                    "num_pages": total_pages,
                    "total_result_count": total_results
                }
            }
        })
    }

    /// Detail response body.
    pub fn detail(description: &str) -> Value {
        json!({ "description": description })
    }

    /// Detail URL the enricher requests for `id`.
    pub fn detail_url(id: &str) -> String {
        format!(
            "{}/api/comics/1/series/{}/?trans=en",
            MOCK_BASE,
            urlencoding::encode(id)
        )
    }

    /// Description served by [`mock_catalog`] for `id`.
    pub fn description_for(id: &str) -> String {
        format!("Description of {}", id)
    }

    /// Script a whole catalog: one search reply per page, and a detail
    /// reply for every record.
    pub async fn mock_catalog(connector: &MockConnector, pages: Vec<Vec<Value>>) {
        let total_pages = pages.len().max(1) as u32;
        let total_results = pages.iter().map(Vec::len).sum::<usize>() as u64;

        for (index, records) in pages.into_iter().enumerate() {
            for record in &records {
                if let Some(id) = record["uuid"].as_str() {
                    connector
                        .set_default_reply(
                            &detail_url(id),
                            MockReply::json(200, detail(&description_for(id))),
                        )
                        .await;
                }
            }
            connector
                .push_reply(
                    SEARCH_URL,
                    MockReply::json(
                        200,
                        search_page(records, index as u32 + 1, total_pages, total_results),
                    ),
                )
                .await;
        }
    }

    /// Catalog item with reasonable defaults and no description.
    pub fn catalog_item(id: &str, title: &str) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            title: title.to_string(),
            slug: title.to_lowercase().replace(' ', "-"),
            description: None,
            genres: BTreeSet::new(),
            imprints: BTreeSet::new(),
            book_count: 1,
            issue_count: 1,
            volume_count: 0,
            omnibus_count: 0,
        }
    }
}
