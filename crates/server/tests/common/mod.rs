//! Common test utilities for E2E testing with mocks.
//!
//! The fixture builds the real router over an on-disk series store and a
//! [`MockConnector`], so sync cycles triggered through the API run against
//! scripted remote responses.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use mirror_core::{
    testing::MockConnector, RelationPolicy, SeriesStore, SqliteSeriesStore, SyncOrchestrator,
    SyncService,
};
use mirror_server::state::AppState;

/// Re-export fixtures for test convenience
pub use mirror_core::testing::fixtures;

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_sync_runs() {
///     let fixture = TestFixture::new().await;
///     fixtures::mock_catalog(&fixture.connector, vec![vec![...]]).await;
///
///     let response = fixture.post("/api/v1/sync").await;
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock remote catalog - script search and detail replies
    pub connector: Arc<MockConnector>,
    /// The store behind the router
    pub store: Arc<dyn SeriesStore>,
    /// The sync service behind the router
    pub sync: Arc<SyncService>,
    /// Temporary directory holding the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with default settings.
    pub async fn new() -> Self {
        Self::with_relation_policy(RelationPolicy::default()).await
    }

    /// Create a test fixture whose store uses the given relation policy.
    pub async fn with_relation_policy(policy: RelationPolicy) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let mut config = fixtures::config();
        config.database.path = db_path.clone();
        config.sync.relation_policy = policy;

        let store = SqliteSeriesStore::new(&db_path, fixtures::MOCK_BASE)
            .expect("Failed to create series store")
            .with_relation_policy(policy);
        store.ensure_schema().expect("Failed to create schema");
        let store: Arc<dyn SeriesStore> = Arc::new(store);

        let connector = Arc::new(MockConnector::new());
        let orchestrator: SyncOrchestrator = fixtures::orchestrator(&connector, Arc::clone(&store));
        let sync = Arc::new(SyncService::new(Arc::new(orchestrator)));

        let state = Arc::new(AppState::new(config, Arc::clone(&store), Arc::clone(&sync)));
        let router = mirror_server::api::create_router(state);

        Self {
            router,
            connector,
            store,
            sync,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    /// Send a POST request with an empty body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path).await
    }

    /// Start a cycle through the API and wait for it to finish.
    ///
    /// Returns the `last` section of the status response.
    pub async fn run_sync(&self) -> Value {
        let response = self.post("/api/v1/sync").await;
        assert_eq!(response.status, StatusCode::ACCEPTED, "{:?}", response.body);
        self.sync.wait().await;
        self.get("/api/v1/sync").await.body["last"].clone()
    }

    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
