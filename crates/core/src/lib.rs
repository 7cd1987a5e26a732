pub mod config;
pub mod error;
pub mod metrics;
pub mod mirror;
pub mod remote;
pub mod sync;
pub mod testing;
pub mod transport;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, RelationPolicy,
    SanitizedConfig,
};
pub use error::SyncError;
pub use mirror::{CatalogItem, SearchPage, SeriesStats, SeriesStore, SqliteSeriesStore, StoredSeries};
pub use remote::{DetailEnricher, PageFetcher};
pub use sync::{SyncOrchestrator, SyncPhase, SyncReport, SyncService, SyncServiceError, SyncStatus};
pub use transport::{Connector, Pacer, ReqwestConnector, Transport};
