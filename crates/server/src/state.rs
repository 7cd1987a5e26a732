use std::sync::Arc;
use mirror_core::{Config, SanitizedConfig, SeriesStore, SyncService};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn SeriesStore>,
    sync: Arc<SyncService>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn SeriesStore>, sync: Arc<SyncService>) -> Self {
        Self {
            config,
            store,
            sync,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &dyn SeriesStore {
        self.store.as_ref()
    }

    pub fn sync(&self) -> &SyncService {
        self.sync.as_ref()
    }
}
