//! Local mirror of the remote series catalog.
//!
//! One `series` row per remote identifier plus the `series_genre` and
//! `series_imprint` link tables. Downstream consumers read `need_update` to
//! decide what to refresh and report back through [`SeriesStore::mark_refreshed`].

mod change;
mod sqlite;
mod types;

pub use change::{needs_update, stale_before};
pub use sqlite::SqliteSeriesStore;
pub use types::*;

use crate::error::SyncError;

/// Trait for series storage.
pub trait SeriesStore: Send + Sync {
    /// Make sure the tables exist, rebuilding them if they are unusable.
    fn ensure_schema(&self) -> Result<(), SyncError>;

    /// Create or update one series and its genre/imprint links atomically.
    ///
    /// The needs-update flag is computed against the row as it exists inside
    /// the same transaction. `date_updated` is never written here.
    fn upsert(&self, item: &CatalogItem, stale_before: i64) -> Result<UpsertResult, SyncError>;

    /// Get a series by identifier.
    fn get(&self, id: &str) -> Result<Option<StoredSeries>, SyncError>;

    /// Genres linked to a series, sorted.
    fn genres(&self, id: &str) -> Result<Vec<String>, SyncError>;

    /// Imprints linked to a series, sorted.
    fn imprints(&self, id: &str) -> Result<Vec<String>, SyncError>;

    /// Flagged series, ordered by identifier.
    fn series_needing_update(&self, limit: u32) -> Result<Vec<StoredSeries>, SyncError>;

    /// Record a downstream refresh: sets `date_updated` and clears the flag.
    ///
    /// Returns false if no such series exists.
    fn mark_refreshed(&self, id: &str, at: i64) -> Result<bool, SyncError>;

    /// Table-level counts.
    fn stats(&self) -> Result<SeriesStats, SyncError>;
}
