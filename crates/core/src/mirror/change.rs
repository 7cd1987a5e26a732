//! Needs-update decision.

use chrono::{DateTime, Duration, Utc};

use super::types::{CatalogItem, StoredSeries};

/// Whether a downstream consumer should refresh this series.
///
/// True when the series has never been stored, when its book count moved in
/// either direction, or when it was last refreshed before `stale_before`
/// (Unix seconds). Nothing else about the item is considered.
pub fn needs_update(
    existing: Option<&StoredSeries>,
    incoming: &CatalogItem,
    stale_before: i64,
) -> bool {
    match existing {
        None => true,
        Some(stored) => {
            stored.book_count != incoming.book_count || stored.date_updated < stale_before
        }
    }
}

/// Staleness threshold for a cycle that started at `now`.
pub fn stale_before(now: DateTime<Utc>, staleness_days: u32) -> i64 {
    (now - Duration::days(i64::from(staleness_days))).timestamp()
}
