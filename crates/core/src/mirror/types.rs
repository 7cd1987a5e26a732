use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One series as reported by the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Stable remote identifier; the storage key.
    pub id: String,
    pub title: String,
    /// URL-friendly handle used to build the canonical URL.
    pub slug: String,
    /// Absent until the detail endpoint has been consulted.
    pub description: Option<String>,
    pub genres: BTreeSet<String>,
    pub imprints: BTreeSet<String>,
    pub book_count: u32,
    pub issue_count: u32,
    pub volume_count: u32,
    pub omnibus_count: u32,
}

impl CatalogItem {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One page of bulk search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    pub items: Vec<CatalogItem>,
    /// 1-based.
    pub current_page: u32,
    /// At least 1.
    pub total_pages: u32,
    pub total_results: u64,
}

/// Stored `series` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredSeries {
    pub id: String,
    pub title: String,
    pub description: String,
    pub book_count: u32,
    pub issue_count: u32,
    pub volume_count: u32,
    pub omnibus_count: u32,
    pub url: String,
    /// Unix seconds of the last downstream refresh, 0 if never refreshed.
    pub date_updated: i64,
    pub need_update: bool,
}

/// What an upsert did to the scalar row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
}

impl UpsertOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertOutcome::Created => "created",
            UpsertOutcome::Updated => "updated",
            UpsertOutcome::Unchanged => "unchanged",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertResult {
    pub outcome: UpsertOutcome,
    /// Flag value written for this item.
    pub need_update: bool,
}

/// Table-level counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeriesStats {
    pub series: u64,
    pub needing_update: u64,
    pub genre_links: u64,
    pub imprint_links: u64,
    pub distinct_genres: u64,
    pub distinct_imprints: u64,
}
