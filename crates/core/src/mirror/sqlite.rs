//! SQLite-backed series store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info, warn};

use super::change::needs_update;
use super::{CatalogItem, SeriesStats, SeriesStore, StoredSeries, UpsertOutcome, UpsertResult};
use crate::config::RelationPolicy;
use crate::error::SyncError;

const SERIES_COLUMNS: &str = "id, title, description, book_count, issue_count, volume_count, \
     omnibus_count, url, date_updated, need_update";

/// Destructive rebuild, only run when the probe fails.
const CREATE_SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

DROP TABLE IF EXISTS series_imprint;
DROP TABLE IF EXISTS series_genre;
DROP TABLE IF EXISTS series;

CREATE TABLE series (
    id            TEXT PRIMARY KEY,
    title         TEXT NOT NULL,
    description   TEXT NOT NULL,
    book_count    INTEGER NOT NULL,
    issue_count   INTEGER NOT NULL,
    volume_count  INTEGER NOT NULL,
    omnibus_count INTEGER NOT NULL,
    url           TEXT NOT NULL UNIQUE,
    date_updated  INTEGER NOT NULL DEFAULT 0,
    need_update   INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX idx_series_need_update ON series(need_update);

CREATE TABLE series_genre (
    id    TEXT NOT NULL,
    genre TEXT NOT NULL,
    PRIMARY KEY (id, genre),
    FOREIGN KEY (id) REFERENCES series(id) ON DELETE CASCADE
);

CREATE TABLE series_imprint (
    id      TEXT NOT NULL,
    imprint TEXT NOT NULL,
    PRIMARY KEY (id, imprint),
    FOREIGN KEY (id) REFERENCES series(id) ON DELETE CASCADE
);
"#;

/// SQLite-backed series store.
pub struct SqliteSeriesStore {
    conn: Mutex<Connection>,
    site_base_url: String,
    relation_policy: RelationPolicy,
}

impl SqliteSeriesStore {
    /// Open (or create) the database file. Call [`SeriesStore::ensure_schema`]
    /// before first use.
    pub fn new(path: &Path, site_base_url: &str) -> Result<Self, SyncError> {
        let conn = Connection::open(path)
            .map_err(|e| SyncError::storage("store.open", e.to_string()))?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| SyncError::storage("store.open", e.to_string()))?;
        Self::from_connection(conn, site_base_url)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory(site_base_url: &str) -> Result<Self, SyncError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SyncError::storage("store.open", e.to_string()))?;
        Self::from_connection(conn, site_base_url)
    }

    fn from_connection(conn: Connection, site_base_url: &str) -> Result<Self, SyncError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| SyncError::storage("store.open", e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
            site_base_url: site_base_url.trim_end_matches('/').to_string(),
            relation_policy: RelationPolicy::default(),
        })
    }

    pub fn with_relation_policy(mut self, policy: RelationPolicy) -> Self {
        self.relation_policy = policy;
        self
    }

    /// `{site}/comics/series/{slug}/{id}`, the id standing in for an empty slug.
    pub fn canonical_url(&self, item: &CatalogItem) -> String {
        let slug = if item.slug.is_empty() {
            &item.id
        } else {
            &item.slug
        };
        format!(
            "{}/comics/series/{}/{}",
            self.site_base_url,
            urlencoding::encode(slug),
            urlencoding::encode(&item.id)
        )
    }

    fn lock(&self, op: &str) -> Result<MutexGuard<'_, Connection>, SyncError> {
        self.conn
            .lock()
            .map_err(|_| SyncError::storage(op, "connection lock poisoned"))
    }

    fn row_to_series(row: &Row<'_>) -> rusqlite::Result<StoredSeries> {
        Ok(StoredSeries {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            book_count: row.get(3)?,
            issue_count: row.get(4)?,
            volume_count: row.get(5)?,
            omnibus_count: row.get(6)?,
            url: row.get(7)?,
            date_updated: row.get(8)?,
            need_update: row.get(9)?,
        })
    }

    fn load_series(conn: &Connection, id: &str) -> rusqlite::Result<Option<StoredSeries>> {
        conn.query_row(
            &format!("SELECT {} FROM series WHERE id = ?1", SERIES_COLUMNS),
            params![id],
            Self::row_to_series,
        )
        .optional()
    }

    fn load_links(conn: &Connection, sql: &str, id: &str) -> rusqlite::Result<Vec<String>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![id], |row| row.get(0))?;
        rows.collect()
    }

    fn count(conn: &Connection, sql: &str) -> rusqlite::Result<u64> {
        conn.query_row(sql, [], |row| row.get::<_, i64>(0))
            .map(|n| n.max(0) as u64)
    }
}

/// Only a missing table or column warrants the destructive rebuild.
fn is_missing_schema(e: &rusqlite::Error) -> bool {
    let message = e.to_string();
    message.contains("no such table") || message.contains("no such column")
}

impl SeriesStore for SqliteSeriesStore {
    fn ensure_schema(&self) -> Result<(), SyncError> {
        let conn = self.lock("ensure_schema")?;

        let probe = conn
            .query_row(
                &format!("SELECT {} FROM series LIMIT 1", SERIES_COLUMNS),
                [],
                |_| Ok(()),
            )
            .optional();

        match probe {
            Ok(_) => {
                debug!("Series schema present");
                Ok(())
            }
            Err(e) if !is_missing_schema(&e) => {
                Err(SyncError::storage("ensure_schema", e.to_string()))
            }
            Err(e) => {
                warn!("Series schema unusable ({}), recreating tables", e);
                conn.execute_batch(CREATE_SCHEMA)
                    .map_err(|e| SyncError::storage("ensure_schema", e.to_string()))?;
                info!("Created series schema");
                Ok(())
            }
        }
    }

    fn upsert(&self, item: &CatalogItem, stale_before: i64) -> Result<UpsertResult, SyncError> {
        let storage = |e: rusqlite::Error| SyncError::storage("upsert", e.to_string());

        let mut conn = self.lock("upsert")?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(storage)?;

        let existing = Self::load_series(&tx, &item.id).map_err(storage)?;
        let need_update = needs_update(existing.as_ref(), item, stale_before);
        let url = self.canonical_url(item);

        // A missing description keeps whatever is stored
        tx.execute(
            "INSERT INTO series (id, title, description, book_count, issue_count, volume_count,
                                 omnibus_count, url, date_updated, need_update)
             VALUES (?1, ?2, COALESCE(?3, ''), ?4, ?5, ?6, ?7, ?8, 0, ?9)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = COALESCE(?3, series.description),
                book_count = excluded.book_count,
                issue_count = excluded.issue_count,
                volume_count = excluded.volume_count,
                omnibus_count = excluded.omnibus_count,
                url = excluded.url,
                need_update = excluded.need_update",
            params![
                item.id,
                item.title,
                item.description,
                item.book_count,
                item.issue_count,
                item.volume_count,
                item.omnibus_count,
                url,
                need_update,
            ],
        )
        .map_err(storage)?;

        if self.relation_policy == RelationPolicy::Replace {
            tx.execute("DELETE FROM series_genre WHERE id = ?1", params![item.id])
                .map_err(storage)?;
            tx.execute("DELETE FROM series_imprint WHERE id = ?1", params![item.id])
                .map_err(storage)?;
        }

        {
            let mut stmt = tx
                .prepare_cached("INSERT OR IGNORE INTO series_genre (id, genre) VALUES (?1, ?2)")
                .map_err(storage)?;
            for genre in &item.genres {
                stmt.execute(params![item.id, genre]).map_err(storage)?;
            }

            let mut stmt = tx
                .prepare_cached(
                    "INSERT OR IGNORE INTO series_imprint (id, imprint) VALUES (?1, ?2)",
                )
                .map_err(storage)?;
            for imprint in &item.imprints {
                stmt.execute(params![item.id, imprint]).map_err(storage)?;
            }
        }

        tx.commit().map_err(storage)?;

        let outcome = match existing {
            None => UpsertOutcome::Created,
            Some(previous) => {
                let written = StoredSeries {
                    id: item.id.clone(),
                    title: item.title.clone(),
                    description: item
                        .description
                        .clone()
                        .unwrap_or_else(|| previous.description.clone()),
                    book_count: item.book_count,
                    issue_count: item.issue_count,
                    volume_count: item.volume_count,
                    omnibus_count: item.omnibus_count,
                    url,
                    date_updated: previous.date_updated,
                    need_update,
                };
                if written == previous {
                    UpsertOutcome::Unchanged
                } else {
                    UpsertOutcome::Updated
                }
            }
        };

        debug!(
            "Upserted series {} ({}, need_update={})",
            item.id,
            outcome.as_str(),
            need_update
        );

        Ok(UpsertResult {
            outcome,
            need_update,
        })
    }

    fn get(&self, id: &str) -> Result<Option<StoredSeries>, SyncError> {
        let conn = self.lock("get")?;
        Self::load_series(&conn, id).map_err(|e| SyncError::storage("get", e.to_string()))
    }

    fn genres(&self, id: &str) -> Result<Vec<String>, SyncError> {
        let conn = self.lock("genres")?;
        Self::load_links(
            &conn,
            "SELECT genre FROM series_genre WHERE id = ?1 ORDER BY genre",
            id,
        )
        .map_err(|e| SyncError::storage("genres", e.to_string()))
    }

    fn imprints(&self, id: &str) -> Result<Vec<String>, SyncError> {
        let conn = self.lock("imprints")?;
        Self::load_links(
            &conn,
            "SELECT imprint FROM series_imprint WHERE id = ?1 ORDER BY imprint",
            id,
        )
        .map_err(|e| SyncError::storage("imprints", e.to_string()))
    }

    fn series_needing_update(&self, limit: u32) -> Result<Vec<StoredSeries>, SyncError> {
        let storage =
            |e: rusqlite::Error| SyncError::storage("series_needing_update", e.to_string());
        let conn = self.lock("series_needing_update")?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM series WHERE need_update = 1 ORDER BY id LIMIT ?1",
                SERIES_COLUMNS
            ))
            .map_err(storage)?;
        let rows = stmt
            .query_map(params![limit], Self::row_to_series)
            .map_err(storage)?;

        let mut series = Vec::new();
        for row in rows {
            series.push(row.map_err(storage)?);
        }
        Ok(series)
    }

    fn mark_refreshed(&self, id: &str, at: i64) -> Result<bool, SyncError> {
        let conn = self.lock("mark_refreshed")?;
        let changed = conn
            .execute(
                "UPDATE series SET date_updated = ?1, need_update = 0 WHERE id = ?2",
                params![at, id],
            )
            .map_err(|e| SyncError::storage("mark_refreshed", e.to_string()))?;
        Ok(changed > 0)
    }

    fn stats(&self) -> Result<SeriesStats, SyncError> {
        let storage = |e: rusqlite::Error| SyncError::storage("stats", e.to_string());
        let conn = self.lock("stats")?;

        Ok(SeriesStats {
            series: Self::count(&conn, "SELECT COUNT(*) FROM series").map_err(storage)?,
            needing_update: Self::count(&conn, "SELECT COUNT(*) FROM series WHERE need_update = 1")
                .map_err(storage)?,
            genre_links: Self::count(&conn, "SELECT COUNT(*) FROM series_genre")
                .map_err(storage)?,
            imprint_links: Self::count(&conn, "SELECT COUNT(*) FROM series_imprint")
                .map_err(storage)?,
            distinct_genres: Self::count(&conn, "SELECT COUNT(DISTINCT genre) FROM series_genre")
                .map_err(storage)?,
            distinct_imprints: Self::count(
                &conn,
                "SELECT COUNT(DISTINCT imprint) FROM series_imprint",
            )
            .map_err(storage)?,
        })
    }
}
