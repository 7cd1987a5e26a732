//! One full sync cycle: fetch every page, enrich each item, upsert it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::types::{SkippedItem, SyncPhase, SyncReport};
use crate::config::{RemoteConfig, SyncConfig};
use crate::error::SyncError;
use crate::metrics;
use crate::mirror::{stale_before, SearchPage, SeriesStore};
use crate::remote::{DetailEnricher, PageFetcher};
use crate::transport::{Connector, Pacer, Transport};

const OP: &str = "sync";

/// Drives the fetch → enrich → upsert pipeline, strictly sequentially.
///
/// An item the remote explicitly rejects (non-success status on its detail
/// request) is skipped and reported; any other failure aborts the cycle.
pub struct SyncOrchestrator {
    pages: PageFetcher,
    enricher: DetailEnricher,
    store: Arc<dyn SeriesStore>,
    detail_pacer: Arc<Pacer>,
    staleness_days: u32,
    phase_tx: watch::Sender<SyncPhase>,
}

impl SyncOrchestrator {
    pub fn new(
        pages: PageFetcher,
        enricher: DetailEnricher,
        store: Arc<dyn SeriesStore>,
        detail_pacer: Arc<Pacer>,
        staleness_days: u32,
    ) -> Self {
        let (phase_tx, _) = watch::channel(SyncPhase::Idle);

        Self {
            pages,
            enricher,
            store,
            detail_pacer,
            staleness_days,
            phase_tx,
        }
    }

    /// Wire up transport, pacers and fetchers from configuration.
    pub fn from_config(
        remote: &RemoteConfig,
        sync: &SyncConfig,
        connector: Arc<dyn Connector>,
        store: Arc<dyn SeriesStore>,
    ) -> Self {
        let transport = Arc::new(Transport::new(
            connector,
            Duration::from_millis(remote.retry_delay_ms),
        ));
        let spacing = Duration::from_millis(remote.request_delay_ms);

        let pages = PageFetcher::new(
            Arc::clone(&transport),
            Arc::new(Pacer::new("search", spacing)),
            remote,
        );
        let enricher = DetailEnricher::new(transport, remote);

        Self::new(
            pages,
            enricher,
            store,
            Arc::new(Pacer::new("detail", spacing)),
            sync.staleness_days,
        )
    }

    /// Current phase.
    pub fn phase(&self) -> SyncPhase {
        self.phase_tx.borrow().clone()
    }

    /// Watch phase transitions.
    pub fn subscribe(&self) -> watch::Receiver<SyncPhase> {
        self.phase_tx.subscribe()
    }

    fn set_phase(&self, phase: SyncPhase) {
        self.phase_tx.send_replace(phase);
    }

    /// Run one cycle with a fresh cycle id.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<SyncReport, SyncError> {
        self.run_cycle(Uuid::new_v4(), cancel).await
    }

    /// Run one cycle under the given id.
    ///
    /// Returns [`SyncError::Cancelled`] if `cancel` fires; items already
    /// upserted stay committed.
    pub async fn run_cycle(
        &self,
        cycle_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let started_at = Utc::now();
        let timer = Instant::now();
        let threshold = stale_before(started_at, self.staleness_days);

        info!(
            "Starting sync cycle {} (stale before {})",
            cycle_id, threshold
        );

        let result = self.execute(cycle_id, started_at, threshold, cancel).await;
        metrics::SYNC_CYCLE_DURATION.observe(timer.elapsed().as_secs_f64());

        match &result {
            Ok(report) => {
                info!(
                    "Sync cycle {} done: {} pages, {} items, {} created, {} updated, {} unchanged, {} flagged, {} skipped",
                    cycle_id,
                    report.pages,
                    report.items_seen,
                    report.created,
                    report.updated,
                    report.unchanged,
                    report.flagged,
                    report.skipped.len()
                );
                metrics::SYNC_CYCLES.with_label_values(&["completed"]).inc();
                self.set_phase(SyncPhase::Done);
            }
            Err(SyncError::Cancelled) => {
                info!("Sync cycle {} cancelled", cycle_id);
                metrics::SYNC_CYCLES.with_label_values(&["cancelled"]).inc();
                self.set_phase(SyncPhase::Cancelled);
            }
            Err(e) => {
                error!("Sync cycle {} failed: {}", cycle_id, e);
                metrics::SYNC_CYCLES.with_label_values(&["failed"]).inc();
                self.set_phase(SyncPhase::Failed {
                    error: e.to_string(),
                });
            }
        }

        result
    }

    async fn execute(
        &self,
        cycle_id: Uuid,
        started_at: DateTime<Utc>,
        threshold: i64,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        self.set_phase(SyncPhase::Fetching);
        let pages = self.fetch_pages(cancel).await?;

        let mut report = SyncReport::new(cycle_id, started_at);
        report.pages = pages.len() as u32;
        report.total_results = pages.first().map(|p| p.total_results).unwrap_or(0);

        for page in pages {
            for item in page.items {
                if cancel.is_cancelled() {
                    return Err(SyncError::Cancelled);
                }
                report.items_seen += 1;

                self.set_phase(SyncPhase::Enriching {
                    id: item.id.clone(),
                });
                let described = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                    described = self.describe(&item.id) => described,
                };

                let description = match described {
                    Ok(description) => description,
                    Err(e) if e.is_skippable() => {
                        warn!("Skipping series {} ({}): {}", item.id, item.title, e);
                        metrics::ITEMS_PROCESSED
                            .with_label_values(&["skipped"])
                            .inc();
                        report.skipped.push(SkippedItem {
                            id: item.id,
                            reason: e.to_string(),
                        });
                        continue;
                    }
                    Err(e) => return Err(e.within(OP)),
                };

                let item = item.with_description(description);
                self.set_phase(SyncPhase::Upserting {
                    id: item.id.clone(),
                });
                let result = self
                    .store
                    .upsert(&item, threshold)
                    .map_err(|e| e.within(OP))?;

                debug!(
                    "Series {} {} (need_update={})",
                    item.id,
                    result.outcome.as_str(),
                    result.need_update
                );
                metrics::ITEMS_PROCESSED
                    .with_label_values(&[result.outcome.as_str()])
                    .inc();
                if result.need_update {
                    metrics::ITEMS_FLAGGED.inc();
                }
                report.record(result);
            }
        }

        report.finished_at = Some(Utc::now());
        Ok(report)
    }

    /// Consume the page stream, stopping between pages on cancellation.
    async fn fetch_pages(&self, cancel: &CancellationToken) -> Result<Vec<SearchPage>, SyncError> {
        let stream = self.pages.fetch_all();
        futures::pin_mut!(stream);

        let mut pages = Vec::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                next = stream.next() => next,
            };
            match next {
                Some(page) => pages.push(page.map_err(|e| e.within(OP))?),
                None => break,
            }
        }
        Ok(pages)
    }

    async fn describe(&self, id: &str) -> Result<String, SyncError> {
        self.detail_pacer.wait().await;
        self.enricher.describe(id).await
    }
}
