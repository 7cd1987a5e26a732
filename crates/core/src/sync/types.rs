//! Types for the sync orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::SyncError;
use crate::mirror::{UpsertOutcome, UpsertResult};

/// Where a cycle currently is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncPhase {
    /// No cycle has run yet.
    Idle,
    Fetching,
    Enriching { id: String },
    Upserting { id: String },
    Done,
    Failed { error: String },
    Cancelled,
}

/// An item whose enrichment the remote rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedItem {
    pub id: String,
    pub reason: String,
}

/// Summary of one completed cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Pages fetched.
    pub pages: u32,
    /// Total reported by page 1.
    pub total_results: u64,
    /// Items taken from the pages, including skipped ones.
    pub items_seen: u64,
    pub created: u64,
    pub updated: u64,
    pub unchanged: u64,
    /// Items written with the needs-update flag set.
    pub flagged: u64,
    pub skipped: Vec<SkippedItem>,
}

impl SyncReport {
    pub fn new(cycle_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            cycle_id,
            started_at,
            finished_at: None,
            pages: 0,
            total_results: 0,
            items_seen: 0,
            created: 0,
            updated: 0,
            unchanged: 0,
            flagged: 0,
            skipped: Vec::new(),
        }
    }

    pub fn record(&mut self, result: UpsertResult) {
        match result.outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
        if result.need_update {
            self.flagged += 1;
        }
    }

    /// Items written to storage.
    pub fn stored(&self) -> u64 {
        self.created + self.updated + self.unchanged
    }
}

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    Completed,
    Failed,
    Cancelled,
}

impl CycleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleOutcome::Completed => "completed",
            CycleOutcome::Failed => "failed",
            CycleOutcome::Cancelled => "cancelled",
        }
    }
}

/// Result of the most recent cycle, as kept by [`super::SyncService`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleResult {
    pub cycle_id: Uuid,
    pub outcome: CycleOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SyncReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Error kind, see [`SyncError::kind`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl CycleResult {
    pub fn from_result(cycle_id: Uuid, result: &Result<SyncReport, SyncError>) -> Self {
        match result {
            Ok(report) => Self {
                cycle_id,
                outcome: CycleOutcome::Completed,
                report: Some(report.clone()),
                error: None,
                error_kind: None,
            },
            Err(e) => Self {
                cycle_id,
                outcome: if matches!(e, SyncError::Cancelled) {
                    CycleOutcome::Cancelled
                } else {
                    CycleOutcome::Failed
                },
                report: None,
                error: Some(e.to_string()),
                error_kind: Some(e.kind().to_string()),
            },
        }
    }
}

/// Snapshot for the control surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStatus {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_id: Option<Uuid>,
    pub phase: SyncPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<CycleResult>,
}

/// Errors from the control surface.
#[derive(Debug, Error)]
pub enum SyncServiceError {
    #[error("sync cycle {0} is already running")]
    AlreadyRunning(Uuid),

    #[error("no sync cycle is running")]
    NotRunning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_serialization() {
        let phase = SyncPhase::Enriching {
            id: "abc".to_string(),
        };
        let json = serde_json::to_value(&phase).unwrap();
        assert_eq!(json["state"], "enriching");
        assert_eq!(json["id"], "abc");

        let json = serde_json::to_value(SyncPhase::Idle).unwrap();
        assert_eq!(json["state"], "idle");
    }

    #[test]
    fn test_report_record() {
        let mut report = SyncReport::new(Uuid::new_v4(), Utc::now());
        report.record(UpsertResult {
            outcome: UpsertOutcome::Created,
            need_update: true,
        });
        report.record(UpsertResult {
            outcome: UpsertOutcome::Unchanged,
            need_update: false,
        });

        assert_eq!(report.created, 1);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.flagged, 1);
        assert_eq!(report.stored(), 2);
    }

    #[test]
    fn test_cycle_result_from_error() {
        let id = Uuid::new_v4();
        let result = CycleResult::from_result(id, &Err(SyncError::Cancelled));
        assert_eq!(result.outcome, CycleOutcome::Cancelled);
        assert_eq!(result.error_kind.as_deref(), Some("cancelled"));

        let result = CycleResult::from_result(
            id,
            &Err(SyncError::decode("describe", "missing field")),
        );
        assert_eq!(result.outcome, CycleOutcome::Failed);
        assert!(result.report.is_none());
    }
}
