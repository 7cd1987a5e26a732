//! Sync cycle orchestration.
//!
//! - [`SyncOrchestrator`] runs one cycle end to end and publishes its phase.
//! - [`SyncService`] runs cycles in the background, one at a time, and keeps
//!   the result of the last one for the control surface.

mod orchestrator;
mod service;
mod types;

pub use orchestrator::SyncOrchestrator;
pub use service::SyncService;
pub use types::{
    CycleOutcome, CycleResult, SkippedItem, SyncPhase, SyncReport, SyncServiceError, SyncStatus,
};
