//! Background runner that allows at most one sync cycle at a time.

use std::sync::Arc;

use tokio::sync::{watch, Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use super::orchestrator::SyncOrchestrator;
use super::types::{CycleResult, SyncServiceError, SyncStatus};

struct RunningCycle {
    cycle_id: Uuid,
    cancel: CancellationToken,
    finished: watch::Receiver<bool>,
}

impl RunningCycle {
    fn is_finished(&self) -> bool {
        *self.finished.borrow()
    }
}

/// Starts cycles in the background and reports on them.
pub struct SyncService {
    orchestrator: Arc<SyncOrchestrator>,
    current: Mutex<Option<RunningCycle>>,
    last: Arc<RwLock<Option<CycleResult>>>,
}

impl SyncService {
    pub fn new(orchestrator: Arc<SyncOrchestrator>) -> Self {
        Self {
            orchestrator,
            current: Mutex::new(None),
            last: Arc::new(RwLock::new(None)),
        }
    }

    /// Spawn a cycle. Fails if one is still running.
    pub async fn start(&self) -> Result<Uuid, SyncServiceError> {
        let mut current = self.current.lock().await;
        if let Some(cycle) = current.as_ref() {
            if !cycle.is_finished() {
                warn!("Sync cycle {} already running", cycle.cycle_id);
                return Err(SyncServiceError::AlreadyRunning(cycle.cycle_id));
            }
        }

        let cycle_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let (finished_tx, finished_rx) = watch::channel(false);

        let orchestrator = Arc::clone(&self.orchestrator);
        let last = Arc::clone(&self.last);
        let token = cancel.clone();
        tokio::spawn(async move {
            let result = orchestrator.run_cycle(cycle_id, &token).await;
            *last.write().await = Some(CycleResult::from_result(cycle_id, &result));
            finished_tx.send_replace(true);
        });

        info!("Started sync cycle {}", cycle_id);
        *current = Some(RunningCycle {
            cycle_id,
            cancel,
            finished: finished_rx,
        });
        Ok(cycle_id)
    }

    /// Request cancellation of the running cycle.
    ///
    /// The cycle stops at its next page or item boundary; use
    /// [`SyncService::wait`] to observe the end.
    pub async fn cancel(&self) -> Result<Uuid, SyncServiceError> {
        let current = self.current.lock().await;
        match current.as_ref() {
            Some(cycle) if !cycle.is_finished() => {
                info!("Cancelling sync cycle {}", cycle.cycle_id);
                cycle.cancel.cancel();
                Ok(cycle.cycle_id)
            }
            _ => Err(SyncServiceError::NotRunning),
        }
    }

    /// Wait for the running cycle (if any) to finish and return the latest result.
    pub async fn wait(&self) -> Option<CycleResult> {
        let finished = self
            .current
            .lock()
            .await
            .as_ref()
            .map(|cycle| cycle.finished.clone());

        if let Some(mut finished) = finished {
            // A dropped sender means the task is gone either way
            let _ = finished.wait_for(|done| *done).await;
        }

        self.last.read().await.clone()
    }

    pub async fn is_running(&self) -> bool {
        self.current
            .lock()
            .await
            .as_ref()
            .is_some_and(|cycle| !cycle.is_finished())
    }

    pub async fn status(&self) -> SyncStatus {
        let cycle_id = {
            let current = self.current.lock().await;
            current
                .as_ref()
                .filter(|cycle| !cycle.is_finished())
                .map(|cycle| cycle.cycle_id)
        };

        SyncStatus {
            running: cycle_id.is_some(),
            cycle_id,
            phase: self.orchestrator.phase(),
            last: self.last.read().await.clone(),
        }
    }

    /// Cancel any running cycle and wait for it to stop.
    pub async fn shutdown(&self) {
        if self.cancel().await.is_ok() {
            self.wait().await;
        }
    }
}
