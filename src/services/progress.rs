use std::sync::{Arc, Mutex};

use chrono::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::models::{ImportJob, ImportSource, JobOutcome};
use crate::services::clock::Clock;

const SNAPSHOT_CHANNEL_CAPACITY: usize = 128;

/// Changes applied to the running job in one step.
///
/// Progress only moves forward and log lines are only appended, so no
/// sequence of updates can break either invariant.
#[derive(Debug, Default, Clone)]
pub struct JobUpdate {
    step: Option<String>,
    progress: Option<u8>,
    total_count: Option<u32>,
    imported_count: Option<u32>,
    skipped_count: Option<u32>,
    logs: Vec<String>,
}

impl JobUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn total(mut self, total: u32) -> Self {
        self.total_count = Some(total);
        self
    }

    pub fn counts(mut self, imported: u32, skipped: u32) -> Self {
        self.imported_count = Some(imported);
        self.skipped_count = Some(skipped);
        self
    }

    pub fn log(mut self, line: impl Into<String>) -> Self {
        self.logs.push(line.into());
        self
    }

    fn apply_to(self, job: &mut ImportJob) {
        if let Some(step) = self.step {
            job.current_step = step;
        }
        if let Some(progress) = self.progress {
            job.progress = job.progress.max(progress.min(100));
        }
        if let Some(total) = self.total_count {
            job.total_count = total;
        }
        if let Some(imported) = self.imported_count {
            job.imported_count = imported;
        }
        if let Some(skipped) = self.skipped_count {
            job.skipped_count = skipped;
        }
        job.logs.extend(self.logs);
    }
}

/// Owner of the import dialog state.
///
/// Holds the current snapshot and replaces it wholesale on every change.
/// Each new snapshot is also broadcast to subscribers.
pub struct ProgressTracker {
    current: Mutex<Arc<ImportJob>>,
    tx: broadcast::Sender<Arc<ImportJob>>,
    clock: Arc<dyn Clock>,
    close_delay: Duration,
}

impl ProgressTracker {
    pub fn new(clock: Arc<dyn Clock>, close_delay: std::time::Duration) -> Self {
        let (tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            current: Mutex::new(Arc::new(ImportJob::idle())),
            tx,
            clock,
            close_delay: Duration::from_std(close_delay).unwrap_or(Duration::zero()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ImportJob>> {
        self.tx.subscribe()
    }

    /// Current snapshot, with the close deadline evaluated against the clock.
    ///
    /// A failed job past its deadline becomes closable; a successful one is
    /// discarded and the idle state is returned.
    pub fn snapshot(&self) -> Arc<ImportJob> {
        let now = self.clock.now();
        let mut current = self.lock();

        if current.is_expired_at(now) {
            debug!("Finished import dismissed after close delay");
            return self.publish(&mut current, ImportJob::idle());
        }

        if current.outcome.is_finished() && !current.can_close && current.can_close_at(now) {
            let mut next = (**current).clone();
            next.can_close = true;
            return self.publish(&mut current, next);
        }

        current.clone()
    }

    /// Open a new job. Fails without touching state if one is importing.
    pub fn begin(
        &self,
        source: ImportSource,
        step: impl Into<String>,
        progress: u8,
        log: impl Into<String>,
    ) -> AppResult<Arc<ImportJob>> {
        let mut current = self.lock();
        if current.is_importing {
            return Err(AppError::Conflict(
                "An import is already in progress".into(),
            ));
        }

        let mut job = ImportJob::started(source, step, progress);
        job.push_log(log);
        Ok(self.publish(&mut current, job))
    }

    /// Apply an update to the running job.
    pub fn advance(&self, update: JobUpdate) -> Arc<ImportJob> {
        let mut current = self.lock();
        if current.outcome != JobOutcome::Running {
            warn!(outcome = current.outcome.as_str(), "Ignoring update for a job that is not running");
            return current.clone();
        }

        let mut next = (**current).clone();
        update.apply_to(&mut next);
        self.publish(&mut current, next)
    }

    pub fn succeed(&self, update: JobUpdate) -> Arc<ImportJob> {
        self.finish(JobOutcome::Succeeded, update)
    }

    pub fn fail(&self, update: JobUpdate) -> Arc<ImportJob> {
        self.finish(JobOutcome::Failed, update)
    }

    /// Close the dialog. Only allowed once the deadline has passed.
    pub fn dismiss(&self) -> AppResult<Arc<ImportJob>> {
        let now = self.clock.now();
        let mut current = self.lock();
        if !current.can_close_at(now) {
            return Err(AppError::Conflict(
                "The import dialog cannot be closed yet".into(),
            ));
        }
        Ok(self.publish(&mut current, ImportJob::idle()))
    }

    fn finish(&self, outcome: JobOutcome, update: JobUpdate) -> Arc<ImportJob> {
        let mut current = self.lock();
        if current.outcome != JobOutcome::Running {
            warn!(outcome = current.outcome.as_str(), "Ignoring completion for a job that is not running");
            return current.clone();
        }

        let mut next = (**current).clone();
        update.apply_to(&mut next);
        next.is_importing = false;
        next.outcome = outcome;
        next.can_close = false;
        next.close_deadline = Some(self.clock.now() + self.close_delay);
        self.publish(&mut current, next)
    }

    fn publish(&self, slot: &mut Arc<ImportJob>, next: ImportJob) -> Arc<ImportJob> {
        let next = Arc::new(next);
        *slot = next.clone();
        // No subscribers is fine: the snapshot is still readable.
        let _ = self.tx.send(next.clone());
        next
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Arc<ImportJob>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}
