use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::import::ImportSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl JobOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Snapshot of the import dialog state.
///
/// Snapshots are immutable once published by the tracker; every phase of an
/// import produces a fresh value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportJob {
    pub id: Option<Uuid>,
    pub source: Option<ImportSource>,
    pub is_importing: bool,
    pub current_step: String,
    /// Percent complete, 0..=100.
    pub progress: u8,
    pub total_count: u32,
    pub imported_count: u32,
    pub skipped_count: u32,
    pub logs: Vec<String>,
    pub can_close: bool,
    pub outcome: JobOutcome,
    /// Instant after which a finished dialog may be dismissed.
    pub close_deadline: Option<DateTime<Utc>>,
}

impl Default for ImportJob {
    fn default() -> Self {
        Self::idle()
    }
}

impl ImportJob {
    /// The state with no dialog open. Nothing blocks dismissal, so
    /// `can_close` is true.
    pub fn idle() -> Self {
        Self {
            id: None,
            source: None,
            is_importing: false,
            current_step: String::new(),
            progress: 0,
            total_count: 0,
            imported_count: 0,
            skipped_count: 0,
            logs: Vec::new(),
            can_close: true,
            outcome: JobOutcome::Idle,
            close_deadline: None,
        }
    }

    pub fn started(source: ImportSource, step: impl Into<String>, progress: u8) -> Self {
        Self {
            id: Some(Uuid::new_v4()),
            source: Some(source),
            is_importing: true,
            current_step: step.into(),
            progress: progress.min(100),
            can_close: false,
            outcome: JobOutcome::Running,
            ..Self::idle()
        }
    }

    pub fn is_idle(&self) -> bool {
        self.outcome == JobOutcome::Idle
    }

    /// Whether the dialog may be dismissed at `now`.
    pub fn can_close_at(&self, now: DateTime<Utc>) -> bool {
        match self.outcome {
            JobOutcome::Idle => true,
            JobOutcome::Running => false,
            JobOutcome::Succeeded | JobOutcome::Failed => {
                self.close_deadline.is_some_and(|deadline| now >= deadline)
            }
        }
    }

    /// A successful job whose deadline has passed is discarded.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.outcome == JobOutcome::Succeeded && self.can_close_at(now)
    }

    pub fn push_log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
    }
}
