//! Sync session records.

use crate::config::SyncDirection;
use chrono::{DateTime, Utc};
use lingua_types::SessionId;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a sync session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    Running,
    /// Finished with no errors.
    Success,
    /// Finished, but some files or entries failed.
    Partial,
    /// Aborted by an error, or rejected.
    Failed,
}

impl SyncStatus {
    /// Returns true once the session will not change any more.
    #[must_use]
    pub fn is_finished(self) -> bool {
        !matches!(self, SyncStatus::Running)
    }
}

/// Counters accumulated during a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCounts {
    /// Source or translation entries pushed to the remote service.
    pub uploaded: usize,
    /// Remote entries applied locally.
    pub downloaded: usize,
    /// Entries left alone because nothing changed.
    pub skipped: usize,
    /// Remote entries whose content differed from the local one.
    pub conflicts: usize,
}

/// One per-namespace sync run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSession {
    pub id: SessionId,
    pub namespace: String,
    pub direction: SyncDirection,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: SyncStatus,
    pub counts: SyncCounts,
    pub errors: Vec<String>,
}

impl SyncSession {
    /// Starts a running session.
    #[must_use]
    pub fn start(namespace: &str, direction: SyncDirection) -> Self {
        Self {
            id: SessionId::new(),
            namespace: namespace.to_string(),
            direction,
            started_at: Utc::now(),
            finished_at: None,
            status: SyncStatus::Running,
            counts: SyncCounts::default(),
            errors: Vec::new(),
        }
    }

    /// A session that failed before it started.
    #[must_use]
    pub fn rejected(namespace: &str, direction: SyncDirection, reason: impl Into<String>) -> Self {
        let mut session = Self::start(namespace, direction);
        session.fail(reason);
        session
    }

    /// Records a non-fatal error. The session will end as partial.
    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Ends the session as success or partial.
    pub fn finish(&mut self) {
        self.status = if self.errors.is_empty() {
            SyncStatus::Success
        } else {
            SyncStatus::Partial
        };
        self.finished_at = Some(Utc::now());
    }

    /// Ends the session as failed.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.status = SyncStatus::Failed;
        self.finished_at = Some(Utc::now());
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == SyncStatus::Running
    }

    /// Wall-clock duration, once finished.
    #[must_use]
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}
