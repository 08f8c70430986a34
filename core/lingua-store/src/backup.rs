//! Timestamped JSON backups of a namespace.

use crate::dynamic::write_atomic;
use crate::error::StoreResult;
use chrono::Utc;
use lingua_types::Translation;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Writes `<dir>/<namespace>-<YYYYmmddTHHMMSS>.json` snapshots.
#[derive(Debug, Clone)]
pub struct BackupWriter {
    dir: PathBuf,
}

impl BackupWriter {
    /// Creates a writer targeting `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Backup directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes a backup of `entries`. Returns `None` without writing anything
    /// when there is nothing to back up.
    pub async fn write(
        &self,
        namespace: &str,
        entries: &[Arc<Translation>],
    ) -> StoreResult<Option<PathBuf>> {
        if entries.is_empty() {
            debug!("Skipping backup of empty namespace {}", namespace);
            return Ok(None);
        }
        let stamp = Utc::now().format("%Y%m%dT%H%M%S");
        let mut path = self.dir.join(format!("{namespace}-{stamp}.json"));
        let mut attempt = 1;
        while tokio::fs::try_exists(&path).await? {
            path = self.dir.join(format!("{namespace}-{stamp}-{attempt}.json"));
            attempt += 1;
        }

        let all: Vec<&Translation> = entries.iter().map(|entry| entry.as_ref()).collect();
        let json = serde_json::to_vec_pretty(&all)?;
        write_atomic(&path, &json).await?;
        info!(
            "Backed up namespace {} ({} entries) to {}",
            namespace,
            entries.len(),
            path.display()
        );
        Ok(Some(path))
    }

    /// Reads a backup back.
    pub async fn read(path: &Path) -> StoreResult<Vec<Translation>> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
