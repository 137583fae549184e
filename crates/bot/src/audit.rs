//! Append-only action log.
//!
//! Every state change (and every refused admin attempt) becomes one line in
//! `actions.log`. Lines are also emitted as `tracing` events with target
//! `audit`, so they show up in the structured log stream as well.

use std::path::{Path, PathBuf};

use lovesense_core::AuditEntry;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::store::StoreError;

/// Writer for the action log file.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    // Serializes appends so lines never interleave.
    lock: Mutex<()>,
}

impl AuditLog {
    /// Create a log writing to `path`. The file is created on first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the line could not be written.
    pub async fn append(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        info!(
            target: "audit",
            action = entry.action.name(),
            subject = %entry.subject,
            actor = %entry.actor,
            "{entry}"
        );

        let line = format!("{entry}\n");
        let _guard = self.lock.lock().await;
        let unavailable = |source| StoreError::Unavailable {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(unavailable)?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(unavailable)?;
        file.write_all(line.as_bytes()).await.map_err(unavailable)?;
        file.flush().await.map_err(unavailable)
    }

    /// Append one entry, logging instead of returning a failure.
    ///
    /// Used after a store mutation has already been committed, where the
    /// caller cannot undo the change.
    pub async fn record(&self, entry: AuditEntry) {
        if let Err(e) = self.append(&entry).await {
            error!(error = %e, entry = %entry, "Failed to write action log");
        }
    }

    /// The last `limit` lines of the log, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the file exists but cannot be read.
    pub async fn read_recent(&self, limit: usize) -> Result<Vec<String>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Unavailable {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let lines: Vec<&str> = content.lines().filter(|l| !l.is_empty()).collect();
        let skip = lines.len().saturating_sub(limit);
        Ok(lines.into_iter().skip(skip).map(str::to_owned).collect())
    }

    /// Whether anything has been logged yet.
    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }
}
