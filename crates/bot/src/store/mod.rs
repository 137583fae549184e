//! JSON file stores for users and orders.
//!
//! # Files
//!
//! - `users.json` - object keyed by user id ([`UserStore`])
//! - `orders.json` - array of orders in creation order ([`OrderStore`])
//!
//! Each store keeps its collection in memory behind a `tokio::sync::Mutex`
//! and rewrites the whole file on every mutation while the lock is held.
//! Mutations also hold an advisory lock on a `.lock` sibling and start from
//! the file as it is on disk, so the bot and the operator CLI can run side
//! by side. Writes go to a temporary sibling first and are renamed into
//! place, so a crash mid-write leaves the previous file intact.
//!
//! A missing or unreadable file is not fatal: the store starts empty and
//! logs a warning. A corrupt file is copied aside before it can be
//! overwritten. Write failures are always returned to the caller, and the
//! in-memory state is left as it was before the failed mutation.

pub mod orders;
mod synced;
pub mod users;

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

pub use orders::OrderStore;
pub use users::UserStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The file could not be read or written.
    #[error("storage unavailable at {}: {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but does not hold the expected data.
    #[error("corrupt data in {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    fn unavailable(path: &Path, source: std::io::Error) -> Self {
        Self::Unavailable {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Read and parse a JSON file.
///
/// Returns `Ok(None)` when the file does not exist.
///
/// # Errors
///
/// Returns `StoreError::Unavailable` on I/O failure and
/// `StoreError::Corrupt` when the content does not parse.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::unavailable(path, e)),
    };
    // The first version of the bot could leave a zero-length file behind.
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

/// Load a collection, falling back to its default on any read failure.
pub(crate) async fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match read_json(path).await {
        Ok(Some(value)) => value,
        Ok(None) => {
            debug!(path = %path.display(), "Store file missing, starting empty");
            T::default()
        }
        Err(e @ StoreError::Corrupt { .. }) => {
            let backup = corrupt_backup_path(path);
            match tokio::fs::copy(path, &backup).await {
                Ok(_) => warn!(
                    error = %e,
                    backup = %backup.display(),
                    "Store file corrupt, starting empty"
                ),
                Err(copy_err) => warn!(
                    error = %e,
                    copy_error = %copy_err,
                    "Store file corrupt and could not be backed up, starting empty"
                ),
            }
            T::default()
        }
        Err(e) => {
            warn!(error = %e, "Store file unreadable, starting empty");
            T::default()
        }
    }
}

/// Serialize `value` and atomically replace the file at `path`.
///
/// # Errors
///
/// Returns `StoreError::Unavailable` if any file operation fails.
pub async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::unavailable(parent, e))?;
    }

    let tmp = temp_path(path);
    let mut file = tokio::fs::File::create(&tmp)
        .await
        .map_err(|e| StoreError::unavailable(&tmp, e))?;
    file.write_all(&bytes)
        .await
        .map_err(|e| StoreError::unavailable(&tmp, e))?;
    file.sync_all()
        .await
        .map_err(|e| StoreError::unavailable(&tmp, e))?;
    drop(file);

    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| StoreError::unavailable(path, e))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn corrupt_backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".corrupt-{}", chrono::Utc::now().format("%Y%m%d%H%M%S")));
    path.with_file_name(name)
}
