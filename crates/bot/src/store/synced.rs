//! In-memory copy of a JSON file shared with other processes.
//!
//! The bot and the operator CLI open the same files. Every mutation takes an
//! exclusive advisory lock on a `<file>.lock` sibling and re-reads the file
//! under it, so a write from one process is never replaced by another
//! process's stale copy. Reads pick up foreign writes when the file's
//! modification time or length changed.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{StoreError, load_or_default, read_json, write_json_atomic};

/// What identifies one version of the file on disk.
type Stamp = Option<(SystemTime, u64)>;

#[derive(Debug)]
struct Snapshot<T> {
    value: T,
    stamp: Stamp,
}

/// A JSON document kept in memory and in step with its file.
#[derive(Debug)]
pub struct SyncedFile<T> {
    path: PathBuf,
    state: Mutex<Snapshot<T>>,
}

impl<T> SyncedFile<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + PartialEq + Send,
{
    /// Load `path`, starting from the default when it is missing or broken.
    pub async fn open(path: PathBuf) -> Self {
        let value = load_or_default(&path).await;
        let stamp = stamp(&path).await;
        Self {
            path,
            state: Mutex::new(Snapshot { value, stamp }),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` over the current contents.
    pub async fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let mut snapshot = self.state.lock().await;
        let current = stamp(&self.path).await;
        if current.is_some() && current != snapshot.stamp {
            self.reload(&mut snapshot, current).await;
        }
        f(&snapshot.value)
    }

    /// Apply `f` to a fresh copy, persist it, then swap it in.
    ///
    /// Nothing is written when `f` leaves the contents unchanged. On error
    /// the in-memory contents stay as they were read under the lock.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the lock cannot be taken or the file cannot
    /// be written.
    pub async fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, StoreError> {
        self.write_with(f, false).await
    }

    /// Rewrite the file from memory, merged with any foreign writes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the lock cannot be taken or the file cannot
    /// be written.
    pub async fn flush(&self) -> Result<(), StoreError> {
        self.write_with(|_| (), true).await
    }

    async fn write_with<R>(
        &self,
        f: impl FnOnce(&mut T) -> R,
        always: bool,
    ) -> Result<R, StoreError> {
        let mut snapshot = self.state.lock().await;
        let _lock = FileLock::acquire(&self.path).await?;

        let current = stamp(&self.path).await;
        if current.is_some() {
            self.reload(&mut snapshot, current).await;
        }

        let mut next = snapshot.value.clone();
        let out = f(&mut next);
        if always || next != snapshot.value {
            write_json_atomic(&self.path, &next).await?;
            snapshot.value = next;
            snapshot.stamp = stamp(&self.path).await;
        }
        Ok(out)
    }

    async fn reload(&self, snapshot: &mut Snapshot<T>, current: Stamp) {
        match read_json::<T>(&self.path).await {
            Ok(Some(value)) => {
                debug!(path = %self.path.display(), "Store file changed on disk, reloaded");
                snapshot.value = value;
                snapshot.stamp = current;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Store file unreadable, keeping in-memory copy"),
        }
    }
}

async fn stamp(path: &Path) -> Stamp {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    if !metadata.is_file() {
        return None;
    }
    Some((metadata.modified().ok()?, metadata.len()))
}

/// Exclusive advisory lock on `<file>.lock`, released on drop.
struct FileLock {
    _file: std::fs::File,
}

impl FileLock {
    async fn acquire(path: &Path) -> Result<Self, StoreError> {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        let lock_path = path.with_file_name(name);

        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::unavailable(parent, e))?;
        }

        let target = lock_path.clone();
        let file = tokio::task::spawn_blocking(move || -> std::io::Result<std::fs::File> {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&target)?;
            file.lock_exclusive()?;
            Ok(file)
        })
        .await
        .map_err(std::io::Error::other)
        .and_then(|result| result)
        .map_err(|e| StoreError::unavailable(&lock_path, e))?;

        Ok(Self { _file: file })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_merges_foreign_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.json");
        let ours: SyncedFile<Vec<u32>> = SyncedFile::open(path.clone()).await;
        let theirs: SyncedFile<Vec<u32>> = SyncedFile::open(path.clone()).await;

        ours.write(|v| v.push(1)).await.unwrap();
        theirs.write(|v| v.push(2)).await.unwrap();
        ours.write(|v| v.push(3)).await.unwrap();

        let on_disk: Vec<u32> = read_json(&path).await.unwrap().unwrap();
        assert_eq!(on_disk, vec![1, 2, 3]);
        assert_eq!(theirs.read(Clone::clone).await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_flush_keeps_foreign_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.json");
        let ours: SyncedFile<Vec<u32>> = SyncedFile::open(path.clone()).await;
        let theirs: SyncedFile<Vec<u32>> = SyncedFile::open(path.clone()).await;

        theirs.write(|v| v.push(7)).await.unwrap();
        ours.flush().await.unwrap();

        let on_disk: Vec<u32> = read_json(&path).await.unwrap().unwrap();
        assert_eq!(on_disk, vec![7]);
    }

    #[tokio::test]
    async fn test_unchanged_write_skips_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.json");
        let file: SyncedFile<Vec<u32>> = SyncedFile::open(path.clone()).await;

        let len = file.write(|v| v.len()).await.unwrap();
        assert_eq!(len, 0);
        assert!(!path.exists());
    }
}
