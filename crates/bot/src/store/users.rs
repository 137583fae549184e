//! User record store backed by `users.json`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lovesense_core::{UserId, UserPatch, UserRecord};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::{instrument, warn};

use super::StoreError;
use super::synced::SyncedFile;

/// Contents of `users.json`.
///
/// Entries whose key is not a user id, or whose value is not a record, are
/// kept verbatim in `foreign` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "BTreeMap<String, Value>")]
struct UsersFile {
    users: BTreeMap<UserId, UserRecord>,
    foreign: BTreeMap<String, Value>,
}

impl From<BTreeMap<String, Value>> for UsersFile {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let mut file = Self::default();
        for (key, value) in raw {
            let parsed = key
                .parse::<UserId>()
                .ok()
                .and_then(|id| UserRecord::deserialize(&value).ok().map(|record| (id, record)));
            match parsed {
                Some((id, record)) => {
                    file.users.insert(id, record);
                }
                None => {
                    warn!(key = %key, "Keeping unrecognized users.json entry as is");
                    file.foreign.insert(key, value);
                }
            }
        }
        file
    }
}

impl Serialize for UsersFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.users.len() + self.foreign.len()))?;
        for (key, value) in &self.foreign {
            map.serialize_entry(key, value)?;
        }
        for (id, record) in &self.users {
            map.serialize_entry(id, record)?;
        }
        map.end()
    }
}

/// Keyed collection of user records.
///
/// Records are created lazily and never deleted.
#[derive(Debug)]
pub struct UserStore {
    file: SyncedFile<UsersFile>,
}

impl UserStore {
    /// Open the store at `path`, loading whatever is on disk.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            file: SyncedFile::open(path.into()).await,
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Get a user's record, creating and persisting the default if absent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if a new default record could not be persisted.
    pub async fn get(&self, id: UserId) -> Result<UserRecord, StoreError> {
        self.get_or_create(id).await.map(|(record, _)| record)
    }

    /// Like [`get`](Self::get), also reporting whether the record was created.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if a new default record could not be persisted.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn get_or_create(&self, id: UserId) -> Result<(UserRecord, bool), StoreError> {
        if let Some(record) = self.peek(id).await {
            return Ok((record, false));
        }
        self.file
            .write(|file| match file.users.get(&id) {
                Some(record) => (record.clone(), false),
                None => {
                    file.users.insert(id, UserRecord::default());
                    (UserRecord::default(), true)
                }
            })
            .await
    }

    /// Read a record without creating it.
    pub async fn peek(&self, id: UserId) -> Option<UserRecord> {
        self.file.read(|file| file.users.get(&id).cloned()).await
    }

    /// Merge `patch` into the record for `id`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store could not be persisted.
    pub async fn upsert(&self, id: UserId, patch: UserPatch) -> Result<UserRecord, StoreError> {
        self.update(id, |record| {
            record.apply(patch);
            record.clone()
        })
        .await
    }

    /// Atomically read, modify and persist the record for `id`.
    ///
    /// The record is created with defaults if absent. `f` runs under the
    /// store lock against the latest file contents; if persisting fails,
    /// the change is discarded.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store could not be persisted.
    pub async fn update<R>(
        &self,
        id: UserId,
        f: impl FnOnce(&mut UserRecord) -> R,
    ) -> Result<R, StoreError> {
        self.file
            .write(|file| f(file.users.entry(id).or_default()))
            .await
    }

    /// Snapshot of every record, ordered by id.
    pub async fn all(&self) -> Vec<(UserId, UserRecord)> {
        self.file
            .read(|file| {
                file.users
                    .iter()
                    .map(|(id, record)| (*id, record.clone()))
                    .collect()
            })
            .await
    }

    /// Number of known users.
    pub async fn len(&self) -> usize {
        self.file.read(|file| file.users.len()).await
    }

    /// Whether no user has a record yet.
    pub async fn is_empty(&self) -> bool {
        self.file.read(|file| file.users.is_empty()).await
    }

    /// Rewrite the file from memory.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the file could not be written.
    pub async fn flush(&self) -> Result<(), StoreError> {
        self.file.flush().await
    }
}
