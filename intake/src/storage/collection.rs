//! Generic JSON-array collection backed by a single file.

use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::{fs, sync::Mutex};
use tracing::{debug, instrument, warn};

use super::errors::{Result, StorageError};
use super::write_atomic;

/// A record that can live in a [`JsonCollection`].
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Identifier used by [`JsonCollection::delete_by_id`]
    fn id(&self) -> i64;
}

/// One element of a collection file.
///
/// Elements that do not fit `T` are kept verbatim, so loading and rewriting a file never drops
/// data written by other tools or older versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry<T> {
    Record(T),
    Unrecognized(Value),
}

impl<T: Record> Entry<T> {
    /// Id used for deletion. Unrecognized elements match on an integer `id` key, if any.
    pub fn id(&self) -> Option<i64> {
        match self {
            Entry::Record(record) => Some(record.id()),
            Entry::Unrecognized(value) => value.get("id").and_then(Value::as_i64),
        }
    }

    pub fn into_record(self) -> Option<T> {
        match self {
            Entry::Record(record) => Some(record),
            Entry::Unrecognized(_) => None,
        }
    }
}

/// An ordered collection of records persisted as one pretty-printed JSON array.
///
/// Every mutation loads the whole file, modifies it in memory and writes the whole file back.
/// Mutations on the same collection are serialised by an internal async mutex, so appends and
/// deletes from concurrent requests never lose each other's writes within this process.
pub struct JsonCollection<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> JsonCollection<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seed the backing file with an empty array if it does not exist yet.
    pub async fn ensure_exists(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let exists = fs::try_exists(&self.path)
            .await
            .map_err(|e| StorageError::io("inspect", &self.path, e))?;
        if !exists {
            debug!(path = %self.path.display(), "Creating empty collection file");
            self.write_entries(&[]).await?;
        }
        Ok(())
    }

    /// Load every element, in insertion order.
    ///
    /// A missing file, or one that is not a JSON array, yields an empty collection.
    pub async fn load_all(&self) -> Vec<Entry<T>> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Collection file missing, treating as empty");
                return Vec::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read collection file, treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<Entry<T>>>(&raw) {
            Ok(entries) => {
                let unrecognized = entries.iter().filter(|e| matches!(e, Entry::Unrecognized(_))).count();
                if unrecognized > 0 {
                    debug!(path = %self.path.display(), unrecognized, "Keeping elements that are not records verbatim");
                }
                entries
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Collection file is not a JSON array, treating as empty");
                Vec::new()
            }
        }
    }

    /// Append a record and persist the whole collection. Returns the stored record.
    #[instrument(skip_all, fields(path = %self.path.display(), id = record.id()))]
    pub async fn append(&self, record: T) -> Result<T> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_all().await;
        entries.push(Entry::Record(record.clone()));
        self.write_entries(&entries).await?;
        debug!(count = entries.len(), "Appended record");
        Ok(record)
    }

    /// Remove every record with the given id. Returns whether anything was removed.
    ///
    /// When nothing matches, the file is left untouched.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn delete_by_id(&self, id: i64) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_all().await;
        let before = entries.len();
        entries.retain(|entry| entry.id() != Some(id));

        if entries.len() == before {
            debug!("No record matched, nothing to delete");
            return Ok(false);
        }

        self.write_entries(&entries).await?;
        debug!(removed = before - entries.len(), "Deleted records");
        Ok(true)
    }

    /// Replace the collection with `entries`.
    pub async fn persist(&self, entries: &[Entry<T>]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_entries(entries).await
    }

    async fn write_entries(&self, entries: &[Entry<T>]) -> Result<()> {
        let contents = serde_json::to_vec_pretty(entries).map_err(|cause| StorageError::Serialize {
            path: self.path.clone(),
            cause,
        })?;
        write_atomic(&self.path, &contents).await
    }
}
