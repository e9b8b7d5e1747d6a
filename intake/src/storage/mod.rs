//! File-backed persistence for submissions, notification settings and uploads.
//!
//! There is no database underneath: every store owns one file (or, for uploads, one
//! directory) and performs whole-file load-modify-persist cycles.
//!
//! ```text
//! ┌──────────────┐
//! │   Handlers   │  (api::handlers)
//! └──────┬───────┘
//!        │
//!        ↓
//! ┌──────────────┐   ┌───────────────┐   ┌─────────────┐
//! │ Submissions  │   │ SettingsStore │   │ UploadSink  │
//! └──────┬───────┘   └───────┬───────┘   └──────┬──────┘
//!        ↓                   │                  │
//! ┌──────────────┐           │                  │
//! │JsonCollection│           │                  │
//! └──────┬───────┘           │                  │
//!        ↓                   ↓                  ↓
//!   data.json / lead-data.json / settings   uploads/<blob>
//! ```
//!
//! # Modules
//!
//! - [`collection`]: generic JSON array collection keyed by record id
//! - [`submissions`]: lead and diagnosis stores built on a collection
//! - [`models`]: the persisted [`Submission`] record
//! - [`settings`]: Telegram bot token and chat id
//! - [`uploads`]: opaque-named file blobs
//! - [`errors`]: storage error type
//!
//! # Failure semantics
//!
//! Reads never fail: a missing or unparseable file is an empty collection (or default
//! settings). Writes go to a temporary sibling file that is flushed, synced and then renamed
//! over the target, so a crash mid-write leaves the previous contents intact. Write failures
//! surface as [`StorageError`].
//!
//! Each store serialises its own read-modify-write cycles behind an async mutex. This is only
//! sufficient for a single process; running several processes against the same files needs an
//! external lock.

pub mod collection;
pub mod errors;
pub mod models;
pub mod settings;
pub mod submissions;
pub mod uploads;

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

pub use collection::{Entry, JsonCollection, Record};
pub use errors::{Result, StorageError};
pub use models::{Attachments, NewSubmission, Submission, SubmissionKind};
pub use settings::{NotificationSettings, SettingsStatus, SettingsStore, SettingsUpdate};
pub use submissions::Submissions;
pub use uploads::UploadSink;

/// Replace `path` with `contents` via a synced temporary file and an atomic rename.
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::io("create directory", parent, e))?;
    }

    let tmp_path = temporary_path(path);
    let written = async {
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(contents).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp_path, path).await
    }
    .await;

    if let Err(e) = written {
        // Best effort: the original file is untouched, only the temp file may linger
        let _ = fs::remove_file(&tmp_path).await;
        return Err(StorageError::io("write", path, e));
    }

    Ok(())
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
