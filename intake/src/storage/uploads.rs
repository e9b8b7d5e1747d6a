//! Upload sink: stores attachment payloads under generated names.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::Rng;
use tokio::{
    fs::{self, OpenOptions},
    io::AsyncWriteExt,
};
use tracing::{debug, warn};

use super::errors::{Result, StorageError};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 6;
const DEFAULT_EXTENSION: &str = ".bin";

/// Writes uploaded files into a single directory.
///
/// Stored names are `<unix millis>_<6 random base36 chars><extension>`, where the extension
/// is taken from the client's filename. The random suffix keeps two uploads from the same
/// millisecond apart; an actual collision is reported as an error instead of overwriting.
pub struct UploadSink {
    dir: PathBuf,
}

impl UploadSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of a previously stored upload.
    pub fn path_of(&self, stored_name: &str) -> PathBuf {
        self.dir.join(stored_name)
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::io("create directory", &self.dir, e))
    }

    /// Store `data` and return the generated name.
    pub async fn store(&self, filename_hint: &str, data: &[u8]) -> Result<String> {
        let stored_name = generate_name(filename_hint, Utc::now().timestamp_millis(), &mut rand::thread_rng());
        self.ensure_dir().await?;

        let path = self.path_of(&stored_name);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| StorageError::io("create", &path, e))?;

        let written = async {
            file.write_all(data).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;
        drop(file);

        if let Err(e) = written {
            let _ = fs::remove_file(&path).await;
            return Err(StorageError::io("write", &path, e));
        }

        debug!(stored_name = %stored_name, bytes = data.len(), "Stored upload");
        Ok(stored_name)
    }

    /// Best-effort removal of uploads whose record was never saved.
    pub async fn discard(&self, stored_names: &[String]) {
        for name in stored_names {
            let path = self.path_of(name);
            if let Err(e) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to remove discarded upload");
            }
        }
    }
}

fn generate_name<R: Rng>(filename_hint: &str, millis: i64, rng: &mut R) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{millis}_{suffix}{}", extension_of(filename_hint))
}

/// `.ext` of the hint when it is plain ASCII alphanumeric, otherwise the default.
fn extension_of(filename_hint: &str) -> String {
    Path::new(filename_hint)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{ext}"))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
