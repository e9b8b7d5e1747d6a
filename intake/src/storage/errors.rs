use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised when writing to the file-backed stores.
///
/// Reads never produce this error; they degrade to empty data instead.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem operation failed
    #[error("Failed to {operation} {}: {cause}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        cause: std::io::Error,
    },

    /// Records could not be serialized
    #[error("Failed to serialize {}: {cause}", path.display())]
    Serialize { path: PathBuf, cause: serde_json::Error },
}

impl StorageError {
    pub(crate) fn io(operation: &'static str, path: &Path, cause: std::io::Error) -> Self {
        StorageError::Io {
            operation,
            path: path.to_path_buf(),
            cause,
        }
    }
}

/// Type alias for storage operation results
pub type Result<T> = std::result::Result<T, StorageError>;
