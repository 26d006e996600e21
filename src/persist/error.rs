//! Error types for saving images to disk.

use std::path::PathBuf;

use thiserror::Error;

use crate::fetch::FetchError;

/// Errors that can occur while persisting a record set's images.
#[derive(Debug, Error)]
pub enum PersistError {
    /// File system error (create folder, create file, write).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Fetching or streaming an image body failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl PersistError {
    /// Creates an IO error.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
