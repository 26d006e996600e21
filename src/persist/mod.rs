//! Saving a record set's images to disk.
//!
//! Persisting is a separate stage from retrieval: it takes an already
//! normalized [`RecordSet`], fetches each record's image with a single GET,
//! and streams the bytes unchanged into a destination folder.
//!
//! # Example
//!
//! ```no_run
//! use spacefetch_core::endpoint::apod::{ApodEndpoint, ApodRequest};
//! use spacefetch_core::fetch::ApiClient;
//! use spacefetch_core::persist::ImageStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new()?;
//! let request = ApodRequest::Random { count: 3 };
//! let records = ApodEndpoint::new().fetch(&client, "DEMO_KEY", &request).await?;
//! let saved = ImageStore::new(".", "apod")
//!     .save_source(&client, &records, &request)
//!     .await?;
//! println!("saved {} images", saved.len());
//! # Ok(())
//! # }
//! ```

mod error;
mod filename;

pub use error::PersistError;

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};

use crate::endpoint::ImageSource;
use crate::fetch::{ApiClient, FetchError};
use crate::record::RecordSet;

use filename::{image_file_name, resolve_unique_path};

/// Destination folder for saved images.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    /// Images will be written to `root/folder`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>, folder: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join(folder),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of records [`save_all`](Self::save_all) would fetch, i.e. those
    /// whose `url_column` holds text.
    #[must_use]
    pub fn count_saveable(records: &RecordSet, url_column: &str) -> usize {
        records
            .iter()
            .filter(|record| record.get(url_column).and_then(|v| v.as_text()).is_some())
            .count()
    }

    /// Saves every image of an endpoint's record set.
    ///
    /// # Errors
    ///
    /// See [`save_all`](Self::save_all).
    pub async fn save_source<S: ImageSource + ?Sized>(
        &self,
        client: &ApiClient,
        records: &RecordSet,
        source: &S,
    ) -> Result<Vec<PathBuf>, PersistError> {
        debug!(endpoint = source.endpoint_name(), "saving images");
        self.save_all(client, records, source.url_column(), source.name_column())
            .await
    }

    /// Fetches and writes each record's image in order, returning the paths
    /// written.
    ///
    /// Records whose `url_column` is not text are skipped. The first failure
    /// stops the loop.
    ///
    /// # Errors
    ///
    /// [`PersistError::Io`] if the folder or a file cannot be written;
    /// [`PersistError::Fetch`] if an image request fails.
    pub async fn save_all(
        &self,
        client: &ApiClient,
        records: &RecordSet,
        url_column: &str,
        name_column: &str,
    ) -> Result<Vec<PathBuf>, PersistError> {
        self.save_all_with(client, records, url_column, name_column, |_| {})
            .await
    }

    /// Like [`save_all`](Self::save_all), calling `on_saved` after each file.
    ///
    /// # Errors
    ///
    /// See [`save_all`](Self::save_all).
    #[instrument(skip(self, client, records, on_saved), fields(dir = %self.dir.display()))]
    pub async fn save_all_with<F>(
        &self,
        client: &ApiClient,
        records: &RecordSet,
        url_column: &str,
        name_column: &str,
        mut on_saved: F,
    ) -> Result<Vec<PathBuf>, PersistError>
    where
        F: FnMut(&Path),
    {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PersistError::io(&self.dir, e))?;

        let mut saved = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let Some(url) = record.get(url_column).and_then(|v| v.as_text()) else {
                warn!(index, column = url_column, "record has no image URL, skipping");
                continue;
            };
            let name = record
                .get(name_column)
                .map(ToString::to_string)
                .unwrap_or_default();
            let path = self.save_one(client, url, &name).await?;
            info!(path = %path.display(), "saved image");
            on_saved(&path);
            saved.push(path);
        }
        Ok(saved)
    }

    async fn save_one(
        &self,
        client: &ApiClient,
        url: &str,
        name: &str,
    ) -> Result<PathBuf, PersistError> {
        let response = client.get_image(url).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let file_name = image_file_name(name, url, content_type.as_deref());
        let path = resolve_unique_path(&self.dir, &file_name);
        debug!(url, path = %path.display(), "streaming image");

        let file = File::create(&path)
            .await
            .map_err(|e| PersistError::io(&path, e))?;
        let result = stream_to_file(file, response, url, &path).await;
        if result.is_err() {
            debug!(path = %path.display(), "removing partial file after error");
            let _ = tokio::fs::remove_file(&path).await;
        }
        let bytes = result?;
        debug!(bytes, "image written");
        Ok(path)
    }
}

async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    path: &Path,
) -> Result<u64, PersistError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| FetchError::request(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| PersistError::io(path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer.flush().await.map_err(|e| PersistError::io(path, e))?;
    Ok(bytes_written)
}
