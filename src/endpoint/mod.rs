//! Endpoint request builders and normalizers.
//!
//! Each endpoint module follows the same pipeline: validate caller input,
//! build [`QueryParameters`](crate::fetch::QueryParameters), issue one
//! request (or a bounded sequence of page requests for [`search`]), then
//! decode the payload into a closed, endpoint-specific shape and project it
//! onto a fixed [`RecordSet`](crate::record::RecordSet) schema.
//!
//! - [`apod`] - Astronomy picture of the day
//! - [`mars`] - Mars rover photos
//! - [`epic`] - EPIC Earth imagery
//! - [`neo`] - Near-Earth object feed
//! - [`search`] - CMR dataset-collection search with pagination

pub mod apod;
pub mod epic;
pub mod mars;
pub mod neo;
pub mod search;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::fetch::FetchError;
use crate::record::RecordError;

/// Root of the api.nasa.gov services (APOD, Mars photos, EPIC metadata, NeoWs).
pub const DEFAULT_API_ROOT: &str = "https://api.nasa.gov";

/// Root of the EPIC image archive.
pub const DEFAULT_EPIC_ARCHIVE_ROOT: &str = "https://epic.gsfc.nasa.gov/archive";

/// Root of the Common Metadata Repository search service.
pub const DEFAULT_CMR_ROOT: &str = "https://cmr.earthdata.nasa.gov";

/// Endpoints whose records point at downloadable images.
///
/// The persist stage uses this to find the URL and file-name columns of a
/// [`RecordSet`](crate::record::RecordSet) without knowing the endpoint.
pub trait ImageSource {
    /// Short endpoint name used in logs and default folder names.
    fn endpoint_name(&self) -> &'static str;

    /// Column holding the image URL.
    fn url_column(&self) -> &'static str;

    /// Column used to derive the saved file name.
    fn name_column(&self) -> &'static str;
}

/// Parses a caller-supplied `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`FetchError::Validation`] naming `field` when the string is not
/// an ISO calendar date.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, FetchError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        FetchError::validation(field, format!("'{value}' is not a YYYY-MM-DD date"))
    })
}

pub(crate) fn ensure_ordered(start: NaiveDate, end: NaiveDate) -> Result<(), FetchError> {
    if end < start {
        return Err(FetchError::validation(
            "end_date",
            format!("{end} is before start date {start}"),
        ));
    }
    Ok(())
}

pub(crate) fn decode<T: DeserializeOwned>(endpoint: &'static str, payload: Value) -> Result<T, FetchError> {
    serde_json::from_value(payload)
        .map_err(|e| FetchError::malformed(endpoint, format!("unexpected payload shape: {e}")))
}

pub(crate) fn schema_error(endpoint: &'static str, error: &RecordError) -> FetchError {
    FetchError::malformed(endpoint, error.to_string())
}

/// Appends request context to an `EmptyResult` detail; other errors pass through.
pub(crate) fn with_empty_context(error: FetchError, context: &str) -> FetchError {
    match error {
        FetchError::EmptyResult { endpoint, detail } => FetchError::EmptyResult {
            endpoint,
            detail: format!("{detail} ({context})"),
        },
        other => other,
    }
}

pub(crate) fn join_url(root: &str, path: &str) -> String {
    format!("{}/{}", root.trim_end_matches('/'), path.trim_start_matches('/'))
}
