//! EPIC (Earth Polychromatic Imaging Camera) imagery.
//!
//! The metadata service lists the frames captured on a day; each frame's PNG
//! lives in a date-partitioned archive derived from its capture time.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::fetch::{ApiClient, FetchError, QueryParameters};
use crate::record::{Record, RecordSet, Scalar};

use super::{
    DEFAULT_API_ROOT, DEFAULT_EPIC_ARCHIVE_ROOT, ImageSource, decode, join_url, schema_error,
    with_empty_context,
};

const ENDPOINT: &str = "epic";

/// Output columns, in order.
pub const COLUMNS: [&str; 5] = [
    "identifier",
    "image_name",
    "caption",
    "capture_time",
    "image_url",
];

const CAPTURE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Image collection served by EPIC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpicCollection {
    #[default]
    Natural,
    Enhanced,
}

impl EpicCollection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Natural => "natural",
            Self::Enhanced => "enhanced",
        }
    }
}

impl fmt::Display for EpicCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EpicCollection {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "natural" => Ok(Self::Natural),
            "enhanced" => Ok(Self::Enhanced),
            other => Err(FetchError::validation(
                "collection",
                format!("'{other}' is not one of: natural, enhanced"),
            )),
        }
    }
}

/// Caller selection of EPIC frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpicRequest {
    pub date: NaiveDate,
    pub collection: EpicCollection,
}

impl EpicRequest {
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            collection: EpicCollection::default(),
        }
    }

    #[must_use]
    pub fn with_collection(mut self, collection: EpicCollection) -> Self {
        self.collection = collection;
        self
    }

    #[must_use]
    pub fn query(&self, api_key: &str) -> QueryParameters {
        QueryParameters::builder(api_key).build()
    }
}

impl ImageSource for EpicRequest {
    fn endpoint_name(&self) -> &'static str {
        ENDPOINT
    }

    fn url_column(&self) -> &'static str {
        "image_url"
    }

    fn name_column(&self) -> &'static str {
        "image_name"
    }
}

#[derive(Debug, Deserialize)]
struct EpicFrame {
    identifier: Option<String>,
    image: String,
    caption: Option<String>,
    date: String,
}

/// Client for the EPIC metadata service.
#[derive(Debug, Clone)]
pub struct EpicEndpoint {
    api_root: String,
    archive_root: String,
}

impl Default for EpicEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl EpicEndpoint {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_urls(DEFAULT_API_ROOT, DEFAULT_EPIC_ARCHIVE_ROOT)
    }

    #[must_use]
    pub fn with_base_urls(api_root: &str, archive_root: &str) -> Self {
        Self {
            api_root: api_root.to_string(),
            archive_root: archive_root.trim_end_matches('/').to_string(),
        }
    }

    fn metadata_url(&self, request: &EpicRequest) -> String {
        join_url(
            &self.api_root,
            &format!(
                "EPIC/api/{}/date/{}",
                request.collection,
                request.date.format("%Y-%m-%d")
            ),
        )
    }

    /// Fetches frame metadata and derives archive URLs.
    ///
    /// # Errors
    ///
    /// Any [`FetchError`]; `EmptyResult` for a day without frames.
    #[instrument(skip(self, client, api_key), fields(endpoint = ENDPOINT))]
    pub async fn fetch(
        &self,
        client: &ApiClient,
        api_key: &str,
        request: &EpicRequest,
    ) -> Result<RecordSet, FetchError> {
        let payload = client
            .get_json(&self.metadata_url(request), &request.query(api_key))
            .await?;
        normalize(payload, &self.archive_root, request.collection).map_err(|e| {
            with_empty_context(e, &format!("{} frames on {}", request.collection, request.date))
        })
    }
}

/// Builds `{archive_root}/{collection}/{YYYY}/{MM}/{DD}/png/{image}.png`.
///
/// `capture_time` may use a space or `T` between date and time.
///
/// # Errors
///
/// `MalformedResponse` if `capture_time` is not a date-time.
pub fn archive_url(
    archive_root: &str,
    collection: EpicCollection,
    image_name: &str,
    capture_time: &str,
) -> Result<String, FetchError> {
    let captured = parse_capture_time(capture_time)?;
    Ok(format!(
        "{}/{}/{:04}/{:02}/{:02}/png/{}.png",
        archive_root.trim_end_matches('/'),
        collection,
        captured.year(),
        captured.month(),
        captured.day(),
        image_name
    ))
}

fn parse_capture_time(value: &str) -> Result<NaiveDateTime, FetchError> {
    CAPTURE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value.trim(), format).ok())
        .ok_or_else(|| {
            FetchError::malformed(ENDPOINT, format!("capture time '{value}' is not a date-time"))
        })
}

/// Projects frames onto [`COLUMNS`] with derived archive URLs.
///
/// # Errors
///
/// `MalformedResponse` on shape mismatch or a bad capture time;
/// `EmptyResult` when the array is empty.
pub fn normalize(
    payload: Value,
    archive_root: &str,
    collection: EpicCollection,
) -> Result<RecordSet, FetchError> {
    let frames: Vec<EpicFrame> = decode(ENDPOINT, payload)?;
    if frames.is_empty() {
        return Err(FetchError::empty(ENDPOINT, "no frames listed"));
    }

    let mut set = RecordSet::with_columns(&COLUMNS);
    for frame in frames {
        let image_url = archive_url(archive_root, collection, &frame.image, &frame.date)?;
        let record = Record::new()
            .with(
                "identifier",
                Scalar::text_or_missing(frame.identifier.as_deref()),
            )
            .with("image_name", Scalar::Text(frame.image))
            .with("caption", Scalar::text_or_missing(frame.caption.as_deref()))
            .with("capture_time", Scalar::Text(frame.date))
            .with("image_url", Scalar::Text(image_url));
        set.push(record).map_err(|e| schema_error(ENDPOINT, &e))?;
    }
    debug!(frames = set.len(), "normalized EPIC frames");
    Ok(set)
}
