//! Astronomy Picture of the Day.
//!
//! Requests always use the range (`start_date`/`end_date`) or `count` form so
//! the service answers with an array, even for a single day.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::fetch::{ApiClient, FetchError, QueryParameters};
use crate::record::{Record, RecordSet, Scalar};

use super::{
    DEFAULT_API_ROOT, ImageSource, decode, ensure_ordered, join_url, schema_error,
    with_empty_context,
};

const ENDPOINT: &str = "apod";

/// Date of the first published picture.
pub const FIRST_APOD_DATE: (i32, u32, u32) = (1995, 6, 16);

/// Upper bound the service accepts for `count`.
pub const MAX_RANDOM_COUNT: u32 = 100;

/// Output columns, in order.
pub const COLUMNS: [&str; 7] = [
    "date",
    "title",
    "explanation",
    "url",
    "media_type",
    "hd_url",
    "copyright",
];

/// Caller selection of pictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApodRequest {
    /// Every picture between two dates, inclusive. `end` defaults to `start`.
    Range {
        start: NaiveDate,
        end: Option<NaiveDate>,
    },
    /// `count` randomly chosen pictures.
    Random { count: u32 },
}

impl ApodRequest {
    /// Pictures for a single day.
    #[must_use]
    pub fn day(date: NaiveDate) -> Self {
        Self::Range {
            start: date,
            end: None,
        }
    }

    /// Rejects ranges before the first picture, reversed ranges, and counts
    /// outside `1..=100`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Validation`].
    pub fn validate(&self) -> Result<(), FetchError> {
        match *self {
            Self::Range { start, end } => {
                let first = first_apod_date();
                if start < first {
                    return Err(FetchError::validation(
                        "start_date",
                        format!("{start} is before the first picture on {first}"),
                    ));
                }
                ensure_ordered(start, end.unwrap_or(start))
            }
            Self::Random { count } => {
                if count == 0 || count > MAX_RANDOM_COUNT {
                    return Err(FetchError::validation(
                        "count",
                        format!("{count} is outside 1..={MAX_RANDOM_COUNT}"),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Builds the query for this selection.
    #[must_use]
    pub fn query(&self, api_key: &str) -> QueryParameters {
        let builder = QueryParameters::builder(api_key);
        match *self {
            Self::Range { start, end } => builder
                .date("start_date", start)
                .date("end_date", end.unwrap_or(start))
                .build(),
            Self::Random { count } => builder.integer("count", count).build(),
        }
    }

    fn describe(&self) -> String {
        match *self {
            Self::Range { start, end } => format!("{start}..{}", end.unwrap_or(start)),
            Self::Random { count } => format!("{count} random entries"),
        }
    }
}

impl ImageSource for ApodRequest {
    fn endpoint_name(&self) -> &'static str {
        ENDPOINT
    }

    fn url_column(&self) -> &'static str {
        "url"
    }

    fn name_column(&self) -> &'static str {
        "title"
    }
}

fn first_apod_date() -> NaiveDate {
    let (y, m, d) = FIRST_APOD_DATE;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Deserialize)]
struct ApodEntry {
    date: String,
    title: Option<String>,
    explanation: Option<String>,
    url: Option<String>,
    media_type: Option<String>,
    hdurl: Option<String>,
    copyright: Option<String>,
}

/// Client for the APOD service.
#[derive(Debug, Clone)]
pub struct ApodEndpoint {
    url: String,
}

impl Default for ApodEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl ApodEndpoint {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_ROOT)
    }

    /// Points the endpoint at a different API root (used by tests).
    #[must_use]
    pub fn with_base_url(api_root: &str) -> Self {
        Self {
            url: join_url(api_root, "planetary/apod"),
        }
    }

    /// Validates, fetches, and normalizes one selection.
    ///
    /// # Errors
    ///
    /// Any [`FetchError`]; `EmptyResult` when no entry is an image.
    #[instrument(skip(self, client, api_key), fields(endpoint = ENDPOINT))]
    pub async fn fetch(
        &self,
        client: &ApiClient,
        api_key: &str,
        request: &ApodRequest,
    ) -> Result<RecordSet, FetchError> {
        request.validate()?;
        let payload = client.get_json(&self.url, &request.query(api_key)).await?;
        normalize(payload).map_err(|e| with_empty_context(e, &request.describe()))
    }
}

/// Keeps image entries and projects them onto [`COLUMNS`].
///
/// # Errors
///
/// `MalformedResponse` if the payload is not an array of entries;
/// `EmptyResult` if no entry has `media_type == "image"`.
pub fn normalize(payload: Value) -> Result<RecordSet, FetchError> {
    let entries: Vec<ApodEntry> = decode(ENDPOINT, payload)?;
    let total = entries.len();

    let mut set = RecordSet::with_columns(&COLUMNS);
    for entry in entries
        .into_iter()
        .filter(|e| e.media_type.as_deref() == Some("image"))
    {
        let record = Record::new()
            .with("date", Scalar::date_or_text(&entry.date))
            .with("title", Scalar::text_or_missing(entry.title.as_deref()))
            .with(
                "explanation",
                Scalar::text_or_missing(entry.explanation.as_deref()),
            )
            .with("url", Scalar::text_or_missing(entry.url.as_deref()))
            .with("media_type", Scalar::Text("image".to_string()))
            .with("hd_url", Scalar::text_or_missing(entry.hdurl.as_deref()))
            .with(
                "copyright",
                Scalar::text_or_missing(entry.copyright.as_deref().map(str::trim)),
            );
        set.push(record).map_err(|e| schema_error(ENDPOINT, &e))?;
    }

    debug!(total, images = set.len(), "normalized APOD entries");
    if set.is_empty() {
        return Err(FetchError::empty(
            ENDPOINT,
            format!("{total} entries returned, none with media_type \"image\""),
        ));
    }
    Ok(set)
}
