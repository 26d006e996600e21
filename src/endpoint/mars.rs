//! Mars rover photos.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::fetch::{ApiClient, FetchError, QueryParameters};
use crate::record::{Record, RecordSet, Scalar};

use super::{DEFAULT_API_ROOT, ImageSource, decode, join_url, schema_error, with_empty_context};

const ENDPOINT: &str = "mars";

/// Output columns, in order.
pub const COLUMNS: [&str; 6] = [
    "id",
    "sol",
    "camera_full_name",
    "image_source_url",
    "earth_date",
    "rover_name",
];

/// Rovers the photo service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rover {
    Curiosity,
    Opportunity,
    Spirit,
    Perseverance,
}

impl Rover {
    pub const ALL: [Self; 4] = [
        Self::Curiosity,
        Self::Opportunity,
        Self::Spirit,
        Self::Perseverance,
    ];

    /// Path segment used by the service.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Curiosity => "curiosity",
            Self::Opportunity => "opportunity",
            Self::Spirit => "spirit",
            Self::Perseverance => "perseverance",
        }
    }
}

impl fmt::Display for Rover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match against the four rover names.
impl FromStr for Rover {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|rover| rover.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|r| r.as_str()).collect();
                FetchError::validation(
                    "rover",
                    format!("'{s}' is not one of: {}", known.join(", ")),
                )
            })
    }
}

/// Which day's photos to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoDay {
    EarthDate(NaiveDate),
    /// Martian solar day counted from landing.
    Sol(u32),
}

/// Caller selection of rover photos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarsRequest {
    /// Rover name as supplied by the caller; checked by [`validate`](Self::validate).
    pub rover: String,
    pub day: PhotoDay,
    /// Optional camera abbreviation (e.g. `FHAZ`, `NAVCAM`).
    pub camera: Option<String>,
}

impl MarsRequest {
    #[must_use]
    pub fn new(rover: impl Into<String>, day: PhotoDay) -> Self {
        Self {
            rover: rover.into(),
            day,
            camera: None,
        }
    }

    #[must_use]
    pub fn with_camera(mut self, camera: impl Into<String>) -> Self {
        self.camera = Some(camera.into());
        self
    }

    /// Resolves the rover name.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Validation`] for an unknown rover or a blank camera.
    pub fn validate(&self) -> Result<Rover, FetchError> {
        let rover = self.rover.parse::<Rover>()?;
        if self.camera.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(FetchError::validation("camera", "must not be blank"));
        }
        Ok(rover)
    }

    #[must_use]
    pub fn query(&self, api_key: &str) -> QueryParameters {
        let builder = QueryParameters::builder(api_key);
        let builder = match self.day {
            PhotoDay::EarthDate(date) => builder.date("earth_date", date),
            PhotoDay::Sol(sol) => builder.integer("sol", sol),
        };
        builder
            .optional_text("camera", self.camera.as_deref().map(str::trim))
            .build()
    }

    fn describe(&self) -> String {
        let day = match self.day {
            PhotoDay::EarthDate(date) => format!("earth date {date}"),
            PhotoDay::Sol(sol) => format!("sol {sol}"),
        };
        match &self.camera {
            Some(camera) => format!("{} on {day}, camera {camera}", self.rover),
            None => format!("{} on {day}", self.rover),
        }
    }
}

impl ImageSource for MarsRequest {
    fn endpoint_name(&self) -> &'static str {
        ENDPOINT
    }

    fn url_column(&self) -> &'static str {
        "image_source_url"
    }

    fn name_column(&self) -> &'static str {
        "id"
    }
}

#[derive(Debug, Deserialize)]
struct PhotosPayload {
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    id: i64,
    sol: i64,
    camera: Camera,
    img_src: String,
    earth_date: String,
    rover: RoverInfo,
}

#[derive(Debug, Deserialize)]
struct Camera {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct RoverInfo {
    name: String,
}

/// Client for the rover photo service.
#[derive(Debug, Clone)]
pub struct MarsEndpoint {
    api_root: String,
}

impl Default for MarsEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl MarsEndpoint {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_ROOT)
    }

    #[must_use]
    pub fn with_base_url(api_root: &str) -> Self {
        Self {
            api_root: api_root.to_string(),
        }
    }

    fn photos_url(&self, rover: Rover) -> String {
        join_url(
            &self.api_root,
            &format!("mars-photos/api/v1/rovers/{rover}/photos"),
        )
    }

    /// Validates the rover name, then fetches and normalizes.
    ///
    /// # Errors
    ///
    /// `Validation` before any request for an unknown rover; otherwise any
    /// [`FetchError`], with `EmptyResult` for a day without photos.
    #[instrument(skip(self, client, api_key), fields(endpoint = ENDPOINT))]
    pub async fn fetch(
        &self,
        client: &ApiClient,
        api_key: &str,
        request: &MarsRequest,
    ) -> Result<RecordSet, FetchError> {
        let rover = request.validate()?;
        let payload = client
            .get_json(&self.photos_url(rover), &request.query(api_key))
            .await?;
        normalize(payload).map_err(|e| with_empty_context(e, &request.describe()))
    }
}

/// Projects `photos` onto [`COLUMNS`].
///
/// # Errors
///
/// `MalformedResponse` on shape mismatch; `EmptyResult` when `photos` is empty.
pub fn normalize(payload: Value) -> Result<RecordSet, FetchError> {
    let payload: PhotosPayload = decode(ENDPOINT, payload)?;
    if payload.photos.is_empty() {
        return Err(FetchError::empty(ENDPOINT, "photos array is empty"));
    }

    let mut set = RecordSet::with_columns(&COLUMNS);
    for photo in payload.photos {
        let record = Record::new()
            .with("id", Scalar::Integer(photo.id))
            .with("sol", Scalar::Integer(photo.sol))
            .with("camera_full_name", Scalar::Text(photo.camera.full_name))
            .with("image_source_url", Scalar::Text(photo.img_src))
            .with("earth_date", Scalar::date_or_text(&photo.earth_date))
            .with("rover_name", Scalar::Text(photo.rover.name));
        set.push(record).map_err(|e| schema_error(ENDPOINT, &e))?;
    }
    debug!(photos = set.len(), "normalized rover photos");
    Ok(set)
}
