//! Near-Earth object feed.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::fetch::{ApiClient, FetchError, QueryParameters};
use crate::record::{Record, RecordSet, Scalar};

use super::{
    DEFAULT_API_ROOT, decode, ensure_ordered, join_url, schema_error, with_empty_context,
};

const ENDPOINT: &str = "neo";

/// Longest span, in days, the feed serves in one call.
pub const MAX_SPAN_DAYS: i64 = 7;

/// Output columns, in order.
pub const COLUMNS: [&str; 7] = [
    "name",
    "close_approach_date",
    "relative_velocity_kph",
    "miss_distance_km",
    "estimated_diameter_min_m",
    "estimated_diameter_max_m",
    "is_potentially_hazardous",
];

/// Caller selection of a feed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeoRequest {
    pub start: NaiveDate,
    /// Defaults to `start`.
    pub end: Option<NaiveDate>,
}

impl NeoRequest {
    #[must_use]
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    fn end_or_start(&self) -> NaiveDate {
        self.end.unwrap_or(self.start)
    }

    /// # Errors
    ///
    /// [`FetchError::Validation`] for a reversed window or one longer than
    /// [`MAX_SPAN_DAYS`].
    pub fn validate(&self) -> Result<(), FetchError> {
        let end = self.end_or_start();
        ensure_ordered(self.start, end)?;
        let span = (end - self.start).num_days();
        if span > MAX_SPAN_DAYS {
            return Err(FetchError::validation(
                "end_date",
                format!("window of {span} days exceeds the feed limit of {MAX_SPAN_DAYS}"),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn query(&self, api_key: &str) -> QueryParameters {
        QueryParameters::builder(api_key)
            .date("start_date", self.start)
            .date("end_date", self.end_or_start())
            .build()
    }
}

#[derive(Debug, Deserialize)]
struct FeedPayload {
    near_earth_objects: BTreeMap<String, Vec<Asteroid>>,
}

#[derive(Debug, Deserialize)]
struct Asteroid {
    name: String,
    estimated_diameter: Diameters,
    is_potentially_hazardous_asteroid: bool,
    #[serde(default)]
    close_approach_data: Vec<CloseApproach>,
}

#[derive(Debug, Deserialize)]
struct Diameters {
    meters: DiameterRange,
}

#[derive(Debug, Deserialize)]
struct DiameterRange {
    estimated_diameter_min: f64,
    estimated_diameter_max: f64,
}

#[derive(Debug, Deserialize)]
struct CloseApproach {
    close_approach_date: String,
    relative_velocity: Velocity,
    miss_distance: MissDistance,
}

#[derive(Debug, Deserialize)]
struct Velocity {
    kilometers_per_hour: String,
}

#[derive(Debug, Deserialize)]
struct MissDistance {
    kilometers: String,
}

/// Client for the NeoWs feed.
#[derive(Debug, Clone)]
pub struct NeoEndpoint {
    url: String,
}

impl Default for NeoEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl NeoEndpoint {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_ROOT)
    }

    #[must_use]
    pub fn with_base_url(api_root: &str) -> Self {
        Self {
            url: join_url(api_root, "neo/rest/v1/feed"),
        }
    }

    /// Validates the window, fetches the feed, and normalizes it.
    ///
    /// # Errors
    ///
    /// Any [`FetchError`]; `EmptyResult` when the feed lists no dates.
    #[instrument(skip(self, client, api_key), fields(endpoint = ENDPOINT))]
    pub async fn fetch(
        &self,
        client: &ApiClient,
        api_key: &str,
        request: &NeoRequest,
    ) -> Result<RecordSet, FetchError> {
        request.validate()?;
        let payload = client.get_json(&self.url, &request.query(api_key)).await?;
        normalize(payload).map_err(|e| {
            with_empty_context(
                e,
                &format!("{}..{}", request.start, request.end_or_start()),
            )
        })
    }
}

fn parse_measure(field: &str, value: &str) -> Result<Scalar, FetchError> {
    value
        .trim()
        .parse::<f64>()
        .map(Scalar::Float)
        .map_err(|_| FetchError::malformed(ENDPOINT, format!("{field} '{value}' is not a number")))
}

/// One record per asteroid, dates ascending, built from its first close approach.
///
/// # Errors
///
/// `MalformedResponse` on shape mismatch or a non-numeric measure;
/// `EmptyResult` when `near_earth_objects` has no dates.
pub fn normalize(payload: Value) -> Result<RecordSet, FetchError> {
    let payload: FeedPayload = decode(ENDPOINT, payload)?;
    if payload.near_earth_objects.is_empty() {
        return Err(FetchError::empty(ENDPOINT, "feed lists no dates"));
    }

    let mut set = RecordSet::with_columns(&COLUMNS);
    for asteroid in payload.near_earth_objects.into_values().flatten() {
        let (date, velocity, distance) = match asteroid.close_approach_data.first() {
            Some(approach) => (
                Scalar::date_or_text(&approach.close_approach_date),
                parse_measure(
                    "relative_velocity",
                    &approach.relative_velocity.kilometers_per_hour,
                )?,
                parse_measure("miss_distance", &approach.miss_distance.kilometers)?,
            ),
            None => (Scalar::Missing, Scalar::Missing, Scalar::Missing),
        };
        let meters = &asteroid.estimated_diameter.meters;
        let record = Record::new()
            .with("name", Scalar::Text(asteroid.name.trim().to_string()))
            .with("close_approach_date", date)
            .with("relative_velocity_kph", velocity)
            .with("miss_distance_km", distance)
            .with(
                "estimated_diameter_min_m",
                Scalar::Float(meters.estimated_diameter_min),
            )
            .with(
                "estimated_diameter_max_m",
                Scalar::Float(meters.estimated_diameter_max),
            )
            .with(
                "is_potentially_hazardous",
                Scalar::Bool(asteroid.is_potentially_hazardous_asteroid),
            );
        set.push(record).map_err(|e| schema_error(ENDPOINT, &e))?;
    }
    debug!(objects = set.len(), "normalized NEO feed");
    Ok(set)
}
