//! Error types for API retrieval.
//!
//! Every failure a retrieval call can surface is one of five kinds, checked in
//! pipeline order: bad caller input, transport failure, non-success status,
//! undecodable body, and a well-formed but empty result.

use thiserror::Error;

/// Errors that can occur while fetching and normalizing an endpoint payload.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Caller input rejected before any network call.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// The argument that failed validation.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The transport could not complete the request.
    #[error("request to {url} failed: {source}")]
    Request {
        /// Request URL with the API key redacted.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a status other than 200.
    #[error("HTTP {status} from {url}\n  Suggestion: {}", status_suggestion(.status))]
    Api {
        /// Request URL with the API key redacted.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The body was not valid JSON or did not have the expected shape.
    #[error("malformed response from {origin}: {reason}")]
    MalformedResponse {
        /// Request URL (key redacted) or endpoint name that produced the body.
        origin: String,
        /// What was wrong with the body.
        reason: String,
    },

    /// The response was well formed but held no usable rows.
    #[error("no results from {endpoint}: {detail}")]
    EmptyResult {
        /// Endpoint name (e.g. "apod", "mars").
        endpoint: &'static str,
        /// What was empty.
        detail: String,
    },
}

impl FetchError {
    /// Creates a `Validation` error.
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Creates a `Request` error from a reqwest error.
    ///
    /// The source's own URL is dropped; it still carries the raw `api_key`.
    pub fn request(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Request {
            url: url.into(),
            source: source.without_url(),
        }
    }

    /// Creates an `Api` status error.
    pub fn api(url: impl Into<String>, status: u16) -> Self {
        Self::Api {
            url: url.into(),
            status,
        }
    }

    /// Creates a `MalformedResponse` error.
    pub fn malformed(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            origin: origin.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `EmptyResult` error.
    pub fn empty(endpoint: &'static str, detail: impl Into<String>) -> Self {
        Self::EmptyResult {
            endpoint,
            detail: detail.into(),
        }
    }

    /// Returns the HTTP status for `Api` errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true for errors detected before any network call.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns true when the service returned no usable rows.
    #[must_use]
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::EmptyResult { .. })
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn status_suggestion(status: &u16) -> &'static str {
    match *status {
        401 | 403 => "Check your API key (DEMO_KEY has a low hourly quota)",
        404 => "No data is published for this query; check the date and selectors",
        429 => "API rate limit exceeded; wait before retrying or use a personal key",
        s if s >= 500 => "The service is unavailable; try again later",
        _ => "Check the request arguments and try again",
    }
}
