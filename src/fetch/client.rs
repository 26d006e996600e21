//! Shared HTTP client for all endpoint calls.
//!
//! Every request is a single GET attempt: no retry, no backoff. Timeouts are
//! the only transport knobs and are configured once at startup.

use std::sync::RwLock;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::user_agent;

use super::error::FetchError;
use super::query::{API_KEY_PARAM, QueryParameters};

/// Default connect timeout in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default read timeout in seconds.
pub const READ_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy)]
struct HttpTimeouts {
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }
}

static HTTP_TIMEOUTS: RwLock<HttpTimeouts> = RwLock::new(HttpTimeouts {
    connect_timeout_secs: CONNECT_TIMEOUT_SECS,
    read_timeout_secs: READ_TIMEOUT_SECS,
});

/// Configures the timeouts used by subsequently built [`ApiClient`]s.
///
/// Intended for CLI/runtime configuration before any client is constructed.
pub fn configure_http_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) {
    if let Ok(mut guard) = HTTP_TIMEOUTS.write() {
        *guard = HttpTimeouts {
            connect_timeout_secs,
            read_timeout_secs,
        };
    }
}

fn http_timeouts() -> HttpTimeouts {
    HTTP_TIMEOUTS.read().map(|guard| *guard).unwrap_or_default()
}

/// HTTP client used by every endpoint and by the image persist stage.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    /// Builds a client with the configured timeouts and shared User-Agent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Request`] when client construction fails.
    pub fn new() -> Result<Self, FetchError> {
        let timeouts = http_timeouts();
        Self::with_timeouts(timeouts.connect_timeout_secs, timeouts.read_timeout_secs)
    }

    /// Builds a client with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Request`] when client construction fails.
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, FetchError> {
        let client = build_client(connect_timeout_secs, read_timeout_secs)?;
        Ok(Self { client })
    }

    /// Issues one GET and decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Validation`] if `url` is not a valid absolute URL
    /// - [`FetchError::Request`] if the transport fails
    /// - [`FetchError::Api`] if the status is not 200
    /// - [`FetchError::MalformedResponse`] if the body is not JSON
    #[instrument(skip(self, params), fields(url = %url))]
    pub async fn get_json(&self, url: &str, params: &QueryParameters) -> Result<Value, FetchError> {
        let request_url = build_request_url(url, params)?;
        let display_url = redact_api_key(&request_url);
        debug!(request = %display_url, "sending API request");

        let response = self.send(request_url, &display_url).await?;

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::request(display_url.clone(), e))?;

        serde_json::from_str::<Value>(&body).map_err(|e| {
            warn!(error = %e, "response body is not valid JSON");
            FetchError::malformed(display_url, format!("body is not valid JSON: {e}"))
        })
    }

    /// Issues one GET for an image and returns the response for streaming.
    ///
    /// # Errors
    ///
    /// - [`FetchError::MalformedResponse`] if `url` (taken from a payload) is
    ///   not a valid absolute URL
    /// - otherwise the same as [`get_json`](Self::get_json), minus JSON decoding
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_image(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let request_url = Url::parse(url).map_err(|e| {
            FetchError::malformed("image url", format!("'{url}' is not a valid URL: {e}"))
        })?;
        let display_url = redact_api_key(&request_url);
        self.send(request_url, &display_url).await
    }

    async fn send(&self, url: Url, display_url: &str) -> Result<reqwest::Response, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            let e = e.without_url();
            if e.is_timeout() {
                warn!(request = %display_url, "request timed out");
            } else {
                warn!(request = %display_url, error = %e, "request failed");
            }
            FetchError::request(display_url, e)
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(status = status.as_u16(), "non-success status");
            return Err(FetchError::api(display_url, status.as_u16()));
        }
        Ok(response)
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

pub(crate) fn build_request_url(base: &str, params: &QueryParameters) -> Result<Url, FetchError> {
    let mut url = Url::parse(base)
        .map_err(|e| FetchError::validation("url", format!("'{base}' is not a valid URL: {e}")))?;
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params.iter());
    }
    Ok(url)
}

/// Renders `url` with any `api_key` value replaced by `***`.
pub(crate) fn redact_api_key(url: &Url) -> String {
    if !url.query_pairs().any(|(name, _)| name == API_KEY_PARAM) {
        return url.to_string();
    }
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| {
            if name == API_KEY_PARAM {
                (name.into_owned(), "***".to_string())
            } else {
                (name.into_owned(), value.into_owned())
            }
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

fn build_client(connect_timeout_secs: u64, read_timeout_secs: u64) -> Result<Client, FetchError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .timeout(Duration::from_secs(read_timeout_secs))
        .user_agent(user_agent::default_user_agent())
        .gzip(true)
        .build()
        .map_err(|e| FetchError::request("(client construction)", e))
}
