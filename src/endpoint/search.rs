//! CMR dataset-collection search with pagination.
//!
//! Pages are requested strictly one after another until enough entries are
//! collected or a page comes back empty. Entry fields differ between
//! collections, so rows are reconciled to a common schema before truncation.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::fetch::{ApiClient, FetchError, QueryParameters};
use crate::record::{Record, RecordSet, Scalar};

use super::{DEFAULT_CMR_ROOT, decode, ensure_ordered, join_url};

const ENDPOINT: &str = "search";

/// Entries requested per page.
pub const PAGE_SIZE: usize = 2000;

/// One page request: `(page_size, page_number)`, page numbers start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBoundary {
    pub page_size: usize,
    pub page_number: usize,
}

/// Yields the page boundaries needed to cover `n_results` entries.
#[derive(Debug, Clone)]
pub struct Paginator {
    page_size: usize,
    pages: usize,
    next: usize,
}

impl Paginator {
    /// Covers `n_results` in `ceil(n_results / page_size)` pages.
    #[must_use]
    pub fn new(n_results: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_size,
            pages: n_results.div_ceil(page_size),
            next: 1,
        }
    }

    /// Total number of pages this paginator yields.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages
    }
}

impl Iterator for Paginator {
    type Item = PageBoundary;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.pages {
            return None;
        }
        let boundary = PageBoundary {
            page_size: self.page_size,
            page_number: self.next,
        };
        self.next += 1;
        Some(boundary)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.pages + 1).saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

/// Caller selection for a dataset search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub keyword: String,
    /// Maximum number of records to return.
    pub n_results: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl SearchRequest {
    #[must_use]
    pub fn new(keyword: impl Into<String>, n_results: usize) -> Self {
        Self {
            keyword: keyword.into(),
            n_results,
            start_date: None,
            end_date: None,
        }
    }

    #[must_use]
    pub fn with_temporal(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    /// # Errors
    ///
    /// [`FetchError::Validation`] for a blank keyword, a half-open date range,
    /// or a reversed one.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.keyword.trim().is_empty() {
            return Err(FetchError::validation("keyword", "must not be blank"));
        }
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => ensure_ordered(start, end),
            (None, None) => Ok(()),
            (Some(_), None) => Err(FetchError::validation(
                "end_date",
                "a start date needs an end date",
            )),
            (None, Some(_)) => Err(FetchError::validation(
                "start_date",
                "an end date needs a start date",
            )),
        }
    }

    fn temporal(&self) -> Option<String> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(format!(
                "{}T00:00:00Z,{}T23:59:59Z",
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            )),
            _ => None,
        }
    }

    /// Query for one page.
    #[must_use]
    pub fn query(&self, api_key: &str, page: PageBoundary) -> QueryParameters {
        let temporal = self.temporal();
        QueryParameters::builder(api_key)
            .text("keyword", self.keyword.trim())
            .text("page_size", page.page_size.to_string())
            .text("page_num", page.page_number.to_string())
            .optional_text("temporal", temporal.as_deref())
            .build()
    }
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    feed: Feed,
}

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(default)]
    entry: Vec<Map<String, Value>>,
}

/// Client for the CMR collection search.
#[derive(Debug, Clone)]
pub struct SearchEndpoint {
    url: String,
    page_size: usize,
}

impl Default for SearchEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchEndpoint {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_CMR_ROOT)
    }

    #[must_use]
    pub fn with_base_url(cmr_root: &str) -> Self {
        Self {
            url: join_url(cmr_root, "search/collections.json"),
            page_size: PAGE_SIZE,
        }
    }

    /// Runs the paginated search.
    ///
    /// Returns an empty set without any request when `n_results` is 0, and an
    /// empty set (not an error) when the service has no matching entries.
    ///
    /// # Errors
    ///
    /// `Validation` before any request; otherwise the first page failure.
    #[instrument(skip(self, client, api_key), fields(endpoint = ENDPOINT))]
    pub async fn search(
        &self,
        client: &ApiClient,
        api_key: &str,
        request: &SearchRequest,
    ) -> Result<RecordSet, FetchError> {
        request.validate()?;
        if request.n_results == 0 {
            debug!("zero results requested, skipping search");
            return Ok(RecordSet::default());
        }

        let paginator = Paginator::new(request.n_results, self.page_size);
        let page_count = paginator.page_count();
        let mut rows: Vec<Record> = Vec::new();

        for page in paginator {
            let payload = client
                .get_json(&self.url, &request.query(api_key, page))
                .await?;
            let entries = normalize_page(payload)?;
            if entries.is_empty() {
                debug!(page = page.page_number, "empty page, stopping");
                break;
            }
            debug!(
                page = page.page_number,
                pages = page_count,
                entries = entries.len(),
                "collected search page"
            );
            rows.extend(entries);
        }

        let mut set = RecordSet::reconcile(rows);
        set.truncate(request.n_results);
        info!(
            keyword = %request.keyword,
            records = set.len(),
            columns = set.columns().len(),
            "dataset search complete"
        );
        Ok(set)
    }
}

/// Normalizes one page into a reconciled set.
///
/// # Errors
///
/// `MalformedResponse` unless the payload is `{feed: {entry: [object...]}}`.
pub fn normalize(payload: Value) -> Result<RecordSet, FetchError> {
    normalize_page(payload).map(RecordSet::reconcile)
}

fn normalize_page(payload: Value) -> Result<Vec<Record>, FetchError> {
    let payload: SearchPayload = decode(ENDPOINT, payload)?;
    Ok(payload.feed.entry.iter().map(entry_record).collect())
}

/// Keeps top-level scalar and array fields; dotted or `$` names and nested
/// objects are dropped.
fn entry_record(entry: &Map<String, Value>) -> Record {
    entry
        .iter()
        .filter(|(name, _)| !name.contains('.') && !name.contains('$'))
        .filter(|(_, value)| !value.is_object())
        .fold(Record::new(), |record, (name, value)| {
            record.with(name, Scalar::from_json(value))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_paginator_page_counts() {
        assert_eq!(Paginator::new(0, PAGE_SIZE).count(), 0);
        assert_eq!(Paginator::new(1, PAGE_SIZE).count(), 1);
        assert_eq!(Paginator::new(2000, PAGE_SIZE).count(), 1);
        assert_eq!(Paginator::new(2001, PAGE_SIZE).count(), 2);

        let pages: Vec<_> = Paginator::new(3000, PAGE_SIZE).collect();
        assert_eq!(
            pages,
            vec![
                PageBoundary {
                    page_size: 2000,
                    page_number: 1
                },
                PageBoundary {
                    page_size: 2000,
                    page_number: 2
                },
            ]
        );
    }

    #[test]
    fn test_paginator_size_hint_tracks_progress() {
        let mut pages = Paginator::new(5, 2);
        assert_eq!(pages.size_hint(), (3, Some(3)));
        pages.next();
        assert_eq!(pages.size_hint(), (2, Some(2)));
    }

    #[test]
    fn test_normalize_drops_dotted_and_object_fields() {
        let payload = json!({"feed": {"entry": [{
            "id": "C1-PODAAC",
            "title": "Sea Surface Temperature",
            "time_start": "2002-06-01T00:00:00.000Z",
            "online_access_flag": true,
            "links": [{"href": "https://x"}],
            "boxes": ["-90 -180 90 180"],
            "$schema": "x",
            "summary.short": "y",
            "organizations": {"nested": true},
            "cloud_cover": null
        }]}});
        let set = normalize(payload).unwrap();
        assert_eq!(
            set.columns(),
            &[
                "id",
                "title",
                "time_start",
                "online_access_flag",
                "links",
                "boxes",
                "cloud_cover"
            ]
        );
        let record = &set.records()[0];
        assert_eq!(
            record.get("boxes"),
            Some(&Scalar::Text(r#"["-90 -180 90 180"]"#.into()))
        );
        assert_eq!(record.get("online_access_flag"), Some(&Scalar::Bool(true)));
        assert_eq!(record.get("cloud_cover"), Some(&Scalar::Null));
    }

    #[test]
    fn test_normalize_empty_entry_list() {
        assert!(normalize(json!({"feed": {"entry": []}})).unwrap().is_empty());
        assert!(normalize(json!({"feed": {}})).unwrap().is_empty());
    }

    #[test]
    fn test_normalize_without_feed_is_malformed() {
        let err = normalize(json!({"items": []})).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse { .. }));
    }

    #[test]
    fn test_validate_date_pairs() {
        let base = SearchRequest::new("sea ice", 10);
        assert!(base.validate().is_ok());
        assert!(
            base.clone()
                .with_temporal(date(2020, 1, 1), date(2020, 12, 31))
                .validate()
                .is_ok()
        );

        let mut half = base.clone();
        half.start_date = Some(date(2020, 1, 1));
        assert!(half.validate().unwrap_err().is_validation());

        let mut half = base.clone();
        half.end_date = Some(date(2020, 1, 1));
        assert!(half.validate().unwrap_err().is_validation());

        let reversed = base.with_temporal(date(2021, 1, 1), date(2020, 1, 1));
        assert!(reversed.validate().unwrap_err().is_validation());

        assert!(SearchRequest::new("  ", 1).validate().is_err());
    }

    #[test]
    fn test_query_carries_page_and_temporal() {
        let request =
            SearchRequest::new("sea ice", 10).with_temporal(date(2020, 1, 1), date(2020, 2, 1));
        let q = request.query(
            "k",
            PageBoundary {
                page_size: 2000,
                page_number: 3,
            },
        );
        assert_eq!(q.get("keyword"), Some("sea ice"));
        assert_eq!(q.get("page_size"), Some("2000"));
        assert_eq!(q.get("page_num"), Some("3"));
        assert_eq!(
            q.get("temporal"),
            Some("2020-01-01T00:00:00Z,2020-02-01T23:59:59Z")
        );
        assert_eq!(q.get("api_key"), Some("k"));

        let q = SearchRequest::new("x", 1).query(
            "k",
            PageBoundary {
                page_size: 2000,
                page_number: 1,
            },
        );
        assert_eq!(q.get("temporal"), None);
    }
}
