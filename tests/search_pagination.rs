//! Integration tests for paginated dataset search.

use chrono::NaiveDate;
use serde_json::{Value, json};
use spacefetch_core::endpoint::search::{PAGE_SIZE, SearchEndpoint, SearchRequest};
use spacefetch_core::{ApiClient, Scalar};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

const SEARCH_PATH: &str = "/search/collections.json";

fn client() -> ApiClient {
    ApiClient::new().unwrap()
}

fn page(entries: impl IntoIterator<Item = Value>) -> Value {
    json!({"feed": {"entry": entries.into_iter().collect::<Vec<_>>()}})
}

fn entries(prefix: &str, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| json!({"id": format!("{prefix}-{i}"), "title": format!("Collection {i}")}))
        .collect()
}

async fn mount_page(server: &MockServer, page_num: &str, body: Value, expected: u64) {
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("page_num", page_num))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_zero_results_issues_no_request() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(Vec::new())))
        .expect(0)
        .mount(&server)
        .await;

    let records = SearchEndpoint::with_base_url(&server.uri())
        .search(&client(), "k", &SearchRequest::new("sea ice", 0))
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_three_thousand_results_take_two_pages() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_page(&server, "1", page(entries("p1", PAGE_SIZE)), 1).await;
    mount_page(&server, "2", page(entries("p2", PAGE_SIZE)), 1).await;
    mount_page(&server, "3", page(Vec::new()), 0).await;

    let records = SearchEndpoint::with_base_url(&server.uri())
        .search(&client(), "k", &SearchRequest::new("sea ice", 3000))
        .await
        .unwrap();

    assert_eq!(records.len(), 3000);
    assert_eq!(
        records.records()[0].get("id"),
        Some(&Scalar::Text("p1-0".into()))
    );
    assert_eq!(
        records.records()[2999].get("id"),
        Some(&Scalar::Text("p2-999".into()))
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_every_page_carries_size_keyword_and_key() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("keyword", "sea ice"))
        .and(query_param("page_size", "2000"))
        .and(query_param("page_num", "1"))
        .and(query_param("api_key", "k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(entries("a", 3))))
        .expect(1)
        .mount(&server)
        .await;

    let records = SearchEndpoint::with_base_url(&server.uri())
        .search(&client(), "k", &SearchRequest::new("sea ice", 2))
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_empty_page_stops_and_short_page_does_not() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_page(&server, "1", page(entries("a", 5)), 1).await;
    mount_page(&server, "2", page(Vec::new()), 1).await;
    mount_page(&server, "3", page(entries("c", 5)), 0).await;

    let records = SearchEndpoint::with_base_url(&server.uri())
        .search(&client(), "k", &SearchRequest::new("x", 5000))
        .await
        .unwrap();
    assert_eq!(records.len(), 5);
}

#[tokio::test]
async fn test_pages_with_different_fields_are_reconciled() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_page(&server, "1", page([json!({"a": 1, "b": 2})]), 1).await;
    mount_page(&server, "2", page([json!({"b": 3, "c": 4})]), 1).await;
    mount_page(&server, "3", page(Vec::new()), 1).await;

    let records = SearchEndpoint::with_base_url(&server.uri())
        .search(&client(), "k", &SearchRequest::new("x", 2 * PAGE_SIZE + 1))
        .await
        .unwrap();

    assert_eq!(records.columns(), &["a", "b", "c"]);
    let first = &records.records()[0];
    let second = &records.records()[1];
    assert_eq!(first.get("c"), Some(&Scalar::Missing));
    assert_eq!(second.get("a"), Some(&Scalar::Missing));
    assert_eq!(second.get("c"), Some(&Scalar::Integer(4)));
}

#[tokio::test]
async fn test_temporal_filter_sent_on_every_page() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param(
            "temporal",
            "2020-01-01T00:00:00Z,2020-12-31T23:59:59Z",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(entries("t", PAGE_SIZE))))
        .expect(2)
        .mount(&server)
        .await;

    let request = SearchRequest::new("sea ice", PAGE_SIZE + 1).with_temporal(
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
    );
    let records = SearchEndpoint::with_base_url(&server.uri())
        .search(&client(), "k", &request)
        .await
        .unwrap();
    assert_eq!(records.len(), PAGE_SIZE + 1);
}

#[tokio::test]
async fn test_half_open_range_is_rejected_before_any_request() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut request = SearchRequest::new("sea ice", 10);
    request.start_date = NaiveDate::from_ymd_opt(2020, 1, 1);
    let err = SearchEndpoint::with_base_url(&server.uri())
        .search(&client(), "k", &request)
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_no_matches_is_empty_set_not_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_page(&server, "1", page(Vec::new()), 1).await;

    let records = SearchEndpoint::with_base_url(&server.uri())
        .search(&client(), "k", &SearchRequest::new("nothing matches", 10))
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_page_failure_propagates() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_page(&server, "1", page(entries("a", PAGE_SIZE)), 1).await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("page_num", "2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = SearchEndpoint::with_base_url(&server.uri())
        .search(&client(), "k", &SearchRequest::new("x", 3000))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(503));
}
