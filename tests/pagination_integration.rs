//! Integration tests for cursor pagination against a mock Graph API.

mod support;
use support::socket_guard::start_mock_server_or_skip;

use futures_util::TryStreamExt;
use openaire_core::{
    AccessRight, ClientConfig, CursorState, EntityType, FailureCause, OpenAire,
    ResearchProductType,
};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn openaire_for(server: &MockServer, api_key: Option<&str>) -> OpenAire {
    let config = ClientConfig::default()
        .with_base_url(format!("{}/graph/v1", server.uri()))
        .with_api_key(api_key.map(str::to_string));
    OpenAire::with_config(config).unwrap()
}

async fn mount_two_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/graph/v1/researchProducts"))
        .and(query_param("cursor", "*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": {"numFound": 3, "pageSize": 2, "nextCursor": "c1"},
            "results": [{"id": "r1"}, {"id": "r2"}]
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/graph/v1/researchProducts"))
        .and(query_param("cursor", "c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": {"numFound": 3, "pageSize": 2},
            "results": [{"id": "r3"}]
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_all_follows_cursor_until_header_has_no_next() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_two_pages(&mock_server).await;

    let records = openaire_for(&mock_server, None)
        .research_products()
        .search("research software metadata")
        .product_type(ResearchProductType::Publication)
        .best_open_access_right(AccessRight::Open)
        .sort_by_publication_date(false)
        .size(2)
        .all()
        .await
        .unwrap();

    let ids: Vec<&str> = records.iter().filter_map(|r| r["id"].as_str()).collect();
    assert_eq!(ids, ["r1", "r2", "r3"]);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        let pairs: Vec<(String, String)> = request.url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("search".into(), "research software metadata".into())));
        assert!(pairs.contains(&("type".into(), "publication".into())));
        assert!(pairs.contains(&("bestOpenAccessRightLabel".into(), "OPEN".into())));
        assert!(pairs.contains(&("sortBy".into(), "publicationDate DESC".into())));
        assert!(pairs.contains(&("pageSize".into(), "2".into())));
    }
}

#[tokio::test]
async fn test_stream_yields_pages_in_order_and_sends_bearer_token() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("cursor", "*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": {"numFound": 2, "nextCursor": "c1"},
            "results": [{"id": "o1"}]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("cursor", "c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": {"numFound": 2, "nextCursor": ""},
            "results": [{"id": "o2"}]
        })))
        .mount(&mock_server)
        .await;

    let pages: Vec<_> = openaire_for(&mock_server, Some("test-token"))
        .query(EntityType::Organizations)
        .cursor_iterator()
        .into_stream()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].next_cursor(), Some("c1"));
    assert_eq!(pages[0].total(), Some(2));
    assert!(pages[1].is_last());
    assert_eq!(pages[1].items()[0]["id"], "o2");
}

#[tokio::test]
async fn test_empty_first_page_sends_single_request() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/graph/v1/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": {"numFound": 0, "nextCursor": "never-used"},
            "results": []
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut iterator = openaire_for(&mock_server, None)
        .projects()
        .title("nothing")
        .cursor_iterator();
    assert!(iterator.next_page().await.unwrap().is_none());
    assert_eq!(iterator.state(), CursorState::Done);
    assert!(iterator.next_page().await.unwrap().is_none());
}

#[tokio::test]
async fn test_server_error_mid_stream_keeps_earlier_records() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(query_param("cursor", "*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": {"nextCursor": "c1"},
            "results": [{"id": "d1"}]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("cursor", "c1"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut iterator = openaire_for(&mock_server, None)
        .data_sources()
        .cursor_iterator();
    let mut records = Vec::new();
    let error = iterator.collect_into(&mut records).await.unwrap_err();

    assert_eq!(error.cause(), FailureCause::HttpStatus(502));
    assert_eq!(records.len(), 1);
    assert_eq!(iterator.state(), CursorState::Done);
}
