//! HTTP-level tests for the Nominatim client against a local mock server.

use std::time::Duration;

use nominatim_client::{NominatimClient, NominatimError, SearchRequest, DEFAULT_USER_AGENT};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> NominatimClient {
    NominatimClient::new(DEFAULT_USER_AGENT, Duration::from_secs(2))
        .unwrap()
        .with_base_url(&server.uri())
}

#[tokio::test]
async fn search_sends_params_and_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Hilltop Road, Dracut, Massachusetts"))
        .and(query_param("format", "json"))
        .and(query_param("limit", "5"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "lat": "42.6762",
                "lon": "-71.2868",
                "display_name": "Hilltop Road, Dracut, Middlesex County, Massachusetts, 01826, United States"
            },
            {
                "lat": "42.1001",
                "lon": "-72.5100",
                "display_name": "Hilltop Road, Springfield, Hampden County, Massachusetts, United States"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let places = client
        .search(&SearchRequest::new("Hilltop Road, Dracut, Massachusetts", 5))
        .await
        .unwrap();

    assert_eq!(places.len(), 2);
    assert!((places[0].lat - 42.6762).abs() < 1e-9);
    assert!(places[1].display_name.contains("Springfield"));
}

#[tokio::test]
async fn search_passes_country_codes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("countrycodes", "us"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let places = client
        .search(&SearchRequest::new("12 HILLTOP ROAD, DRACUT, MA", 1).country_codes("us"))
        .await
        .unwrap();
    assert!(places.is_empty());
}

#[tokio::test]
async fn search_skips_entries_with_bad_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "lat": "n/a", "lon": "-71.3", "display_name": "Broken" },
            { "lat": "42.6", "lon": "-71.3", "display_name": "Main Street, Dracut" }
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let places = client
        .search(&SearchRequest::new("Main St, Dracut, Massachusetts", 5))
        .await
        .unwrap();
    assert_eq!(places.len(), 1);
    assert_eq!(places[0].display_name, "Main Street, Dracut");
}

#[tokio::test]
async fn search_keeps_valid_hits_next_to_malformed_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "display_name": "No coords" },
            { "lat": "42.6", "lon": "-71.3", "display_name": "Main Street, Dracut" },
            { "lat": 42.61, "lon": -71.29, "display_name": "Oak Avenue, Dracut" },
            "not an object"
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let places = client
        .search(&SearchRequest::new("Main St, Dracut, Massachusetts", 5))
        .await
        .unwrap();

    let names: Vec<&str> = places.iter().map(|p| p.display_name.as_str()).collect();
    assert_eq!(names, vec!["Main Street, Dracut", "Oak Avenue, Dracut"]);
    assert!((places[1].lat - 42.61).abs() < 1e-9);
    assert!((places[1].lon + 71.29).abs() < 1e-9);
}

#[tokio::test]
async fn search_http_error_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .search(&SearchRequest::new("Main St, Dracut, Massachusetts", 5))
        .await
        .unwrap_err();
    match err {
        NominatimError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream down");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn search_malformed_json_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .search(&SearchRequest::new("Main St, Dracut, Massachusetts", 5))
        .await
        .unwrap_err();
    assert!(matches!(err, NominatimError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn search_timeout_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = NominatimClient::new(DEFAULT_USER_AGENT, Duration::from_millis(50))
        .unwrap()
        .with_base_url(&server.uri());
    let err = client
        .search(&SearchRequest::new("Main St, Dracut, Massachusetts", 5))
        .await
        .unwrap_err();
    assert!(matches!(err, NominatimError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn reverse_sends_zoom_and_returns_display_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("format", "json"))
        .and(query_param("zoom", "18"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "display_name": "14, Oak Avenue, Dracut, Middlesex County, Massachusetts, 01826, United States"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let address = client.reverse(42.605, -71.295).await.unwrap();
    assert_eq!(
        address.as_deref(),
        Some("14, Oak Avenue, Dracut, Middlesex County, Massachusetts, 01826, United States")
    );
}

#[tokio::test]
async fn reverse_unable_to_geocode_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "error": "Unable to geocode" })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert_eq!(client.reverse(0.0, 0.0).await.unwrap(), None);
}
