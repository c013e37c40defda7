//! Integration tests for WeatherProvider using wiremock.

use skyfav_core::http::base_url;
use skyfav_weather::{Coordinates, FetchError, LocationQuery, WeatherProvider};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn weather_body(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "dt": 1_700_000_000,
        "weather": [{"icon": "10d"}],
        "main": {"temp": 14.2, "temp_min": 11.0, "temp_max": 16.9}
    })
}

fn provider_for(server: &MockServer) -> WeatherProvider {
    let base = base_url(&format!("{}/api", server.uri())).unwrap();
    WeatherProvider::new(reqwest::Client::new(), base)
}

#[tokio::test]
async fn test_fetch_by_city() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/weather"))
        .and(query_param("city", "Cairo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body("Cairo")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server);
    let snapshot = provider
        .fetch(&LocationQuery::ByCity("Cairo".into()))
        .await
        .unwrap();

    assert_eq!(snapshot.city_name, "Cairo");
    assert_eq!(snapshot.condition_icon.as_deref(), Some("10d"));
}

#[tokio::test]
async fn test_fetch_by_coordinates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/weather"))
        .and(query_param("lat", "30.5"))
        .and(query_param("lon", "31.25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body("Giza")))
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server);
    let snapshot = provider
        .fetch(&LocationQuery::ByCoordinates(Coordinates::new(30.5, 31.25)))
        .await
        .unwrap();

    assert_eq!(snapshot.city_name, "Giza");
}

#[tokio::test]
async fn test_fetch_normalizes_backend_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body("café")))
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server);
    let snapshot = provider
        .fetch(&LocationQuery::ByCity("café".into()))
        .await
        .unwrap();

    assert_eq!(snapshot.city_name, "cafe");
}

#[tokio::test]
async fn test_unauthorized_is_classified() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/weather"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server);
    let err = provider
        .fetch(&LocationQuery::ByCity("Cairo".into()))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized(), "expected Unauthorized, got {:?}", err);
}

#[tokio::test]
async fn test_not_found_carries_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_string("city not found"))
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server);
    let err = provider
        .fetch(&LocationQuery::ByCity("Atlantis".into()))
        .await
        .unwrap_err();

    match err {
        FetchError::Status { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("not found"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"cod": 200})))
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server);
    let err = provider
        .fetch(&LocationQuery::ByCity("Cairo".into()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_unresolved_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server);
    let err = provider.fetch(&LocationQuery::Unresolved).await.unwrap_err();

    assert!(matches!(err, FetchError::Unresolved));
}
