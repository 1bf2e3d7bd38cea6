//! Integration tests for the OpenWeather client and the orchestrator on top of
//! it, using a wiremock stand-in for the provider.

use std::sync::Arc;

use weather_core::{
    Coordinates, LocationQuery, MemoryStore, QueryOrchestrator, QueryState, UnitSystem,
    WeatherError, WeatherProvider,
    provider::openweather::{Endpoint, OpenWeatherProvider},
};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn london_current() -> serde_json::Value {
    serde_json::json!({
        "name": "London",
        "coord": {"lat": 51.5, "lon": -0.12},
        "sys": {"country": "GB"},
        "dt": 1_700_000_000,
        "timezone": 0,
        "main": {"temp": 11.0, "feels_like": 9.5, "humidity": 82},
        "weather": [{"main": "Clouds", "description": "overcast clouds", "icon": "04n"}],
        "wind": {"speed": 5.1}
    })
}

fn forecast(slices: usize) -> serde_json::Value {
    let list: Vec<_> = (0..slices)
        .map(|i| {
            serde_json::json!({
                "dt": 1_700_000_000 + (i as i64) * 10_800,
                "main": {"temp": 10.0 + i as f64, "feels_like": 9.0, "humidity": 80},
                "weather": [{"main": "Rain", "description": "light rain", "icon": "10n"}]
            })
        })
        .collect();
    serde_json::json!({ "cod": "200", "cnt": slices, "list": list })
}

fn direct(server: &MockServer) -> OpenWeatherProvider {
    OpenWeatherProvider::new(Endpoint::Direct {
        base_url: server.uri(),
        api_key: "TEST_KEY".to_string(),
    })
}

fn relay(server: &MockServer) -> OpenWeatherProvider {
    OpenWeatherProvider::new(Endpoint::Relay { base_url: format!("{}/api", server.uri()) })
}

#[tokio::test]
async fn test_fetch_current_by_name_direct() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "london"))
        .and(query_param("appid", "TEST_KEY"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_current()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let obs = direct(&mock_server)
        .fetch_current(&LocationQuery::ByName("london".into()), UnitSystem::Metric)
        .await
        .unwrap();

    assert_eq!(obs.label(), "London, GB");
    assert_eq!(obs.coordinates, Coordinates::new(51.5, -0.12));
    assert_eq!(obs.humidity, 82);
}

#[tokio::test]
async fn test_fetch_current_by_coordinates_imperial() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "51.5"))
        .and(query_param("lon", "-0.12"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_current()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = direct(&mock_server)
        .fetch_current(&LocationQuery::by_coordinates(51.5, -0.12), UnitSystem::Imperial)
        .await;

    assert!(result.is_ok(), "unexpected error: {result:?}");
}

#[tokio::test]
async fn test_standard_units_send_no_units_param() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param_is_missing("units"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast(3)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let slices = direct(&mock_server)
        .fetch_forecast(Coordinates::new(51.5, -0.12), UnitSystem::Standard)
        .await
        .unwrap();

    assert_eq!(slices.len(), 3);
    assert_eq!(slices[0].condition, "Rain");
    assert_eq!(slices[0].icon, "10n");
}

#[tokio::test]
async fn test_relay_mode_never_sends_appid() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/weather"))
        .and(query_param("q", "paris"))
        .and(query_param_is_missing("appid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_current()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = relay(&mock_server)
        .fetch_current(&LocationQuery::ByName("paris".into()), UnitSystem::Metric)
        .await;

    assert!(result.is_ok(), "unexpected error: {result:?}");
}

#[tokio::test]
async fn test_failure_status_maps_to_upstream_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string(r#"{"cod":401,"message":"Invalid API key"}"#),
        )
        .mount(&mock_server)
        .await;

    let err = direct(&mock_server)
        .fetch_current(&LocationQuery::ByName("oslo".into()), UnitSystem::Metric)
        .await
        .unwrap_err();

    match err {
        WeatherError::Upstream { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("Invalid API key"));
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unparsable_body_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&mock_server)
        .await;

    let err = direct(&mock_server)
        .fetch_current(&LocationQuery::ByName("oslo".into()), UnitSystem::Metric)
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_unreachable_provider_is_network_error() {
    let provider = OpenWeatherProvider::new(Endpoint::Relay {
        base_url: "http://127.0.0.1:9/api".to_string(),
    });

    let err = provider
        .fetch_current(&LocationQuery::ByName("oslo".into()), UnitSystem::Metric)
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::Network(_)));
}

#[tokio::test]
async fn test_orchestrated_sequence_against_provider() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "london"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_current()))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("lat", "51.5"))
        .and(query_param("lon", "-0.12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast(40)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let orch = QueryOrchestrator::with_store(
        Box::new(direct(&mock_server)),
        Arc::new(MemoryStore::new()),
    );

    orch.query_by_name("london").await;
    orch.query_by_name("london").await;

    let state = orch.current_state();
    let report = state.report().expect("ready");
    assert_eq!(report.forecast.len(), 10);
    assert_eq!(report.forecast[0].temperature, 10.0);
    assert_eq!(orch.history(), ["London, GB"]);
}

#[tokio::test]
async fn test_forecast_failure_discards_current_conditions() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_current()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&mock_server)
        .await;

    let orch = QueryOrchestrator::with_store(
        Box::new(direct(&mock_server)),
        Arc::new(MemoryStore::new()),
    );

    orch.query_by_name("london").await;

    assert_eq!(
        orch.current_state(),
        QueryState::Failed(WeatherError::Upstream { status: 502, body: "bad gateway".into() })
    );
    assert_eq!(orch.history(), ["London, GB"]);
}
