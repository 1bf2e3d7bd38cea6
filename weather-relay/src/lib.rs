//! Credential-hiding relay in front of the OpenWeather API.
//!
//! `GET /api/{path}` forwards to `{upstream}/{path}` with the query string
//! untouched except for `appid`, which is always set server-side. The
//! provider's status and body come back as they are. Everything outside
//! `/api` is served from a static directory.

use std::{path::PathBuf, sync::Arc};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, error, info, warn};

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Provider endpoints the relay is willing to forward to.
const FORWARDED_PATHS: &[&str] = &["weather", "forecast"];

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub port: u16,
    pub api_key: Option<String>,
    pub upstream_url: String,
    pub static_dir: PathBuf,
}

#[derive(Clone)]
struct RelayState {
    api_key: Option<Arc<str>>,
    upstream_url: Arc<str>,
    http: reqwest::Client,
}

pub fn router(config: &RelayConfig) -> Router {
    let state = RelayState {
        api_key: config.api_key.as_deref().filter(|k| !k.is_empty()).map(Arc::from),
        upstream_url: Arc::from(config.upstream_url.trim_end_matches('/')),
        http: reqwest::Client::new(),
    };

    Router::new()
        .route("/api/{path}", get(forward))
        .with_state(state)
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(TraceLayer::new_for_http())
}

pub async fn run(config: RelayConfig) -> anyhow::Result<()> {
    if config.api_key.as_deref().is_none_or(str::is_empty) {
        warn!("OWM_API_KEY not set; forwarded requests will be rejected by the provider");
    }

    let app = router(&config);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Relay listening on http://localhost:{}", config.port);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn forward(
    State(state): State<RelayState>,
    Path(path): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    if !FORWARDED_PATHS.contains(&path.as_str()) {
        return (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "unknown endpoint" })))
            .into_response();
    }

    let mut params: Vec<(String, String)> =
        params.into_iter().filter(|(k, _)| k != "appid").collect();
    if let Some(key) = &state.api_key {
        params.push(("appid".to_string(), key.to_string()));
    }

    let url = format!("{}/{}", state.upstream_url, path);
    debug!(%url, "forwarding");

    match relay(&state.http, &url, &params).await {
        Ok((status, headers, body)) => (status, headers, body).into_response(),
        Err(err) => {
            error!(%url, error = %err, "relay request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": "proxy error" })))
                .into_response()
        }
    }
}

async fn relay(
    http: &reqwest::Client,
    url: &str,
    params: &[(String, String)],
) -> Result<(StatusCode, HeaderMap, Bytes), reqwest::Error> {
    let res = http.get(url).query(params).send().await?;

    let status = res.status();
    let mut headers = HeaderMap::new();
    if let Some(content_type) = res.headers().get(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, content_type.clone());
    }
    let body = res.bytes().await?;

    Ok((status, headers, body))
}
