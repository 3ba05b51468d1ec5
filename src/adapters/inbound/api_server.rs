//! Complication Host API Server
//!
//! HTTP bridge standing in for the watch face host: it issues complication
//! requests, serves previews and the tile, and exposes the stored record.

use crate::adapters::outbound::LoggingComplicationHost;
use crate::application::{ComplicationProvider, ComplicationRequest, LocationRecorder, ResponseHandle};
use crate::domain::entities::LocationRecord;
use crate::domain::value_objects::{ComplicationKind, Freshness};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// How long a complication request may take before the bridge gives up.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(60);

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Tile contents.
#[derive(Debug, Serialize)]
pub struct TileResponse {
    pub description: String,
    pub time: String,
    pub freshness: Freshness,
    /// A background refresh was started for this request
    pub refreshing: bool,
}

/// Refresh counter response.
#[derive(Debug, Serialize)]
pub struct RefreshesResponse {
    pub refreshes: u64,
}

/// API Server state.
#[derive(Clone)]
pub struct ApiState {
    pub provider: Arc<ComplicationProvider>,
    pub recorder: Arc<LocationRecorder>,
    pub host: Arc<LoggingComplicationHost>,
    pub response_timeout: Duration,
}

impl ApiState {
    pub fn new(
        provider: Arc<ComplicationProvider>,
        recorder: Arc<LocationRecorder>,
        host: Arc<LoggingComplicationHost>,
    ) -> Self {
        Self {
            provider,
            recorder,
            host,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }
}

/// Build the router for the given state.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/complications/:kind", get(complication_handler))
        .route("/api/v1/complications/:kind/preview", get(preview_handler))
        .route("/api/v1/tile", get(tile_handler))
        .route("/api/v1/refresh", post(refresh_handler))
        .route("/api/v1/refreshes", get(refreshes_handler))
        .with_state(state)
}

/// API Server acting as the complication host.
pub struct ApiServer {
    listen_addr: String,
    state: ApiState,
}

impl ApiServer {
    pub fn new(listen_addr: String, state: ApiState) -> Self {
        Self { listen_addr, state }
    }

    /// Run the API server.
    ///
    /// The final Ok(()) is excluded from coverage since axum::serve runs forever.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run(&self) -> anyhow::Result<()> {
        let app = router(self.state.clone()).layer(TraceLayer::new_for_http());

        let listener = TcpListener::bind(&self.listen_addr).await?;
        tracing::info!("complication host API listening on {}", self.listen_addr);

        axum::serve(listener, app).await?;
        Ok(())
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": message.into()
        })),
    )
        .into_response()
}

fn parse_kind(kind: &str) -> Result<ComplicationKind, Response> {
    kind.parse::<ComplicationKind>()
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))
}

// Handler functions

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn complication_handler(State(state): State<ApiState>, Path(kind): Path<String>) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let request = ComplicationRequest::new(kind);
    let (handle, rx) = ResponseHandle::new(request.token);

    if !state.provider.on_complication_request(request, handle) {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "provider destroyed");
    }

    match tokio::time::timeout(state.response_timeout, rx).await {
        Ok(Ok(Some(data))) => (StatusCode::OK, Json(data)).into_response(),
        Ok(Ok(None)) => StatusCode::NO_CONTENT.into_response(),
        Ok(Err(_)) => {
            tracing::warn!("complication request {} abandoned", request.token);
            error_response(StatusCode::SERVICE_UNAVAILABLE, "request abandoned")
        }
        Err(_) => {
            tracing::warn!("complication request {} timed out", request.token);
            error_response(StatusCode::GATEWAY_TIMEOUT, "no response from provider")
        }
    }
}

async fn preview_handler(State(state): State<ApiState>, Path(kind): Path<String>) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    match state.provider.preview(kind) {
        Some(data) => (StatusCode::OK, Json(data)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn tile_handler(State(state): State<ApiState>) -> Response {
    let record = match state.recorder.latest().await {
        Ok(record) => record.unwrap_or_else(LocationRecord::unknown),
        Err(e) => {
            tracing::error!("failed to read location record: {:?}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let freshness = record.freshness(Utc::now());
    let refreshing = freshness > Freshness::StaleExact;
    if refreshing {
        tracing::debug!("tile record is {:?}, refreshing", freshness);
        let recorder = state.recorder.clone();
        tokio::spawn(async move {
            if let Err(e) = recorder.read_fresh().await {
                tracing::error!("background refresh failed: {:?}", e);
            }
        });
    }

    Json(TileResponse {
        description: record.description(),
        time: record.formatted_time(),
        freshness,
        refreshing,
    })
    .into_response()
}

async fn refresh_handler(State(state): State<ApiState>) -> Response {
    match state.recorder.read_fresh().await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => {
            tracing::error!("refresh failed: {:?}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn refreshes_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(RefreshesResponse {
        refreshes: state.host.refresh_count(),
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::application::test_support::*;
    use crate::application::{LocationPipeline, UpdateHandler, DEFAULT_THROTTLE};
    use crate::domain::ports::LocationStore;
    use crate::domain::services::{ComplicationRenderer, DescriptionFormatter};
    use crate::domain::value_objects::LocationRequest;
    use crate::infrastructure::MainThread;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct TestApp {
        state: ApiState,
        store: Arc<MemoryLocationStore>,
    }

    fn create_test_app(source: MockLocationSource, geocoder: MockGeocoder) -> TestApp {
        let pipeline = Arc::new(LocationPipeline::new(
            Arc::new(MockPermissionGate::granted()),
            Arc::new(source),
            Arc::new(geocoder),
        ));
        let host = Arc::new(LoggingComplicationHost::new());
        let store = Arc::new(MemoryLocationStore::default());

        let mut request = LocationRequest::complication();
        request.expiration = Some(Duration::from_millis(50));

        let provider = ComplicationProvider::new(
            pipeline.clone(),
            ComplicationRenderer::default(),
            MainThread::start().unwrap(),
        )
        .with_request(request.clone());
        let recorder = LocationRecorder::new(
            pipeline,
            store.clone(),
            Arc::new(UpdateHandler::new(host.clone(), DEFAULT_THROTTLE)),
            DescriptionFormatter::default(),
        )
        .with_request(request);

        TestApp {
            state: ApiState::new(Arc::new(provider), Arc::new(recorder), host)
                .with_response_timeout(Duration::from_secs(5)),
            store,
        }
    }

    fn default_app() -> TestApp {
        create_test_app(
            MockLocationSource::with_last(fix_minutes_ago(5)),
            MockGeocoder::found(main_street()),
        )
    }

    async fn send(state: &ApiState, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    fn json(body: &[u8]) -> serde_json::Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn test_health_handler() {
        let app = default_app();
        let (status, body) = send(&app.state, "GET", "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["status"], "ok");
    }

    #[tokio::test]
    async fn test_short_text_complication() {
        let app = default_app();
        let (status, body) = send(&app.state, "GET", "/api/v1/complications/short_text").await;

        assert_eq!(status, StatusCode::OK);
        let data = json(&body);
        assert_eq!(data["type"], "short_text");
        assert_eq!(data["text"], "5m");
        assert_eq!(data["content_description"], "100 Main St, 5 minutes ago");
        assert_eq!(data["tap_action"]["action"], "open_activity");
    }

    #[tokio::test]
    async fn test_long_text_complication_kebab_case() {
        let app = default_app();
        let (status, body) = send(&app.state, "GET", "/api/v1/complications/long-text").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["text"], "100 Main St");
    }

    #[tokio::test]
    async fn test_unsupported_kind_is_no_content() {
        let app = default_app();
        let (status, body) = send(&app.state, "GET", "/api/v1/complications/ranged_value").await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_kind_is_bad_request() {
        let app = default_app();
        let (status, body) = send(&app.state, "GET", "/api/v1/complications/sparkline").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json(&body)["error"].as_str().unwrap().contains("sparkline"));
    }

    #[tokio::test]
    async fn test_failed_resolution_renders_fallback() {
        let app = create_test_app(MockLocationSource::silent(), MockGeocoder::found(main_street()));
        let (status, body) = send(&app.state, "GET", "/api/v1/complications/long_text").await;

        assert_eq!(status, StatusCode::OK);
        let data = json(&body);
        assert_eq!(data["text"], "No location");
        assert_eq!(data["title"], "--");
    }

    #[tokio::test]
    async fn test_destroyed_provider_is_unavailable() {
        let app = default_app();
        app.state.provider.on_destroy();
        let (status, _) = send(&app.state, "GET", "/api/v1/complications/short_text").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_preview() {
        let app = default_app();
        let (status, body) = send(&app.state, "GET", "/api/v1/complications/long_text/preview").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["text"], "Null Island");

        let (status, _) = send(&app.state, "GET", "/api/v1/complications/photo_image/preview").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_refresh_stores_record_and_counts() {
        let app = default_app();

        let (status, body) = send(&app.state, "POST", "/api/v1/refresh").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["location_name"], "100 Main St");
        assert!(app.store.latest().await.unwrap().is_some());

        let (status, body) = send(&app.state, "GET", "/api/v1/refreshes").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["refreshes"], 1);
    }

    #[tokio::test]
    async fn test_tile_with_fresh_record_does_not_refresh() {
        let app = default_app();
        app.store
            .upsert(&LocationRecord::named(&fix_minutes_ago(1), "Kings Cross"))
            .await
            .unwrap();

        let (status, body) = send(&app.state, "GET", "/api/v1/tile").await;
        assert_eq!(status, StatusCode::OK);
        let tile = json(&body);
        assert_eq!(tile["description"], "Kings Cross");
        assert_eq!(tile["freshness"], "FRESH_EXACT");
        assert_eq!(tile["refreshing"], false);
    }

    #[tokio::test]
    async fn test_tile_without_record_refreshes_in_background() {
        let app = default_app();

        let (status, body) = send(&app.state, "GET", "/api/v1/tile").await;
        assert_eq!(status, StatusCode::OK);
        let tile = json(&body);
        assert_eq!(tile["freshness"], "UNKNOWN");
        assert_eq!(tile["refreshing"], true);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let stored = app.store.latest().await.unwrap().unwrap();
        assert_eq!(stored.location_name.as_deref(), Some("100 Main St"));
    }
}
