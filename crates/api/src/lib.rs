//! Drowsiness Monitor API Server
//!
//! REST adapter between a monitoring session and a dashboard: lifecycle
//! control, status, windowed statistics, and the alertness trend.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use monitor::{DriveHandle, MonitorConfig, MonitorSession, SharedSession};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

mod error;
mod routes;
mod settings;

pub use error::ApiError;
pub use settings::{ServerConfig, Settings};

/// Application state shared across handlers
pub struct AppState {
    /// Monitoring session (shared with the drive loop)
    pub session: SharedSession,
    /// Running drive loop, if monitoring
    pub drive: Option<DriveHandle>,
    /// Identifier of the current session (changes on reset)
    pub session_id: Uuid,
    /// Wall-clock start of the current session
    pub started_at: DateTime<Utc>,
    /// Version string
    pub version: String,
    /// Process start time
    pub start_time: std::time::Instant,
    /// Prometheus handle when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

/// Shared handler state
pub type SharedState = Arc<RwLock<AppState>>;

impl AppState {
    /// Create new application state with a stopped session
    pub fn new(config: MonitorConfig) -> Result<Self, ApiError> {
        let session = MonitorSession::new(config)?;
        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            drive: None,
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics: None,
        })
    }

    /// Attach a Prometheus handle for `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime_seconds: u64,
    pub session_id: Uuid,
    pub monitoring: bool,
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/session/start", post(routes::session::start))
        .route("/api/v1/session/stop", post(routes::session::stop))
        .route("/api/v1/session/reset", post(routes::session::reset))
        .route("/api/v1/session/status", get(routes::session::get_status))
        .route("/api/v1/session/statistics", get(routes::session::get_statistics))
        .route("/api/v1/session/chart", get(routes::session::get_chart))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        session_id: state.session_id,
        monitoring: state.drive.is_some(),
    })
}

/// Prometheus scrape handler
async fn metrics_handler(State(state): State<SharedState>) -> Result<String, ApiError> {
    let state = state.read().await;
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .ok_or(ApiError::MetricsDisabled)
}

/// Initialize logging
pub fn init_logging(server: &ServerConfig) -> Result<(), ApiError> {
    let level = server.validate()?;
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let installed = if server.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    installed.map_err(|e| ApiError::Logging(e.to_string()))
}

/// Run the server until Ctrl-C
pub async fn run_server(settings: Settings) -> Result<(), ApiError> {
    let mut state = AppState::new(settings.monitor)?;
    if settings.server.metrics {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| ApiError::Metrics(e.to_string()))?;
        state = state.with_metrics(handle);
    }

    let state = Arc::new(RwLock::new(state));
    let app = create_router(state.clone());

    info!("Starting API server on {}", settings.server.bind_addr);

    let listener = tokio::net::TcpListener::bind(&settings.server.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    if let Some(drive) = state.write().await.drive.take() {
        drive.stop().await;
    }
    info!("API server stopped");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn state() -> SharedState {
        let config = MonitorConfig {
            jitter_seed: Some(1),
            ..Default::default()
        };
        Arc::new(RwLock::new(AppState::new(config).unwrap()))
    }

    async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_router(state());
        let (status, body) = call(&app, "GET", "/api/v1/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["monitoring"], false);
    }

    #[tokio::test]
    async fn test_statistics_defaults() {
        let app = create_router(state());
        let (status, body) = call(&app, "GET", "/api/v1/session/statistics").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["statistics"]["alert_pct"], 100);
        assert_eq!(body["statistics"]["danger_pct"], 0);
        assert_eq!(body["statistics"]["duration_seconds"], 0);
        assert_eq!(body["episodes"]["warning"], 0);
    }

    #[tokio::test]
    async fn test_start_stop_lifecycle() {
        let shared = state();
        let app = create_router(shared.clone());

        let (status, body) = call(&app, "POST", "/api/v1/session/start").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["active"], true);
        assert!(shared.read().await.drive.is_some());

        // Starting twice keeps a single loop
        let (_, body) = call(&app, "POST", "/api/v1/session/start").await;
        assert_eq!(body["active"], true);

        let (status, body) = call(&app, "POST", "/api/v1/session/stop").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["active"], false);
        assert!(shared.read().await.drive.is_none());
    }

    #[tokio::test]
    async fn test_reset_issues_new_session_id() {
        let app = create_router(state());
        let (_, before) = call(&app, "GET", "/api/v1/session/status").await;
        let (status, after) = call(&app, "POST", "/api/v1/session/reset").await;

        assert_eq!(status, StatusCode::OK);
        assert_ne!(before["session_id"], after["session_id"]);
        assert_eq!(after["frame"], 0);
        assert_eq!(after["state"], "alert");
    }

    #[tokio::test]
    async fn test_chart_reflects_recorded_ticks() {
        let shared = state();
        {
            let app = shared.read().await;
            let mut session = app.session.lock().await;
            session.start_session();
            session.on_tick();
            session.on_tick();
        }

        let app = create_router(shared);
        let (status, body) = call(&app, "GET", "/api/v1/session/chart").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["alertness_value"], 100.0);
        assert_eq!(body["data"][0]["bucket_label"], "00:00");
    }

    #[tokio::test]
    async fn test_metrics_disabled_returns_not_found() {
        let app = create_router(state());
        let (status, _) = call(&app, "GET", "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_start_respawns_exited_drive_loop() {
        let shared = state();
        let app = create_router(shared.clone());
        call(&app, "POST", "/api/v1/session/start").await;

        {
            let state = shared.read().await;
            let drive = state.drive.as_ref().unwrap();
            drive.request_stop();
            while !drive.is_finished() {
                tokio::task::yield_now().await;
            }
        }

        let (status, body) = call(&app, "POST", "/api/v1/session/start").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["active"], true);
        assert!(!shared.read().await.drive.as_ref().unwrap().is_finished());

        call(&app, "POST", "/api/v1/session/stop").await;
    }

    #[test]
    fn test_init_logging_rejects_unknown_level() {
        let server = ServerConfig {
            log_level: "chatty".to_string(),
            ..Default::default()
        };
        let err = init_logging(&server).unwrap_err();
        assert!(matches!(err, ApiError::Config(ref e) if e.field() == Some("server.log_level")));
    }
}
