//! Monitoring Session Routes

use std::time::Instant;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use monitor::{
    ChartPoint, Classification, DriveHandle, DriveLoop, EpisodeCounts, SafetyState,
    SessionStatistics,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{ApiError, SharedState};

/// Session status
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub active: bool,
    pub state: SafetyState,
    pub frame: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_classification: Option<Classification>,
}

/// Windowed statistics
#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub session_id: Uuid,
    pub statistics: SessionStatistics,
    pub episodes: EpisodeCounts,
}

/// Alertness trend
#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub session_id: Uuid,
    pub data: Vec<ChartPoint>,
    pub count: usize,
}

async fn status(state: &SharedState) -> StatusResponse {
    let app = state.read().await;
    let session = app.session.lock().await;
    StatusResponse {
        session_id: app.session_id,
        started_at: app.started_at,
        active: session.is_active(),
        state: session.current_state(),
        frame: session.frame(),
        last_classification: session.last_classification().copied(),
    }
}

/// Start monitoring and the drive loop (no-op if already running)
pub async fn start(State(state): State<SharedState>) -> Result<Json<StatusResponse>, ApiError> {
    {
        let mut app = state.write().await;
        let period = {
            let mut session = app.session.lock().await;
            session.start_session();
            session.tick_period()
        };

        if app.drive.as_ref().is_some_and(DriveHandle::is_finished) {
            warn!("Drive loop for session {} had exited, respawning", app.session_id);
            if let Some(drive) = app.drive.take() {
                drive.stop().await;
            }
        }

        if app.drive.is_none() {
            info!("Spawning drive loop for session {}", app.session_id);
            app.drive = Some(DriveLoop::new(app.session.clone(), period)?.spawn());
        }
    }

    Ok(Json(status(&state).await))
}

/// Stop monitoring; statistics are kept until reset
pub async fn stop(State(state): State<SharedState>) -> Json<StatusResponse> {
    {
        let mut app = state.write().await;
        if let Some(drive) = app.drive.take() {
            drive.stop().await;
        }
        app.session.lock().await.stop_session();
    }

    Json(status(&state).await)
}

/// Reset the log and start a new session id
pub async fn reset(State(state): State<SharedState>) -> Json<StatusResponse> {
    {
        let mut app = state.write().await;
        app.session.lock().await.reset_session();
        app.session_id = Uuid::new_v4();
        app.started_at = Utc::now();
        info!("New session {}", app.session_id);
    }

    Json(status(&state).await)
}

/// Current status
pub async fn get_status(State(state): State<SharedState>) -> Json<StatusResponse> {
    Json(status(&state).await)
}

/// Windowed statistics
pub async fn get_statistics(State(state): State<SharedState>) -> Json<StatisticsResponse> {
    let app = state.read().await;
    let mut session = app.session.lock().await;
    let snapshot = session.snapshot(Instant::now());

    Json(StatisticsResponse {
        session_id: app.session_id,
        statistics: snapshot.statistics,
        episodes: snapshot.episodes,
    })
}

/// Alertness trend over the window
pub async fn get_chart(State(state): State<SharedState>) -> Json<ChartResponse> {
    let app = state.read().await;
    let data = app.session.lock().await.get_chart_series(Instant::now());

    Json(ChartResponse {
        session_id: app.session_id,
        count: data.len(),
        data,
    })
}
