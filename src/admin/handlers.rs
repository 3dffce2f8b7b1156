use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::observability::LogLevel;

#[derive(Debug, Deserialize)]
pub struct LevelQuery {
    pub level: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub outstanding_polls: usize,
    pub poll_timeout_secs: u64,
    pub log_filter: Option<String>,
    pub watchers: Vec<WatcherStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WatcherStatus {
    pub path: String,
    pub generation: u64,
    pub namespaces: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadResult {
    pub path: String,
    pub generation: Option<u64>,
    pub error: Option<String>,
}

/// `POST /logging?level=` and `PATCH /ctrl/logging?level=`
pub async fn set_log_level(State(state): State<AdminState>, Query(query): Query<LevelQuery>) -> Response {
    let Some(raw) = query.level else {
        return (StatusCode::BAD_REQUEST, "missing level").into_response();
    };
    let level = match raw.parse::<LogLevel>() {
        Ok(level) => level,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    match state.log_level.replace(level) {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to replace log level");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// `GET /admin/status`
pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let watchers = state
        .coordinator
        .watchers()
        .iter()
        .map(|w| WatcherStatus {
            path: w.path().display().to_string(),
            generation: w.generation(),
            namespaces: w.current_snapshot().namespace_count(),
        })
        .collect();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        outstanding_polls: state.coordinator.outstanding_polls(),
        poll_timeout_secs: state.coordinator.poll_timeout().as_secs(),
        log_filter: state.log_level.current(),
        watchers,
    })
}

/// `POST /admin/reload`
///
/// A failed reload keeps serving the previous snapshot.
pub async fn reload_snapshots(State(state): State<AdminState>) -> Json<Vec<ReloadResult>> {
    let mut results = Vec::with_capacity(state.coordinator.watchers().len());
    for w in state.coordinator.watchers() {
        let path = w.path().display().to_string();
        let result = match w.reload_async().await {
            Ok(generation) => {
                tracing::info!(path = %path, generation, "Snapshot reloaded on request");
                ReloadResult { path, generation: Some(generation), error: None }
            }
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Requested reload failed, keeping previous snapshot");
                ReloadResult { path, generation: None, error: Some(e.to_string()) }
            }
        };
        results.push(result);
    }
    Json(results)
}
