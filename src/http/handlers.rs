//! Public route handlers.
//!
//! Every handler reads the coordinator through [`AppState`]; none of them
//! touches the registry lock except `long_poll` (via the coordinator) and
//! `healthz`.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::http::response::{ConfigResponse, ServiceInstance};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::poll::parse_notifications;

/// Query of `GET /configs/...`.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigQuery {
    #[serde(rename = "releaseKey")]
    pub release_key: Option<String>,
}

/// `GET /configs/{appId}/{cluster}/{namespace}`
pub async fn get_config(
    State(state): State<AppState>,
    Path((app_id, cluster, namespace)): Path<(String, String, String)>,
    Query(query): Query<ConfigQuery>,
    uri: Uri,
) -> Response {
    let config = match state.coordinator.resolve_namespace(&app_id, &cluster, &namespace) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(uri = %uri, error = %e, "No config for request");
            metrics::record_config_request("config", 404);
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    if let Some(release_key) = query.release_key.as_deref() {
        if release_key != config.release_key {
            tracing::warn!(
                uri = %uri,
                requested = release_key,
                current = %config.release_key,
                "Release key does not match"
            );
            metrics::record_config_request("config", 404);
            return StatusCode::NOT_FOUND.into_response();
        }
    }

    tracing::debug!(uri = %uri, "Served config");
    metrics::record_config_request("config", 200);
    Json(ConfigResponse::new(app_id, cluster, namespace, config)).into_response()
}

/// `GET /configfiles/json/{appId}/{cluster}/{namespace}`
pub async fn get_config_flat(
    State(state): State<AppState>,
    Path((app_id, cluster, namespace)): Path<(String, String, String)>,
    uri: Uri,
) -> Response {
    match state.coordinator.resolve_namespace(&app_id, &cluster, &namespace) {
        Ok(config) => {
            tracing::debug!(uri = %uri, "Served flat config");
            metrics::record_config_request("configfiles", 200);
            Json(config.configurations).into_response()
        }
        Err(e) => {
            tracing::warn!(uri = %uri, error = %e, "No config for request");
            metrics::record_config_request("configfiles", 404);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// `GET /notifications/v2?notifications=[...]`
///
/// Held open until a watched snapshot changes (200, request echoed), the
/// poll times out or the server shuts down (304). A client disconnect drops
/// this future, which cancels and deregisters the poll.
pub async fn long_poll(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    uri: Uri,
) -> Response {
    let Some(raw) = params.get("notifications") else {
        tracing::warn!(uri = %uri, "Invalid request, missing notifications");
        return StatusCode::BAD_REQUEST.into_response();
    };
    let notifications = match parse_notifications(raw) {
        Ok(notifications) => notifications,
        Err(e) => {
            tracing::warn!(uri = %uri, error = %e, "Invalid request, malformed notifications");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let outcome = state.coordinator.long_poll(notifications).await;
    tracing::debug!(uri = %uri, changed = outcome.is_changed(), "Served poll");
    outcome.into_response()
}

/// `GET /services/config`
pub async fn services_config(State(state): State<AppState>) -> Json<Vec<ServiceInstance>> {
    Json(vec![ServiceInstance::config_service(state.port)])
}

/// `GET /healthz`
pub async fn healthz(State(state): State<AppState>) -> &'static str {
    state.coordinator.health_check();
    "OK"
}

pub async fn not_found(method: Method, uri: Uri) -> (StatusCode, &'static str) {
    tracing::warn!(method = %method, uri = %uri, "HTTP path not found");
    (StatusCode::NOT_FOUND, "path not found")
}
