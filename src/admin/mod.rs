//! Internal admin surface.
//!
//! Served on its own listener so it is never exposed next to the public
//! config routes.
//!
//! # Routes
//! - `POST /logging?level=` and `PATCH /ctrl/logging?level=`: replace the log level
//! - `GET /admin/status`: version, outstanding polls, watcher generations
//! - `POST /admin/reload`: re-read every snapshot file now

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::coordinator::PollCoordinator;
use crate::observability::LogLevelHandle;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// State shared by the admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub coordinator: Arc<PollCoordinator>,
    pub log_level: LogLevelHandle,
    /// Bearer token required on every route, if set.
    pub api_key: Option<Arc<str>>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/logging", post(set_log_level))
        .route("/ctrl/logging", patch(set_log_level))
        .route("/admin/status", get(get_status))
        .route("/admin/reload", post(reload_snapshots))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
