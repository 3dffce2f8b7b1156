//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing)
//! - Serve on a bound listener until shutdown, then drain

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::coordinator::PollCoordinator;
use crate::http::handlers;
use crate::http::request::{make_request_span, propagate_request_id, set_request_id};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<PollCoordinator>,
    /// Port advertised by `/services/config`.
    pub port: u16,
}

/// Public HTTP server of the config service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(coordinator: Arc<PollCoordinator>, port: u16) -> Self {
        let state = AppState { coordinator, port };
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/healthz", get(handlers::healthz))
            .route("/configs/{app_id}/{cluster}/{namespace}", get(handlers::get_config))
            .route(
                "/configfiles/json/{app_id}/{cluster}/{namespace}",
                get(handlers::get_config_flat),
            )
            .route("/services/config", get(handlers::services_config))
            .route("/notifications/v2", get(handlers::long_poll))
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id())
                    .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
                    .layer(propagate_request_id()),
            )
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: CancellationToken) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{SnapshotWatcher, WatchOptions};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;

    const STUB: &str = "app:\n  cluster:\n    ns:\n      releaseKey: abc\n      configurations:\n        mysql: mysql://root@localhost/mysql\n";

    fn router(dir: &std::path::Path, timeout: Duration) -> (Router, Arc<PollCoordinator>) {
        let path = dir.join("config.yaml");
        std::fs::write(&path, STUB).unwrap();
        let watcher = Arc::new(SnapshotWatcher::initialize(path, WatchOptions::default()).unwrap());
        let coordinator = Arc::new(PollCoordinator::new(vec![watcher], timeout, CancellationToken::new()));
        (HttpServer::new(Arc::clone(&coordinator), 8070).router(), coordinator)
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_get_config() {
        let dir = tempfile::tempdir().unwrap();
        let (router, _) = router(dir.path(), Duration::from_secs(1));

        let (status, body) = get(router.clone(), "/configs/app/cluster/ns").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            r#"{"appId":"app","cluster":"cluster","namespaceName":"ns","releaseKey":"abc","configurations":{"mysql":"mysql://root@localhost/mysql"}}"#
        );

        let (status, _) = get(router.clone(), "/configs/app/cluster/ns?releaseKey=abc").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = get(router, "/configs/app/cluster/ns?releaseKey=stale").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_get_config_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (router, _) = router(dir.path(), Duration::from_secs(1));

        let (status, body) = get(router, "/configs/app/cluster/ns404").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_get_config_flat() {
        let dir = tempfile::tempdir().unwrap();
        let (router, _) = router(dir.path(), Duration::from_secs(1));

        let (status, body) = get(router.clone(), "/configfiles/json/app/cluster/ns.properties").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"mysql":"mysql://root@localhost/mysql"}"#);

        let (status, _) = get(router, "/configfiles/json/app/cluster/ns404").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_long_poll_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let (router, coordinator) = router(dir.path(), Duration::from_secs(1));

        let (status, _) = get(router.clone(), "/notifications/v2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get(router, "/notifications/v2?notifications=not-json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(coordinator.outstanding_polls(), 0);
    }

    #[tokio::test]
    async fn test_long_poll_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let (router, coordinator) = router(dir.path(), Duration::from_millis(1));

        let (status, body) = get(
            router,
            "/notifications/v2?notifications=%5B%7B%22notificationId%22%3A1%2C%22namespaceName%22%3A%22ns%22%7D%5D",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_MODIFIED);
        assert!(body.is_empty());
        assert_eq!(coordinator.outstanding_polls(), 0);
    }

    #[tokio::test]
    async fn test_services_health_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let (router, _) = router(dir.path(), Duration::from_secs(1));

        let (status, body) = get(router.clone(), "/services/config").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            r#"[{"appName":"APOLLO-CONFIGSERVICE","instanceId":"localhost:apollo-configservice:8070","homepageUrl":"http://localhost:8070/"}]"#
        );

        let (status, body) = get(router.clone(), "/healthz").await;
        assert_eq!((status, body.as_str()), (StatusCode::OK, "OK"));

        let (status, body) = get(router, "/unknown/route").await;
        assert_eq!((status, body.as_str()), (StatusCode::NOT_FOUND, "path not found"));
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let dir = tempfile::tempdir().unwrap();
        let (router, _) = router(dir.path(), Duration::from_secs(1));

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .header("x-request-id", "req-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-1");

        let response = router
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }
}
