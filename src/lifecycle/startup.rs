//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Initialize all subsystems in dependency order
//! - Start background tasks (snapshot watchers, fan-out, metrics)
//! - Bind listeners and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)
//! - A server that stops with an error shuts the whole application down

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::admin::{setup_admin_router, AdminState};
use crate::config::loader::{validate, ConfigError};
use crate::config::ServerConfig;
use crate::coordinator::PollCoordinator;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::{metrics, LogLevelHandle};
use crate::snapshot::{SnapshotError, SnapshotWatcher};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start metrics exporter: {0}")]
    Metrics(String),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// A running service.
pub struct Application {
    http_addr: SocketAddr,
    admin_addr: Option<SocketAddr>,
    coordinator: Arc<PollCoordinator>,
    shutdown: Shutdown,
    servers: Vec<JoinHandle<Result<(), std::io::Error>>>,
    tasks: Vec<JoinHandle<()>>,
}

/// Bring the service up. Returns once both listeners accept traffic.
pub async fn start(config: ServerConfig, log_level: LogLevelHandle) -> Result<Application, StartupError> {
    validate(&config)?;

    let options = config.watch.options();
    let mut watchers = Vec::with_capacity(config.watch.paths.len());
    for path in &config.watch.paths {
        watchers.push(Arc::new(SnapshotWatcher::initialize(path, options)?));
    }

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|e: std::net::AddrParseError| StartupError::Metrics(e.to_string()))?;
        metrics::init_metrics(addr).map_err(|e| StartupError::Metrics(e.to_string()))?;
    }

    let shutdown = Shutdown::new();
    let coordinator = Arc::new(PollCoordinator::new(
        watchers.clone(),
        config.poll.timeout(),
        shutdown.child(),
    ));

    let mut tasks = Vec::new();
    for watcher in &watchers {
        tasks.push(watcher.spawn(shutdown.token())?);
    }
    tasks.extend(coordinator.spawn_fan_out(shutdown.token()));

    let listener = bind(&config.listener.bind_address).await?;
    let http_addr = listener.local_addr()?;
    let server = HttpServer::new(Arc::clone(&coordinator), http_addr.port());
    let mut servers = vec![spawn_server(&shutdown, "config", move |token| server.run(listener, token))];

    let mut admin_addr = None;
    if config.admin.enabled {
        let listener = bind(&config.admin.bind_address).await?;
        admin_addr = Some(listener.local_addr()?);
        let router = setup_admin_router(AdminState {
            coordinator: Arc::clone(&coordinator),
            log_level,
            api_key: config.admin.api_key.as_deref().map(Arc::from),
        });
        servers.push(spawn_server(&shutdown, "admin", move |token: CancellationToken| async move {
            let addr = listener.local_addr()?;
            tracing::info!(address = %addr, "Admin server starting");
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await?;
            tracing::info!("Admin server stopped");
            Ok::<(), std::io::Error>(())
        }));
    }

    tracing::info!(
        http = %http_addr,
        admin = ?admin_addr,
        watchers = watchers.len(),
        poll_timeout_secs = config.poll.timeout().as_secs(),
        "mock-apollo started"
    );

    Ok(Application {
        http_addr,
        admin_addr,
        coordinator,
        shutdown,
        servers,
        tasks,
    })
}

async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address).await.map_err(|source| StartupError::Bind {
        address: address.to_string(),
        source,
    })
}

fn spawn_server<F, Fut>(shutdown: &Shutdown, name: &'static str, serve: F) -> JoinHandle<Result<(), std::io::Error>>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: std::future::Future<Output = Result<(), std::io::Error>> + Send + 'static,
{
    let shutdown = shutdown.clone();
    let running = serve(shutdown.token());
    tokio::spawn(async move {
        let result = running.await;
        if let Err(e) = &result {
            tracing::error!(server = name, error = %e, "Server failed");
            shutdown.trigger();
        }
        result
    })
}

impl Application {
    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.admin_addr
    }

    pub fn coordinator(&self) -> &Arc<PollCoordinator> {
        &self.coordinator
    }

    /// Begin graceful shutdown.
    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Resolve once shutdown has been triggered, from here or by a failing server.
    pub async fn shutdown_triggered(&self) {
        self.shutdown.triggered().await;
    }

    /// Wait until every server and background task has stopped.
    ///
    /// Returns the first server error, if any.
    pub async fn wait(self) -> Result<(), StartupError> {
        let mut first_error = None;
        for server in self.servers {
            match server.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(e) => tracing::error!(error = %e, "Server task panicked"),
            }
        }
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Background task panicked");
            }
        }
        match first_error {
            Some(e) => Err(StartupError::Server(e)),
            None => Ok(()),
        }
    }
}
