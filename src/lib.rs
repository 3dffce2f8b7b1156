//! Mock Apollo config service library.

pub mod admin;
pub mod config;
pub mod coordinator;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod poll;
pub mod snapshot;

pub use config::ServerConfig;
pub use coordinator::PollCoordinator;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use snapshot::SnapshotWatcher;
