//! Configuration snapshot subsystem.
//!
//! # Data Flow
//! ```text
//! snapshot file (YAML/JSON/TOML)
//!     → loader.rs (read & deserialize into a raw document)
//!     → validation.rs (structural checks, first violation wins)
//!     → ConfigSnapshot (validated, immutable)
//!     → published by watcher.rs via atomic swap
//!
//! On file change:
//!     watcher.rs observes the file
//!     → reload (load + validate)
//!     → success: swap Arc<ConfigSnapshot>, bump generation, signal
//!     → failure: log, keep the previous snapshot, no signal
//! ```

pub mod loader;
pub mod model;
pub mod validation;
pub mod watcher;

pub use loader::{load_snapshot, parse_snapshot, SnapshotError, SnapshotFormat};
pub use model::{ConfigSnapshot, NamespaceConfig};
pub use validation::{ValidationError, ValidationOptions};
pub use watcher::{SnapshotWatcher, WatchOptions, MIN_WATCH_INTERVAL};
