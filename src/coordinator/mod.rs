//! Poll coordination subsystem.
//!
//! # Data Flow
//! ```text
//! long-poll request
//!     → service.rs creates a Poll and registers it (registry.rs)
//!     → waits for the Poll's outcome
//!     → deregisters it
//!
//! watcher change signal (generation g of watcher i)
//!     → service.rs fan-out task
//!     → lock registry, resolve() every poll registered before g
//! ```

mod registry;
pub mod service;

pub use service::{CoordinatorError, PollCoordinator, PollRegistration, PROPERTIES_SUFFIX};
