//! Long-poll subsystem.
//!
//! A [`Poll`] knows nothing about watchers or the registry. It exposes
//! `resolve()` to signal a change and `wait()` to obtain the single
//! [`PollOutcome`] once the race between change, timeout and cancellation
//! has been decided.

pub mod long_poll;
pub mod notification;

pub use long_poll::{NoChangeReason, Poll, PollError, PollId, PollOutcome, DEFAULT_POLL_TIMEOUT};
pub use notification::{parse_notifications, ChangeNotificationRequest};
