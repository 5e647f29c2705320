//! Unified error type for the scheduler core.
//!
//! Every fallible operation funnels into a single `Error` enum rather than a
//! bare boolean, so callers can tell "bad handle" apart from "table full"
//! apart from "duplicate publish" instead of just getting `false`. All
//! variants are `Copy` so they cost nothing to propagate.

use core::fmt;

/// Every fallible scheduler operation returns this on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Handle is null, out of range, or refers to a freed slot.
    InvalidHandle,
    /// Operation is not permitted for the task's kind (e.g. suspending a `OneShot`).
    KindMismatch,
    /// The task table, event table, or fire queue has no free capacity.
    Full,
    /// Handle is valid but not present in the list the operation expected it in.
    NotPresent,
    /// `set_event` was called with the signal the event currently holds, undelivered.
    DuplicateSignal,
    /// `delete_event` was called while the event still has subscribers.
    HasSubscribers,
    /// An in-task primitive was invoked with no task currently executing.
    NotRunnableContext,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHandle => write!(f, "invalid handle"),
            Self::KindMismatch => write!(f, "operation not valid for this task kind"),
            Self::Full => write!(f, "table full"),
            Self::NotPresent => write!(f, "handle not present in expected list"),
            Self::DuplicateSignal => write!(f, "signal already pending for this event"),
            Self::HasSubscribers => write!(f, "event still has subscribers"),
            Self::NotRunnableContext => write!(f, "no task is currently executing"),
        }
    }
}

/// Scheduler-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
