//! Event table slots and handles.
//!
//! An event is a named signal/value pair that `Event`-kind tasks subscribe
//! to. The table and fire-queue *walking* logic lives on
//! [`Scheduler`](crate::scheduler::Scheduler) (it has to reach into the task
//! table to walk subscriber chains); this module only owns the event
//! record shape and its handle.

use crate::task::END;

/// Stable handle to an allocated event. Remains valid until deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle(pub(crate) u16);

impl EventHandle {
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct EventSlot {
    pub(crate) enabled: bool,
    /// Currently-published signal; `0` means no publication pending/in-flight.
    pub(crate) signal: u16,
    pub(crate) value: u32,
    /// First subscriber task index, or `END` if none.
    pub(crate) sub_head: u16,
}

impl EventSlot {
    pub(crate) const fn disabled() -> Self {
        Self {
            enabled: false,
            signal: 0,
            value: 0,
            sub_head: END,
        }
    }
}
