//! Cooperative, tick-driven task scheduler for resource-constrained hosts.
//!
//! Everything here is `#![no_std]`-shaped: no heap allocation, no `'static`
//! global state, no dependency on wall-clock time. A [`scheduler::Scheduler`]
//! owns a fixed number of task and event slots inline and is driven by
//! repeatedly calling [`scheduler::Scheduler::run_step`] with the caller's
//! own tick counter (or by handing it a tick source via
//! [`scheduler::Scheduler::start_loop`]).
//!
//! Task bodies never own the scheduler directly — they receive a
//! [`task::TaskCtx`], which reborrows it for the call. Acting on the
//! currently-running task (yield, delay, suspend, close) goes through
//! `TaskCtx`'s no-handle methods and is deferred until the body returns;
//! acting on another task, whether from outside any body or re-entrantly
//! from inside a different one, goes through a `TaskHandle` — either
//! directly on [`scheduler::Scheduler`] or via `TaskCtx`'s handle-taking
//! methods, which apply the same way immediately.

#![deny(unused_must_use)]

pub mod error;
pub mod event;
pub mod scheduler;
pub mod task;
mod tick;

pub use error::{Error, Result};
pub use event::EventHandle;
pub use scheduler::Scheduler;
pub use task::{TaskCtx, TaskFn, TaskHandle, TaskKind};
