//! Task slots, handles, and the in-task control context.
//!
//! A [`TaskSlot`] is addressed by a stable [`TaskHandle`] (its position in
//! the scheduler's task table, which never changes once allocated). Slots
//! are intrusively linked — `next` threads either the time queue or an
//! event's subscriber chain, never both at once (I4 in the design doc).
//!
//! Task bodies never mutate the table directly. They receive a [`TaskCtx`]
//! instead and record their own request (continue / yield / delay / suspend
//! / close) into it; the dispatcher reads that request back exactly once,
//! after the body returns. This is the sum-type re-expression of the
//! original's "flag word" — there is no global mutable flag anywhere in this
//! crate.
//!
//! [`TaskCtx`] also borrows the [`Scheduler`] itself for the duration of the
//! call, so a running body can reach *other* tasks and events too —
//! `suspend_task`/`resume_task`/`kill_task` by handle, `create_event`/
//! `set_event`/etc., `add_periodic`/`add_oneshot`/`add_event_task` — exactly
//! as the reference implementation's free `System_*` functions are callable
//! from anywhere, including from inside a running task. Whether a handle
//! targets the task currently executing or a different one changes the
//! *mechanism* (deferred flag vs. immediate list surgery) but not the
//! observable contract in spec.md §4.6's Control API table.

use crate::error::{Error, Result};
use crate::event::EventHandle;
use crate::scheduler::Scheduler;

/// Sentinel marking "no such slot" in an intrusive link.
pub(crate) const END: u16 = u16::MAX;

/// Stable handle to an allocated task. Remains valid until the task is freed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(pub(crate) u16);

impl TaskHandle {
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    /// The handle's raw table index. `TaskFn` bodies are bare `fn` pointers
    /// with no captures, so a task that needs to remember another task's
    /// handle across invocations (to target it later with `kill_task` etc.)
    /// has nowhere to close over it — stashing the raw index in its own
    /// `exec_state` (or any other `u16`-sized slot it controls) and
    /// rebuilding the handle with [`TaskHandle::from_raw`] is the intended
    /// way to carry a handle across that boundary.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Rebuilds a handle from a raw table index previously obtained from
    /// [`TaskHandle::raw`]. Does not itself validate that the index still
    /// refers to an allocated slot — every `Scheduler`/`TaskCtx` operation
    /// that takes a `TaskHandle` validates it before acting.
    #[must_use]
    pub const fn from_raw(index: u16) -> Self {
        Self(index)
    }
}

/// The three task flavors a caller can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Re-scheduled automatically every `interval` ticks.
    Periodic,
    /// Scheduled once; freed after its single invocation unless it delays.
    OneShot,
    /// Invoked when its subscribed event publishes a matching signal.
    Event,
}

/// A task body: `(count_or_value, exec_state_or_signal, ctx) -> ()`.
///
/// For `Periodic` tasks the first argument is the invocation count and the
/// second is the preserved `exec_state`. For `OneShot` tasks the first
/// argument is always `0`. For `Event` tasks the first argument is the
/// published value and the second is the signal that matched — `exec_state`
/// is not delivered to event tasks (mirrors the reference implementation,
/// where an event task's continuation state is write-only and never read
/// back into the call).
///
/// Parameterized over the same `TASKS`/`EVENTS`/`FIRE_Q` capacities as the
/// owning [`Scheduler`], because the `ctx` parameter borrows that exact
/// scheduler instantiation — see [`TaskCtx`].
pub type TaskFn<const TASKS: usize, const EVENTS: usize, const FIRE_Q: usize> =
    for<'a> fn(u32, u16, &'a mut TaskCtx<'a, TASKS, EVENTS, FIRE_Q>);

/// Kind-specific slot payload. Folds the original's `kind` tag and its
/// tagged-union fields into one sum type, so a slot can never carry
/// `Periodic` fields while behaving like an `Event` task.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Payload {
    Free,
    Periodic {
        interval: u32,
        next_run_time: u32,
        count: u32,
    },
    OneShot {
        next_run_time: u32,
    },
    Event {
        event: u16,
        signal: u16,
        suspended: bool,
        /// `0` means "not delayed". Set by the dispatcher when an event
        /// task requests `Delay`; cleared by the delay-watcher once served.
        delay_until: u32,
    },
    /// The reserved system delay-watcher (see `scheduler::Scheduler`).
    /// Never user-visible: no public `TaskKind` variant maps to it.
    Watcher {
        next_run_time: u32,
        cursor: u16,
    },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TaskSlot<const TASKS: usize, const EVENTS: usize, const FIRE_Q: usize> {
    /// Intrusive link: time-queue successor, or event-chain successor.
    /// Never both — a slot belongs to at most one list at a time.
    pub(crate) next: u16,
    /// Continuation token carried across invocations (unused by Event tasks).
    pub(crate) exec_state: u16,
    /// `None` marks the slot free.
    pub(crate) body: Option<TaskFn<TASKS, EVENTS, FIRE_Q>>,
    pub(crate) payload: Payload,
}

impl<const TASKS: usize, const EVENTS: usize, const FIRE_Q: usize> TaskSlot<TASKS, EVENTS, FIRE_Q> {
    pub(crate) const fn free() -> Self {
        Self {
            next: END,
            exec_state: 0,
            body: None,
            payload: Payload::Free,
        }
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::free();
    }

    /// Free-slot test is payload-tagged rather than body-tagged: the
    /// reserved delay-watcher slot (`Payload::Watcher`) carries no `body` at
    /// all (it is dispatched internally, never through the `TaskFn`
    /// indirection) but must never be reported as allocatable.
    pub(crate) const fn is_free(&self) -> bool {
        matches!(self.payload, Payload::Free)
    }

    pub(crate) fn kind(&self) -> Option<TaskKind> {
        match self.payload {
            Payload::Free | Payload::Watcher { .. } => None,
            Payload::Periodic { .. } => Some(TaskKind::Periodic),
            Payload::OneShot { .. } => Some(TaskKind::OneShot),
            Payload::Event { .. } => Some(TaskKind::Event),
        }
    }

    /// Deadline this slot is queued against. `0` for kinds with no deadline.
    pub(crate) fn next_run_time(&self) -> u32 {
        match self.payload {
            Payload::Periodic { next_run_time, .. }
            | Payload::OneShot { next_run_time }
            | Payload::Watcher { next_run_time, .. } => next_run_time,
            Payload::Free | Payload::Event { .. } => 0,
        }
    }

    pub(crate) fn set_next_run_time(&mut self, t: u32) {
        match &mut self.payload {
            Payload::Periodic { next_run_time, .. }
            | Payload::OneShot { next_run_time }
            | Payload::Watcher { next_run_time, .. } => *next_run_time = t,
            Payload::Free | Payload::Event { .. } => {}
        }
    }

    pub(crate) fn interval(&self) -> u32 {
        match self.payload {
            Payload::Periodic { interval, .. } => interval,
            _ => 0,
        }
    }

    pub(crate) fn increment_count(&mut self) {
        if let Payload::Periodic { count, .. } = &mut self.payload {
            *count = count.wrapping_add(1);
        }
    }

    pub(crate) fn count(&self) -> u32 {
        match self.payload {
            Payload::Periodic { count, .. } => count,
            _ => 0,
        }
    }

    /// Event this slot subscribes to. Only meaningful for `Payload::Event`.
    pub(crate) fn event_ref(&self) -> u16 {
        match self.payload {
            Payload::Event { event, .. } => event,
            _ => END,
        }
    }

    pub(crate) fn signal(&self) -> u16 {
        match self.payload {
            Payload::Event { signal, .. } => signal,
            _ => 0,
        }
    }

    pub(crate) fn set_signal(&mut self, new_signal: u16) {
        if let Payload::Event { signal, .. } = &mut self.payload {
            *signal = new_signal;
        }
    }

    pub(crate) fn is_suspended(&self) -> bool {
        matches!(self.payload, Payload::Event { suspended: true, .. })
    }

    pub(crate) fn set_suspended(&mut self, suspended: bool) {
        if let Payload::Event { suspended: s, .. } = &mut self.payload {
            *s = suspended;
        }
    }

    pub(crate) fn delay_until(&self) -> u32 {
        match self.payload {
            Payload::Event { delay_until, .. } => delay_until,
            _ => 0,
        }
    }

    pub(crate) fn set_delay_until(&mut self, t: u32) {
        if let Payload::Event { delay_until, .. } = &mut self.payload {
            *delay_until = t;
        }
    }

    /// Watcher-only scan cursor; `0` for every other payload.
    pub(crate) fn watcher_cursor(&self) -> u16 {
        match self.payload {
            Payload::Watcher { cursor, .. } => cursor,
            _ => 0,
        }
    }

    pub(crate) fn set_watcher_cursor(&mut self, cursor: u16) {
        if let Payload::Watcher { cursor: c, .. } = &mut self.payload {
            *c = cursor;
        }
    }
}

// ---------------------------------------------------------------------------
// In-task control context
// ---------------------------------------------------------------------------

/// What a task body requested of the dispatcher this invocation, for
/// whichever task its request ultimately targets (itself, in every case
/// below — see `TaskCtx::suspend_task`/`resume_task`/`kill_task` for
/// requests targeting a different task, which are not deferred at all).
///
/// Ranked so that if a body calls more than one self-targeted control
/// method, the highest-ranked request wins: `Close` > `Suspend` >
/// `Delay`/`Yield` > `Continue`. This reproduces the original flag word's
/// documented precedence without needing bit-mask arithmetic anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pending {
    Continue,
    /// Rebase `next_run_time` to "now" and re-dispatch as soon as possible.
    Yield { state: u16 },
    /// Advance `next_run_time` by `ticks` (masked to 8 bits) from wherever
    /// it currently sits.
    Delay { ticks: u8, state: u16 },
    Suspend { state: u16 },
    Close,
}

impl Pending {
    const fn rank(self) -> u8 {
        match self {
            Self::Continue => 0,
            Self::Yield { .. } | Self::Delay { .. } => 1,
            Self::Suspend { .. } => 2,
            Self::Close => 3,
        }
    }
}

/// Handed to a task body in place of direct scheduler ownership.
///
/// Holds a reborrow of the running [`Scheduler`] for the duration of the
/// call plus the handle of the task currently executing. This gives a task
/// body two distinct, non-overlapping ways to affect the schedule, matching
/// spec.md §4.6's Control API table exactly:
///
/// - **Self-targeted, always deferred**: `yield_now`, `delay`, `suspend`,
///   `listen_signal`, `close` record a request into `self.pending`/
///   `self.listen_signal`; the dispatcher applies it after the body returns
///   (§4.6's "In-task action" column, and the only sound way to mutate the
///   very slot currently executing).
/// - **Handle-targeted, either deferred or immediate**: `suspend_task`,
///   `resume_task`, `kill_task` take an explicit [`TaskHandle`]. If it names
///   the currently-executing task they fall back to the deferred form above;
///   otherwise they perform the same direct list surgery
///   [`Scheduler::suspend`]/[`Scheduler::resume`]/[`Scheduler::kill`] perform
///   when called from outside any task body — this is what spec.md §5's
///   re-entrancy clause requires ("control operations invoked on OTHER tasks
///   from inside a task body are also safe") and what the reference
///   implementation gets for free by exposing every `System_*` function as a
///   plain callable from anywhere.
///
/// `create_event`/`delete_event`/`set_event`/`get_event_signal`/
/// `add_periodic`/`add_oneshot`/`add_event_task` are plain pass-throughs to
/// the same-named `Scheduler` methods — those have no "self" concept at all,
/// so there is nothing to defer.
pub struct TaskCtx<'a, const TASKS: usize, const EVENTS: usize, const FIRE_Q: usize> {
    sched: &'a mut Scheduler<TASKS, EVENTS, FIRE_Q>,
    current: TaskHandle,
    kind: Option<TaskKind>,
    now: u32,
    pending: Pending,
    listen_signal: Option<u16>,
}

impl<'a, const TASKS: usize, const EVENTS: usize, const FIRE_Q: usize>
    TaskCtx<'a, TASKS, EVENTS, FIRE_Q>
{
    pub(crate) fn new(
        sched: &'a mut Scheduler<TASKS, EVENTS, FIRE_Q>,
        current: TaskHandle,
        now: u32,
    ) -> Self {
        let kind = sched.kind_of(current);
        Self {
            sched,
            current,
            kind,
            now,
            pending: Pending::Continue,
            listen_signal: None,
        }
    }

    fn set_pending(&mut self, candidate: Pending) -> bool {
        if candidate.rank() >= self.pending.rank() {
            self.pending = candidate;
        }
        true
    }

    // -- self-targeted, deferred ------------------------------------------

    /// Request an immediate re-dispatch, recording `next_state` for the
    /// following invocation. Valid for `Periodic`/`OneShot` only.
    pub fn yield_now(&mut self, next_state: u16) -> bool {
        if self.kind == Some(TaskKind::Event) {
            return false;
        }
        self.set_pending(Pending::Yield { state: next_state })
    }

    /// Request re-dispatch `ticks` (masked to 8 bits) ticks from now,
    /// recording `next_state`. Valid for every task kind.
    pub fn delay(&mut self, ticks: u16, next_state: u16) -> bool {
        self.set_pending(Pending::Delay {
            ticks: (ticks & 0xFF) as u8,
            state: next_state,
        })
    }

    /// Request that the currently-executing task be suspended, recording
    /// `next_state` for when it is resumed. Invalid for `OneShot` tasks — a
    /// one-shot has no "later". To suspend a *different* task, use
    /// [`TaskCtx::suspend_task`].
    pub fn suspend(&mut self, next_state: u16) -> bool {
        if self.kind == Some(TaskKind::OneShot) {
            return false;
        }
        self.set_pending(Pending::Suspend { state: next_state })
    }

    /// Rewrite which signal this event task listens for. `Event` tasks only;
    /// `new_signal` must be nonzero.
    pub fn listen_signal(&mut self, new_signal: u16) -> bool {
        if self.kind != Some(TaskKind::Event) || new_signal == 0 {
            return false;
        }
        self.listen_signal = Some(new_signal);
        true
    }

    /// Request that this task be killed once it returns. Always succeeds —
    /// matches the reference implementation, which applies no precondition
    /// to closing the current task. Equivalent to
    /// `self.kill_task(` the current handle `)`.
    pub fn close(&mut self) {
        self.set_pending(Pending::Close);
    }

    // -- handle-targeted: self falls back to deferred, other is immediate --

    /// Suspends `target`. Kind constraint (`not OneShot`) applies regardless
    /// of whether `target` is this task or another one. When `target` is the
    /// currently-executing task this is equivalent to
    /// [`TaskCtx::suspend`]`(next_state)`; otherwise it performs the same
    /// direct list surgery as [`Scheduler::suspend`].
    pub fn suspend_task(&mut self, target: TaskHandle, next_state: u16) -> Result<()> {
        if target == self.current {
            if self.kind == Some(TaskKind::OneShot) {
                return Err(Error::KindMismatch);
            }
            self.set_pending(Pending::Suspend { state: next_state });
            Ok(())
        } else {
            self.sched.suspend(target, next_state)
        }
    }

    /// Resumes `target`. Resuming the currently-executing task from inside
    /// its own body is invalid — spec.md §4.6 marks this cell "— (invalid
    /// from self)": a periodic task resuming itself mid-invocation would
    /// re-link it into the time queue while the dispatcher's own
    /// post-invocation bookkeeping tries to do the same, double-queuing it.
    /// Reported as `Error::KindMismatch` (no dedicated error kind exists for
    /// this case; see `DESIGN.md`). Resuming a different task performs the
    /// same re-scheduling [`Scheduler::resume`] does.
    pub fn resume_task(
        &mut self,
        target: TaskHandle,
        exec_state: u16,
        immediate: bool,
    ) -> Result<()> {
        if target == self.current {
            return Err(Error::KindMismatch);
        }
        self.sched.resume(target, exec_state, immediate, self.now)
    }

    /// Kills `target`. Self-targeted is equivalent to [`TaskCtx::close`]
    /// (always succeeds); targeting another task performs the same unlink
    /// `Scheduler::kill` does from outside any task body.
    pub fn kill_task(&mut self, target: TaskHandle) -> Result<()> {
        if target == self.current {
            self.set_pending(Pending::Close);
            Ok(())
        } else {
            self.sched.kill(target)
        }
    }

    // -- re-entrant event/task-table operations ---------------------------

    /// Allocates a new, currently-unpublished event. See [`Scheduler::create_event`].
    pub fn create_event(&mut self) -> Result<EventHandle> {
        self.sched.create_event()
    }

    /// Frees `event`. See [`Scheduler::delete_event`].
    pub fn delete_event(&mut self, event: EventHandle) -> Result<()> {
        self.sched.delete_event(event)
    }

    /// Publishes `signal`/`value` on `event`. See [`Scheduler::set_event`].
    pub fn set_event(&mut self, event: EventHandle, signal: u16, value: u32) -> Result<()> {
        self.sched.set_event(event, signal, value)
    }

    /// The signal `event` currently holds. See [`Scheduler::get_event_signal`].
    #[must_use]
    pub fn get_event_signal(&self, event: EventHandle) -> u16 {
        self.sched.get_event_signal(event)
    }

    /// Creates a new `Periodic` task. See [`Scheduler::add_periodic`].
    pub fn add_periodic(
        &mut self,
        body: TaskFn<TASKS, EVENTS, FIRE_Q>,
        interval: u32,
    ) -> Result<TaskHandle> {
        self.sched.add_periodic(body, interval, self.now)
    }

    /// Creates a new `OneShot` task. See [`Scheduler::add_oneshot`].
    pub fn add_oneshot(
        &mut self,
        body: TaskFn<TASKS, EVENTS, FIRE_Q>,
        interval: u32,
    ) -> Result<TaskHandle> {
        self.sched.add_oneshot(body, interval, self.now)
    }

    /// Subscribes a new `Event` task. See [`Scheduler::add_event_task`].
    pub fn add_event_task(
        &mut self,
        body: TaskFn<TASKS, EVENTS, FIRE_Q>,
        event: EventHandle,
        signal: u16,
    ) -> Result<TaskHandle> {
        self.sched.add_event_task(body, event, signal)
    }

    pub(crate) fn pending(&self) -> Pending {
        self.pending
    }

    pub(crate) fn take_listen_signal(&mut self) -> Option<u16> {
        self.listen_signal.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Ctx<'a> = TaskCtx<'a, 2, 0, 0>;

    fn new_ctx(sched: &mut Scheduler<2, 0, 0>, current: TaskHandle) -> Ctx<'_> {
        TaskCtx::new(sched, current, 0)
    }

    #[test]
    fn close_beats_everything() {
        let mut s: Scheduler<2, 0, 0> = Scheduler::new(0);
        let h = s.add_periodic(noop_periodic, 1, 0).unwrap();
        s.suspend(h, 0).ok();
        let mut ctx = new_ctx(&mut s, h);
        ctx.delay(5, 1);
        ctx.suspend(2);
        ctx.close();
        assert_eq!(ctx.pending(), Pending::Close);
    }

    #[test]
    fn suspend_beats_delay_but_not_close() {
        let mut s: Scheduler<2, 0, 0> = Scheduler::new(0);
        let h = s.add_periodic(noop_periodic, 1, 0).unwrap();
        let mut ctx = new_ctx(&mut s, h);
        ctx.delay(5, 1);
        ctx.suspend(2);
        assert_eq!(ctx.pending(), Pending::Suspend { state: 2 });
    }

    #[test]
    fn lower_rank_after_higher_is_ignored() {
        let mut s: Scheduler<2, 0, 0> = Scheduler::new(0);
        let h = s.add_periodic(noop_periodic, 1, 0).unwrap();
        let mut ctx = new_ctx(&mut s, h);
        ctx.close();
        ctx.delay(5, 1);
        assert_eq!(ctx.pending(), Pending::Close);
    }

    #[test]
    fn yield_rejected_for_event_tasks() {
        let mut s: Scheduler<2, 0, 0> = Scheduler::new(0);
        let h = s.add_periodic(noop_periodic, 1, 0).unwrap();
        let mut ctx = new_ctx(&mut s, h);
        ctx.kind = Some(TaskKind::Event);
        assert!(!ctx.yield_now(1));
        assert_eq!(ctx.pending(), Pending::Continue);
    }

    #[test]
    fn suspend_rejected_for_oneshot() {
        let mut s: Scheduler<2, 0, 0> = Scheduler::new(0);
        let h = s.add_oneshot(noop_oneshot, 1, 0).unwrap();
        let mut ctx = new_ctx(&mut s, h);
        assert!(!ctx.suspend(1));
    }

    #[test]
    fn listen_signal_requires_event_kind_and_nonzero() {
        let mut s: Scheduler<2, 0, 0> = Scheduler::new(0);
        let h = s.add_periodic(noop_periodic, 1, 0).unwrap();
        let mut ctx = new_ctx(&mut s, h);
        ctx.kind = Some(TaskKind::Event);
        assert!(!ctx.listen_signal(0));
        assert!(ctx.listen_signal(7));
        assert_eq!(ctx.take_listen_signal(), Some(7));
        assert_eq!(ctx.take_listen_signal(), None);
    }

    #[test]
    fn delay_ticks_masked_to_eight_bits() {
        let mut s: Scheduler<2, 0, 0> = Scheduler::new(0);
        let h = s.add_periodic(noop_periodic, 1, 0).unwrap();
        let mut ctx = new_ctx(&mut s, h);
        ctx.delay(0x1FF, 0);
        assert_eq!(ctx.pending(), Pending::Delay { ticks: 0xFF, state: 0 });
    }

    #[test]
    fn resume_targeting_self_is_rejected() {
        let mut s: Scheduler<2, 0, 0> = Scheduler::new(0);
        let h = s.add_periodic(noop_periodic, 1, 0).unwrap();
        let mut ctx = new_ctx(&mut s, h);
        assert_eq!(ctx.resume_task(h, 0, true), Err(Error::KindMismatch));
    }

    #[test]
    fn kill_task_targeting_self_defers_like_close() {
        let mut s: Scheduler<2, 0, 0> = Scheduler::new(0);
        let h = s.add_periodic(noop_periodic, 1, 0).unwrap();
        let mut ctx = new_ctx(&mut s, h);
        assert!(ctx.kill_task(h).is_ok());
        assert_eq!(ctx.pending(), Pending::Close);
    }

    fn noop_periodic(_count: u32, _state: u16, _ctx: &mut TaskCtx<'_, 2, 0, 0>) {}
    fn noop_oneshot(_v: u32, _state: u16, _ctx: &mut TaskCtx<'_, 2, 0, 0>) {}
}
