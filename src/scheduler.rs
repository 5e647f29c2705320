//! The dispatcher.
//!
//! ```text
//!            ┌─────────────────────────────────────────────┐
//!            │               run_step(now)                  │
//!            │                                               │
//!            │  Phase A — events        Phase B — time       │
//!            │  drain fire queue   →    pop due head,         │
//!            │  walk subscribers,       dispatch Periodic /   │
//!            │  deliver matching        OneShot / watcher,    │
//!            │  signals                 else idle/sleep hook  │
//!            └─────────────────────────────────────────────┘
//! ```
//!
//! [`Scheduler`] owns every task and event slot inline (no heap, no
//! `'static` statics) and is driven one tick at a time by
//! [`Scheduler::run_step`] or continuously by [`Scheduler::start_loop`]. All
//! three capacities are const generics so a host picks its memory footprint
//! at the call site.

use heapless::Vec;

use crate::error::{Error, Result};
use crate::event::{EventHandle, EventSlot};
use crate::task::{Payload, Pending, TaskCtx, TaskFn, TaskHandle, TaskKind, TaskSlot, END};
use crate::tick;

/// A cooperative, tick-driven scheduler over `TASKS` task slots, `EVENTS`
/// event slots, and a fire queue of `FIRE_Q` entries.
///
/// When `EVENTS > 0`, slot `0` of the task table is reserved for an
/// internal delay-watcher task (see [`Scheduler::dispatch_watcher`]) and is
/// never handed out by `add_periodic`/`add_oneshot`/`add_event_task`.
pub struct Scheduler<const TASKS: usize, const EVENTS: usize, const FIRE_Q: usize> {
    tasks: [TaskSlot<TASKS, EVENTS, FIRE_Q>; TASKS],
    /// Head of the time-ordered singly linked list over `tasks[..].next`.
    time_head: u16,
    events: [EventSlot; EVENTS],
    /// De-duplicated list of event indices awaiting Phase A, in publication order.
    fire_queue: Vec<u16, FIRE_Q>,
    looping: bool,
    last_idle_tick: u32,
    idle_hook: Option<fn(u32, u32)>,
    sleep_hook: Option<fn()>,
    watcher: Option<TaskHandle>,
}

impl<const TASKS: usize, const EVENTS: usize, const FIRE_Q: usize> Scheduler<TASKS, EVENTS, FIRE_Q> {
    /// Builds an empty scheduler. `now` seeds the delay-watcher's first
    /// deadline and the idle-hook's "last tick" baseline.
    ///
    /// # Panics
    /// Panics if `TASKS == 0`, or if `EVENTS > 0` and there isn't at least
    /// one task slot left over for user tasks after the watcher reservation,
    /// or if `EVENTS > 0` and `FIRE_Q == 0`.
    #[must_use]
    pub fn new(now: u32) -> Self {
        assert!(TASKS >= 1, "a scheduler needs at least one task slot");
        let mut tasks: [TaskSlot<TASKS, EVENTS, FIRE_Q>; TASKS] = [TaskSlot::free(); TASKS];
        let watcher = if EVENTS > 0 {
            assert!(
                TASKS >= 2,
                "one task slot is reserved for the event delay-watcher when events are enabled"
            );
            assert!(
                FIRE_Q >= 1,
                "the fire queue needs capacity when events are enabled"
            );
            tasks[0] = TaskSlot {
                next: END,
                exec_state: 0,
                body: None,
                payload: Payload::Watcher {
                    next_run_time: now.wrapping_add(1),
                    cursor: 0,
                },
            };
            Some(TaskHandle(0))
        } else {
            None
        };
        let mut scheduler = Self {
            tasks,
            time_head: END,
            events: [EventSlot::disabled(); EVENTS],
            fire_queue: Vec::new(),
            looping: false,
            last_idle_tick: now,
            idle_hook: None,
            sleep_hook: None,
            watcher,
        };
        if scheduler.watcher.is_some() {
            scheduler.link_time_task(0);
        }
        scheduler
    }

    // -- registration ---------------------------------------------------

    /// Registers the hook invoked whenever Phase B finds nothing due.
    /// Receives `(now, last_idle_tick)`.
    pub fn register_idle(&mut self, hook: fn(u32, u32)) {
        self.idle_hook = Some(hook);
    }

    /// Registers a fallback invoked in place of the idle hook when none is
    /// registered. Only meaningful with events enabled — without a
    /// delay-watcher occupying the time queue, an idle scheduler with no
    /// user tasks left would sleep forever and never wake to re-check.
    pub fn set_sleep_hook(&mut self, hook: fn()) {
        debug_assert!(
            EVENTS > 0,
            "a sleep hook with no delay-watcher task to requeue work is very likely a bug"
        );
        self.sleep_hook = Some(hook);
    }

    // -- task creation ----------------------------------------------------

    /// Creates a `Periodic` task, first due at `now + interval`.
    pub fn add_periodic(
        &mut self,
        body: TaskFn<TASKS, EVENTS, FIRE_Q>,
        interval: u32,
        now: u32,
    ) -> Result<TaskHandle> {
        let idx = self.allocate_slot().ok_or(Error::Full)?;
        self.tasks[idx] = TaskSlot {
            next: END,
            exec_state: 0,
            body: Some(body),
            payload: Payload::Periodic {
                interval,
                next_run_time: now.wrapping_add(interval),
                count: 0,
            },
        };
        self.link_time_task(idx as u16);
        log::debug!("cotask: periodic task allocated at slot {idx}, interval {interval}");
        Ok(TaskHandle(idx as u16))
    }

    /// Creates a `OneShot` task, due at `now + interval`, freed after its
    /// single invocation unless it requests `Yield`/`Delay`.
    pub fn add_oneshot(
        &mut self,
        body: TaskFn<TASKS, EVENTS, FIRE_Q>,
        interval: u32,
        now: u32,
    ) -> Result<TaskHandle> {
        let idx = self.allocate_slot().ok_or(Error::Full)?;
        self.tasks[idx] = TaskSlot {
            next: END,
            exec_state: 0,
            body: Some(body),
            payload: Payload::OneShot {
                next_run_time: now.wrapping_add(interval),
            },
        };
        self.link_time_task(idx as u16);
        Ok(TaskHandle(idx as u16))
    }

    /// Subscribes a new `Event` task to `event`, listening for `signal`.
    ///
    /// Returns `Err(Error::InvalidHandle)` for a zero signal or an invalid
    /// event — like the reference scheduler, the two causes aren't
    /// distinguished in the return value.
    pub fn add_event_task(
        &mut self,
        body: TaskFn<TASKS, EVENTS, FIRE_Q>,
        event: EventHandle,
        signal: u16,
    ) -> Result<TaskHandle> {
        if signal == 0 || !self.event_is_valid(event) {
            return Err(Error::InvalidHandle);
        }
        let idx = self.allocate_slot().ok_or(Error::Full)?;
        self.tasks[idx] = TaskSlot {
            next: END,
            exec_state: 0,
            body: Some(body),
            payload: Payload::Event {
                event: event.0,
                signal,
                suspended: false,
                delay_until: 0,
            },
        };
        self.append_subscriber(event.0, idx as u16);
        Ok(TaskHandle(idx as u16))
    }

    fn allocate_slot(&self) -> Option<usize> {
        let floor = usize::from(self.watcher.is_some());
        (floor..TASKS).rev().find(|&i| self.tasks[i].is_free())
    }

    // -- out-of-task control ---------------------------------------------

    /// Suspends `task`. `Periodic`/`Event` only; `OneShot` has no "later" to
    /// resume into.
    pub fn suspend(&mut self, task: TaskHandle, next_state: u16) -> Result<()> {
        if !self.task_is_valid(task) {
            return Err(Error::InvalidHandle);
        }
        let idx = task.index();
        match self.tasks[idx].kind() {
            Some(TaskKind::OneShot) => Err(Error::KindMismatch),
            Some(TaskKind::Event) => {
                self.tasks[idx].set_suspended(true);
                Ok(())
            }
            Some(TaskKind::Periodic) => {
                if !self.unlink_time_task(idx as u16) {
                    return Err(Error::NotPresent);
                }
                self.tasks[idx].next = END;
                self.tasks[idx].exec_state = next_state;
                Ok(())
            }
            None => Err(Error::InvalidHandle),
        }
    }

    /// Resumes `task`. For `Periodic`, `immediate` re-dispatches at `now`
    /// rather than `now + interval`.
    pub fn resume(
        &mut self,
        task: TaskHandle,
        exec_state: u16,
        immediate: bool,
        now: u32,
    ) -> Result<()> {
        if !self.task_is_valid(task) {
            return Err(Error::InvalidHandle);
        }
        let idx = task.index();
        match self.tasks[idx].kind() {
            Some(TaskKind::OneShot) => Err(Error::KindMismatch),
            Some(TaskKind::Event) => {
                self.tasks[idx].set_suspended(false);
                Ok(())
            }
            Some(TaskKind::Periodic) => {
                self.tasks[idx].exec_state = exec_state;
                let delta = if immediate { 0 } else { self.tasks[idx].interval() };
                self.tasks[idx].set_next_run_time(now.wrapping_add(delta));
                self.link_time_task(idx as u16);
                Ok(())
            }
            None => Err(Error::InvalidHandle),
        }
    }

    /// Kills `task` from outside its own body.
    ///
    /// Returns `Err(Error::NotPresent)` for a `Periodic`/`OneShot` task
    /// that's valid but not currently queued (e.g. suspended) without
    /// freeing its slot, and likewise for an `Event` task not currently
    /// chained to its event — preserved from the reference behavior per an
    /// explicit design decision (see `DESIGN.md`).
    pub fn kill(&mut self, task: TaskHandle) -> Result<()> {
        if !self.task_is_valid(task) {
            return Err(Error::InvalidHandle);
        }
        let idx = task.index();
        match self.tasks[idx].kind() {
            Some(TaskKind::Periodic | TaskKind::OneShot) => {
                if !self.unlink_time_task(idx as u16) {
                    return Err(Error::NotPresent);
                }
                self.tasks[idx].clear();
                Ok(())
            }
            Some(TaskKind::Event) => {
                let event_idx = self.tasks[idx].event_ref();
                if self.unlink_event_task(event_idx, idx as u16) {
                    Ok(())
                } else {
                    Err(Error::NotPresent)
                }
            }
            None => Err(Error::InvalidHandle),
        }
    }

    // -- events ------------------------------------------------------------

    /// Allocates a new, currently-unpublished event.
    pub fn create_event(&mut self) -> Result<EventHandle> {
        for i in 0..EVENTS {
            if !self.events[i].enabled {
                self.events[i] = EventSlot::disabled();
                self.events[i].enabled = true;
                return Ok(EventHandle(i as u16));
            }
        }
        Err(Error::Full)
    }

    /// Frees `event`. Refuses while any task still subscribes to it.
    pub fn delete_event(&mut self, event: EventHandle) -> Result<()> {
        if !self.event_is_valid(event) {
            return Err(Error::InvalidHandle);
        }
        let idx = event.index();
        if self.events[idx].sub_head != END {
            return Err(Error::HasSubscribers);
        }
        self.events[idx].enabled = false;
        Ok(())
    }

    /// Publishes `signal`/`value` on `event`, enqueuing it for the next
    /// Phase A. Rejects a republish of the signal the event already holds
    /// undelivered — callers must drain with a tick before setting it again.
    pub fn set_event(&mut self, event: EventHandle, signal: u16, value: u32) -> Result<()> {
        if !self.event_is_valid(event) || signal == 0 {
            return Err(Error::InvalidHandle);
        }
        let idx = event.index();
        if self.events[idx].signal == signal {
            return Err(Error::DuplicateSignal);
        }
        // Enqueue before committing signal/value: a `Full` fire queue must
        // fail without mutating the event at all, not leave it holding a
        // signal nothing will ever deliver.
        self.enqueue_fire(idx as u16)?;
        self.events[idx].signal = signal;
        self.events[idx].value = value;
        Ok(())
    }

    /// The signal `event` currently holds, or `0` if none is pending or the
    /// handle is out of range. Like the reference implementation, this
    /// reads the field directly rather than validating the handle.
    #[must_use]
    pub fn get_event_signal(&self, event: EventHandle) -> u16 {
        self.events.get(event.index()).map_or(0, |e| e.signal)
    }

    fn enqueue_fire(&mut self, event_idx: u16) -> Result<()> {
        if self.fire_queue.contains(&event_idx) {
            return Ok(());
        }
        self.fire_queue.push(event_idx).map_err(|_| {
            log::warn!("cotask: fire queue full, dropping publish for event {event_idx}");
            Error::Full
        })
    }

    fn append_subscriber(&mut self, event_idx: u16, task_idx: u16) {
        let ev = event_idx as usize;
        if self.events[ev].sub_head == END {
            self.events[ev].sub_head = task_idx;
            return;
        }
        let mut cursor = self.events[ev].sub_head;
        while self.tasks[cursor as usize].next != END {
            cursor = self.tasks[cursor as usize].next;
        }
        self.tasks[cursor as usize].next = task_idx;
    }

    /// Removes `task_idx` from `event_idx`'s subscriber chain, re-searching
    /// from the chain head regardless of where in a walk the caller is —
    /// mirrors the reference implementation, which never threads a `prev`
    /// pointer through its own subscriber walk either.
    fn unlink_event_task(&mut self, event_idx: u16, task_idx: u16) -> bool {
        let ev = event_idx as usize;
        if self.events[ev].sub_head == task_idx {
            self.events[ev].sub_head = self.tasks[task_idx as usize].next;
            self.tasks[task_idx as usize].clear();
            return true;
        }
        let mut cursor = self.events[ev].sub_head;
        while cursor != END {
            if self.tasks[cursor as usize].next == task_idx {
                self.tasks[cursor as usize].next = self.tasks[task_idx as usize].next;
                self.tasks[task_idx as usize].clear();
                return true;
            }
            cursor = self.tasks[cursor as usize].next;
        }
        false
    }

    // -- time queue ----------------------------------------------------

    /// Inserts `idx` into the time queue, ordered by its deadline. Ties are
    /// appended after existing equal deadlines (stable).
    fn link_time_task(&mut self, idx: u16) {
        let new_time = self.tasks[idx as usize].next_run_time();
        let mut prev = END;
        let mut cursor = self.time_head;
        while cursor != END && tick::ge(new_time, self.tasks[cursor as usize].next_run_time()) {
            prev = cursor;
            cursor = self.tasks[cursor as usize].next;
        }
        if prev == END {
            self.tasks[idx as usize].next = self.time_head;
            self.time_head = idx;
        } else {
            self.tasks[idx as usize].next = cursor;
            self.tasks[prev as usize].next = idx;
        }
    }

    /// Removes `idx` from the time queue wherever it sits, head included —
    /// unlike the reference implementation's shared unlink helper, which
    /// mishandles removing the current list head (see `DESIGN.md`).
    fn unlink_time_task(&mut self, idx: u16) -> bool {
        if self.time_head == idx {
            self.time_head = self.tasks[idx as usize].next;
            return true;
        }
        let mut cursor = self.time_head;
        while cursor != END {
            if self.tasks[cursor as usize].next == idx {
                self.tasks[cursor as usize].next = self.tasks[idx as usize].next;
                return true;
            }
            cursor = self.tasks[cursor as usize].next;
        }
        false
    }

    // -- validation ----------------------------------------------------

    fn task_is_valid(&self, h: TaskHandle) -> bool {
        let idx = h.index();
        idx < TASKS && !self.tasks[idx].is_free()
    }

    fn event_is_valid(&self, h: EventHandle) -> bool {
        let idx = h.index();
        idx < EVENTS && self.events[idx].enabled
    }

    /// The kind of the task `h` names, or `None` if `h` is out of range or
    /// free. Used by [`TaskCtx::new`](crate::task::TaskCtx) to know which
    /// self-targeted operations are valid for the currently-executing task
    /// without needing to duplicate slot layout knowledge in `task.rs`.
    pub(crate) fn kind_of(&self, h: TaskHandle) -> Option<TaskKind> {
        let idx = h.index();
        if idx < TASKS {
            self.tasks[idx].kind()
        } else {
            None
        }
    }

    // -- driving the loop ----------------------------------------------------

    /// Runs one tick: Phase A (event delivery) then Phase B (time dispatch).
    pub fn run_step(&mut self, now: u32) {
        self.drain_fire_queue(now);
        self.dispatch_time_phase(now);
    }

    /// Calls `run_step` with `now_fn()` until [`Scheduler::end_loop`] is called.
    /// A no-op if already looping.
    pub fn start_loop(&mut self, mut now_fn: impl FnMut() -> u32) {
        if self.looping {
            return;
        }
        self.looping = true;
        self.last_idle_tick = now_fn();
        while self.looping {
            let now = now_fn();
            self.run_step(now);
        }
    }

    /// Stops a `run` loop after its current iteration.
    pub fn end_loop(&mut self) {
        self.looping = false;
    }

    #[must_use]
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    // -- Phase A: events ----------------------------------------------------

    fn drain_fire_queue(&mut self, now: u32) {
        for i in 0..self.fire_queue.len() {
            let event_idx = self.fire_queue[i];
            self.deliver_event(event_idx, now);
        }
        self.fire_queue.clear();
    }

    fn deliver_event(&mut self, event_idx: u16, now: u32) {
        let ev = event_idx as usize;
        let signal = self.events[ev].signal;
        let value = self.events[ev].value;
        let mut cursor = self.events[ev].sub_head;
        while cursor != END {
            let ti = cursor;
            // Captured before the invocation below can free or relink `ti`.
            let next = self.tasks[ti as usize].next;
            let runnable = !self.tasks[ti as usize].is_suspended()
                && self.tasks[ti as usize].delay_until() == 0
                && self.tasks[ti as usize].signal() == signal;
            if runnable {
                self.invoke_event_task(ti, value, signal, now, event_idx);
            }
            cursor = next;
        }
        self.events[ev].signal = 0;
    }

    fn invoke_event_task(&mut self, ti: u16, value: u32, signal: u16, now: u32, event_idx: u16) {
        let idx = ti as usize;
        let body = self.tasks[idx].body;
        let mut ctx = TaskCtx::new(self, TaskHandle(ti), now);
        if let Some(f) = body {
            f(value, signal, &mut ctx);
        }
        let new_signal = ctx.take_listen_signal();
        let pending = ctx.pending();
        if let Some(new_signal) = new_signal {
            self.tasks[idx].set_signal(new_signal);
        }
        match pending {
            Pending::Close => {
                self.unlink_event_task(event_idx, ti);
            }
            Pending::Suspend { state } => {
                self.tasks[idx].exec_state = state;
                self.tasks[idx].set_suspended(true);
            }
            Pending::Delay { ticks, state } => {
                self.tasks[idx].exec_state = state;
                self.tasks[idx].set_delay_until(now.wrapping_add(u32::from(ticks)));
            }
            Pending::Yield { .. } | Pending::Continue => {}
        }
    }

    // -- Phase B: time ----------------------------------------------------

    fn run_idle_or_sleep(&mut self, now: u32) {
        if let Some(hook) = self.idle_hook {
            hook(now, self.last_idle_tick);
            self.last_idle_tick = now;
        } else if let Some(sleep) = self.sleep_hook {
            sleep();
        }
    }

    fn dispatch_time_phase(&mut self, now: u32) {
        if self.time_head == END {
            self.run_idle_or_sleep(now);
            return;
        }
        let idx = self.time_head;
        let deadline = self.tasks[idx as usize].next_run_time();
        if !tick::ge(now, deadline) {
            self.run_idle_or_sleep(now);
            return;
        }
        self.time_head = self.tasks[idx as usize].next;
        match self.tasks[idx as usize].payload {
            Payload::Watcher { .. } => self.dispatch_watcher(idx, now),
            Payload::Periodic { .. } => self.dispatch_periodic(idx, now),
            Payload::OneShot { .. } => self.dispatch_oneshot(idx, now),
            Payload::Free | Payload::Event { .. } => unreachable!(
                "only Periodic/OneShot/Watcher slots are ever linked into the time queue"
            ),
        }
    }

    fn dispatch_periodic(&mut self, idx: u16, now: u32) {
        let i = idx as usize;
        let count = self.tasks[i].count();
        let exec_state = self.tasks[i].exec_state;
        let body = self.tasks[i].body;
        let mut ctx = TaskCtx::new(self, TaskHandle(idx), now);
        if let Some(f) = body {
            f(count, exec_state, &mut ctx);
        }
        let pending = ctx.pending();
        match pending {
            Pending::Close => self.tasks[i].clear(),
            Pending::Suspend { state } => {
                // Already popped off the time queue; leaving it unlinked is the suspension.
                self.tasks[i].exec_state = state;
            }
            Pending::Yield { state } => {
                self.tasks[i].exec_state = state;
                self.tasks[i].set_next_run_time(now);
                self.link_time_task(idx);
            }
            Pending::Delay { ticks, state } => {
                self.tasks[i].exec_state = state;
                let rebased = self.tasks[i].next_run_time().wrapping_add(u32::from(ticks));
                self.tasks[i].set_next_run_time(rebased);
                self.link_time_task(idx);
            }
            Pending::Continue => {
                self.tasks[i].exec_state = 0;
                self.tasks[i].increment_count();
                let next = self.tasks[i]
                    .next_run_time()
                    .wrapping_add(self.tasks[i].interval());
                self.tasks[i].set_next_run_time(next);
                self.link_time_task(idx);
            }
        }
    }

    fn dispatch_oneshot(&mut self, idx: u16, now: u32) {
        let i = idx as usize;
        let exec_state = self.tasks[i].exec_state;
        let body = self.tasks[i].body;
        let mut ctx = TaskCtx::new(self, TaskHandle(idx), now);
        if let Some(f) = body {
            f(0, exec_state, &mut ctx);
        }
        let pending = ctx.pending();
        match pending {
            Pending::Yield { state } => {
                self.tasks[i].exec_state = state;
                self.tasks[i].set_next_run_time(now);
                self.link_time_task(idx);
            }
            Pending::Delay { ticks, state } => {
                self.tasks[i].exec_state = state;
                let rebased = self.tasks[i].next_run_time().wrapping_add(u32::from(ticks));
                self.tasks[i].set_next_run_time(rebased);
                self.link_time_task(idx);
            }
            // Close, Suspend (rejected for OneShot at the TaskCtx layer and so
            // never actually observed here), and Continue all end the same
            // way: a one-shot with nothing further to do is freed.
            Pending::Continue | Pending::Close | Pending::Suspend { .. } => {
                self.tasks[i].clear();
            }
        }
    }

    /// The reserved delay-watcher: on each tick, resumes scanning the event
    /// table from its stored cursor for the first `Event` task whose
    /// `delay_until` has passed, services exactly one, and yields
    /// immediately recording where to resume — so a tick with many delayed
    /// wakeups is spread across many ticks rather than serviced in one
    /// unbounded pass. A full sweep with nothing due resets the cursor and
    /// re-arms for the next tick.
    fn dispatch_watcher(&mut self, idx: u16, now: u32) {
        let i = idx as usize;
        let start = self.tasks[i].watcher_cursor() as usize;
        let mut served = None;
        let mut ei = start;
        'scan: while ei < EVENTS {
            if self.events[ei].enabled {
                let mut ti = self.events[ei].sub_head;
                while ti != END {
                    let due = self.tasks[ti as usize].delay_until() != 0
                        && tick::ge(now, self.tasks[ti as usize].delay_until());
                    if due {
                        served = Some((ei, ti));
                        break 'scan;
                    }
                    ti = self.tasks[ti as usize].next;
                }
            }
            ei += 1;
        }
        match served {
            Some((resume_at, ti)) => {
                self.service_delayed_event_task(ti, now);
                self.tasks[i].set_watcher_cursor(resume_at as u16);
                self.tasks[i].set_next_run_time(now);
            }
            None => {
                self.tasks[i].set_watcher_cursor(0);
                let next = self.tasks[i].next_run_time().wrapping_add(1);
                self.tasks[i].set_next_run_time(next);
            }
        }
        self.link_time_task(idx);
    }

    fn service_delayed_event_task(&mut self, ti: u16, now: u32) {
        let idx = ti as usize;
        let event_idx = self.tasks[idx].event_ref();
        let body = self.tasks[idx].body;
        let mut ctx = TaskCtx::new(self, TaskHandle(ti), now);
        if let Some(f) = body {
            f(0, 0, &mut ctx);
        }
        let new_signal = ctx.take_listen_signal();
        let pending = ctx.pending();
        // Cleared unconditionally first; a fresh `Delay` request below can
        // immediately re-arm it.
        self.tasks[idx].set_delay_until(0);
        if let Some(new_signal) = new_signal {
            self.tasks[idx].set_signal(new_signal);
        }
        match pending {
            Pending::Close => {
                self.unlink_event_task(event_idx, ti);
            }
            Pending::Suspend { state } => {
                self.tasks[idx].exec_state = state;
                self.tasks[idx].set_suspended(true);
            }
            Pending::Delay { ticks, state } => {
                self.tasks[idx].exec_state = state;
                self.tasks[idx].set_delay_until(now.wrapping_add(u32::from(ticks)));
            }
            Pending::Yield { .. } | Pending::Continue => {}
        }
    }
}
