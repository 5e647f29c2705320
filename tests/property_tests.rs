//! Black-box property tests (P4, P6, P7 from the design doc).
//!
//! P1–P3 need access to the scheduler's private lists to check directly and
//! live as unit tests inside `src/scheduler.rs`; everything here only
//! touches the public API, matching the teacher's `tests/property_tests.rs`
//! convention of exercising a crate from outside with `proptest`.

use core::cell::RefCell;
use cotask::{Error, Scheduler, TaskCtx};
use proptest::prelude::*;

thread_local! {
    static TRACE: RefCell<Vec<(u32, u32, u16)>> = const { RefCell::new(Vec::new()) };
}

fn reset_trace() {
    TRACE.with(|t| t.borrow_mut().clear());
}

fn trace_snapshot() -> Vec<(u32, u32, u16)> {
    TRACE.with(|t| t.borrow().clone())
}

fn recording_body<const T: usize, const E: usize, const F: usize>(
    count: u32,
    state: u16,
    _ctx: &mut TaskCtx<'_, T, E, F>,
) {
    TRACE.with(|t| t.borrow_mut().push((0, count, state)));
}

// ── P7: deterministic replay ───────────────────────────────────────────
//
// The same trace of operations driven by the same tick sequence must
// produce the same sequence of invocations every time — there is no hidden
// state (no RNG, no wall clock, no `static`) that could make two runs
// diverge.

fn run_trace(intervals: &[u32], ticks: &[u32]) -> Vec<(u32, u32, u16)> {
    reset_trace();
    let mut s: Scheduler<9, 0, 0> = Scheduler::new(0);
    for &interval in intervals {
        // `interval` of 0 would fire every tick forever; keep it >= 1.
        s.add_periodic(recording_body, interval.max(1), 0).unwrap();
    }
    for &t in ticks {
        s.run_step(t);
    }
    trace_snapshot()
}

proptest! {
    #[test]
    fn p7_same_trace_same_output(
        intervals in proptest::collection::vec(1u32..=20, 1..=5),
        ticks in proptest::collection::vec(0u32..=50, 1..=40),
    ) {
        let sorted_ticks: Vec<u32> = {
            let mut t = ticks.clone();
            t.sort_unstable();
            t
        };
        let first = run_trace(&intervals, &sorted_ticks);
        let second = run_trace(&intervals, &sorted_ticks);
        prop_assert_eq!(first, second);
    }
}

// ── P6: round-trip create-then-kill-all ────────────────────────────────
//
// After creating N tasks and killing every one of them, the scheduler must
// behave exactly as it did right after `new()` — in particular, full
// capacity must be available again and a freshly added task must fire on
// the same schedule a brand-new scheduler would give it.

proptest! {
    #[test]
    fn p6_create_then_kill_all_restores_fresh_behavior(
        n in 1usize..=4,
    ) {
        let mut s: Scheduler<4, 0, 0> = Scheduler::new(0);
        let mut handles = Vec::new();
        for _ in 0..n {
            handles.push(s.add_periodic(recording_body, 3, 0).unwrap());
        }
        // Table is full now (n == capacity in the n == 4 case); further
        // allocation must fail until something is freed.
        if n == 4 {
            prop_assert_eq!(s.add_periodic(recording_body, 1, 0), Err(Error::Full));
        }
        for h in handles {
            prop_assert!(s.kill(h).is_ok());
        }

        // Fresh capacity: all four slots must be allocatable again.
        let mut fresh_handles = Vec::new();
        for _ in 0..4 {
            fresh_handles.push(s.add_periodic(recording_body, 1, 0).unwrap());
        }
        prop_assert_eq!(s.add_periodic(recording_body, 1, 0), Err(Error::Full));

        // And a fresh scheduler given the identical setup fires identically.
        reset_trace();
        let mut baseline: Scheduler<4, 0, 0> = Scheduler::new(0);
        for _ in 0..4 {
            baseline.add_periodic(recording_body, 1, 0).unwrap();
        }
        let mut baseline_trace = Vec::new();
        for t in 1..=3u32 {
            baseline.run_step(t);
            baseline_trace.push(trace_snapshot());
        }

        reset_trace();
        let mut reused_trace = Vec::new();
        for t in 1..=3u32 {
            s.run_step(t);
            reused_trace.push(trace_snapshot());
        }
        prop_assert_eq!(baseline_trace, reused_trace);
    }
}

// ── P4: fire queue has no duplicates and is never exceeded ─────────────

fn noop_body<const T: usize, const E: usize, const F: usize>(
    _v: u32,
    _sig: u16,
    _ctx: &mut TaskCtx<'_, T, E, F>,
) {
}

proptest! {
    #[test]
    fn p4_fire_queue_never_duplicates_or_overflows(
        signals in proptest::collection::vec(1u16..=3, 1..=10),
    ) {
        // FIRE_Q == 2 but up to 3 distinct events may be published in one
        // pass below, so this also exercises the `Full` rejection path.
        let mut s: Scheduler<4, 3, 2> = Scheduler::new(0);
        let events: Vec<_> = (0..3).map(|_| s.create_event().unwrap()).collect();
        for (i, ev) in events.iter().enumerate() {
            s.add_event_task(noop_body, *ev, (i + 1) as u16).unwrap();
        }

        let mut published = std::collections::HashSet::new();
        for &sig in &signals {
            let ev = events[(sig - 1) as usize];
            match s.set_event(ev, sig, u32::from(sig)) {
                Ok(()) => {
                    published.insert(sig);
                }
                Err(Error::DuplicateSignal) => {
                    // Already holds this exact signal undelivered — fine.
                }
                Err(Error::Full) => {
                    // Fire queue capacity (2) exceeded by distinct events
                    // this round — also fine, never a panic.
                }
                Err(other) => prop_assert!(false, "unexpected error: {other:?}"),
            }
        }
        prop_assert!(published.len() <= 3);

        // Draining never panics regardless of how full the queue got, and
        // every event is republishable afterward.
        s.run_step(0);
        for ev in &events {
            prop_assert_eq!(s.get_event_signal(*ev), 0);
        }
    }
}
