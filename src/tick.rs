//! Tick comparison helpers.
//!
//! The host's tick counter is a free-running `u32` that wraps. Every deadline
//! comparison in the scheduler goes through [`ge`] rather than `>=` directly,
//! so the wraparound handling lives in exactly one place.

/// `now >= deadline`, tolerant of one `u32` wraparound.
///
/// Correct as long as `now` and `deadline` are within half the counter's
/// range of each other — true for any deadline scheduled less than
/// `u32::MAX / 2` ticks in the future, which covers every realistic
/// `interval`/`delay` value here (delays are masked to 8 bits; intervals are
/// a `u32` but a scheduler with a pending deadline further out than ~2^31
/// ticks has bigger problems than this comparison).
#[inline]
#[must_use]
pub const fn ge(now: u32, deadline: u32) -> bool {
    now.wrapping_sub(deadline) < 0x8000_0000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_comparisons() {
        assert!(ge(10, 10));
        assert!(ge(11, 10));
        assert!(!ge(9, 10));
    }

    #[test]
    fn tolerates_wraparound() {
        // now has wrapped past u32::MAX, deadline was set just before the wrap.
        let deadline = u32::MAX - 2;
        let now = 5u32; // wrapped: u32::MAX-2, -1, 0, 1, ..., 5
        assert!(ge(now, deadline));
        assert!(!ge(u32::MAX - 3, deadline));
    }

    #[test]
    fn half_range_boundary() {
        let deadline = 0u32;
        assert!(ge(0x7FFF_FFFF, deadline));
        assert!(!ge(0x8000_0000, deadline));
    }
}
