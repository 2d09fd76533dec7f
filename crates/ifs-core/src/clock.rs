//! Fixed-tick time quantization.
//!
//! Simulated time arrives in arbitrary amounts (animation frames, fast
//! forward, replay). [`TimeAdvancer`] turns it into a whole number of fixed
//! ticks and carries the remainder over, so feeding 2.0 seconds at once or
//! 0.1 seconds twenty times runs exactly the same ticks in the same order.
//!
//! # Design Principles
//!
//! - A partial tick is never processed. The leftover stays in the
//!   accumulator for the next call.
//! - A small tolerance absorbs floating error so that five feeds of 0.1
//!   complete a 0.5 second tick.
//! - Due ticks come from one floor division, so a huge feed costs the same
//!   as a small one. The count saturates at `u64::MAX`; callers that run
//!   the ticks bound it first (see `time.max_ticks_per_advance`).
//! - The tick counter uses saturating arithmetic.

/// Slack allowed when deciding whether a tick has fully accumulated.
const TICK_TOLERANCE: f64 = 1e-9;

/// Accumulates fed time and hands out whole ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAdvancer {
    tick_seconds: f64,
    accumulator: f64,
    ticks: u64,
}

impl TimeAdvancer {
    /// Create an advancer with the given tick length.
    pub const fn new(tick_seconds: f64) -> Self {
        Self {
            tick_seconds,
            accumulator: 0.0,
            ticks: 0,
        }
    }

    /// Simulated seconds per tick.
    pub const fn tick_seconds(&self) -> f64 {
        self.tick_seconds
    }

    /// Feed simulated time. Returns how many full ticks are now due.
    ///
    /// Negative and non-finite amounts are ignored.
    pub fn feed(&mut self, delta: f64) -> u64 {
        let (due, remainder) = self.split(delta);
        self.accumulator = remainder;
        due
    }

    /// Ticks that feeding `delta` would make due, without feeding it.
    pub fn due_after(&self, delta: f64) -> u64 {
        self.split(delta).0
    }

    fn split(&self, delta: f64) -> (u64, f64) {
        let mut total = self.accumulator;
        if delta.is_finite() && delta > 0.0 {
            total += delta;
        }
        if !total.is_finite() {
            return (u64::MAX, 0.0);
        }
        let whole = ((total + TICK_TOLERANCE) / self.tick_seconds).floor();
        if whole < 1.0 {
            return (0, total.max(0.0));
        }
        // Rounding of `whole * tick_seconds` at large magnitudes can leave a
        // remainder outside `[0, tick)`; that is noise, not a pending tick.
        let remainder = whole.mul_add(-self.tick_seconds, total);
        let remainder = if (0.0..self.tick_seconds).contains(&remainder) {
            remainder
        } else {
            0.0
        };
        (whole_ticks(whole), remainder)
    }

    /// Count one processed tick. Returns the new tick number.
    pub const fn record_tick(&mut self) -> u64 {
        self.ticks = self.ticks.saturating_add(1);
        self.ticks
    }

    /// Ticks processed so far.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Fed time not yet covered by a full tick.
    pub const fn remainder(&self) -> f64 {
        self.accumulator
    }

    /// Drop any partial tick and zero the counter.
    pub const fn reset(&mut self) {
        self.accumulator = 0.0;
        self.ticks = 0;
    }
}

/// Convert a non-negative whole number of ticks, saturating at `u64::MAX`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_ticks(whole: f64) -> u64 {
    // `as` saturates and maps NaN to zero.
    whole as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_tick_is_carried_over() {
        let mut clock = TimeAdvancer::new(0.5);
        assert_eq!(clock.feed(0.3), 0);
        assert!((clock.remainder() - 0.3).abs() < 1e-12);
        assert_eq!(clock.feed(0.3), 1);
        assert!((clock.remainder() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn small_increments_match_one_jump() {
        let mut jumped = TimeAdvancer::new(0.5);
        let mut stepped = TimeAdvancer::new(0.5);
        let big = jumped.feed(2.0);
        let small: u64 = (0..20).map(|_| stepped.feed(0.1)).sum();
        assert_eq!(big, 4);
        assert_eq!(small, 4);
    }

    #[test]
    fn tolerance_completes_tick_from_float_error() {
        let mut clock = TimeAdvancer::new(0.5);
        let due: u64 = (0..5).map(|_| clock.feed(0.1)).sum();
        assert_eq!(due, 1);
    }

    #[test]
    fn negative_and_nan_are_ignored() {
        let mut clock = TimeAdvancer::new(0.5);
        assert_eq!(clock.feed(-1.0), 0);
        assert_eq!(clock.feed(f64::NAN), 0);
        assert!(clock.remainder().abs() < f64::EPSILON);
    }

    #[test]
    fn tick_counter_and_reset() {
        let mut clock = TimeAdvancer::new(0.5);
        assert_eq!(clock.record_tick(), 1);
        assert_eq!(clock.record_tick(), 2);
        let _ = clock.feed(0.2);
        clock.reset();
        assert_eq!(clock.ticks(), 0);
        assert!(clock.remainder().abs() < f64::EPSILON);
    }

    #[test]
    fn huge_feed_is_one_division() {
        let mut clock = TimeAdvancer::new(0.5);
        assert_eq!(clock.feed(3.0e9), 6_000_000_000);
        assert!(clock.remainder().abs() < 1e-6);
        assert_eq!(clock.feed(0.25), 0);
        assert!((clock.remainder() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn astronomical_feed_terminates() {
        let mut clock = TimeAdvancer::new(0.5);
        assert_eq!(clock.feed(1.0e18), 2_000_000_000_000_000_000);
        assert!((0.0..0.5).contains(&clock.remainder()));
        let mut clock = TimeAdvancer::new(0.5);
        assert_eq!(clock.feed(f64::MAX), u64::MAX);
        assert!((0.0..0.5).contains(&clock.remainder()));
    }

    #[test]
    fn due_after_leaves_state_alone() {
        let mut clock = TimeAdvancer::new(0.5);
        assert_eq!(clock.feed(0.4), 0);
        assert_eq!(clock.due_after(0.7), 2);
        assert!((clock.remainder() - 0.4).abs() < 1e-12);
        assert_eq!(clock.feed(0.7), 2);
        assert!((clock.remainder() - 0.1).abs() < 1e-12);
    }
}
