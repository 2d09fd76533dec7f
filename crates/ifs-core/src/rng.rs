//! Seeded, introspectable random source.
//!
//! Every state-affecting random decision in the simulator goes through
//! [`SimRng`]. Each draw is counted and logged with a label so a recorded
//! session can be checked for RNG-consumption parity when it is replayed.
//!
//! The log is a window, not a history: the owner drops entries it no longer
//! needs with [`SimRng::discard_log_before`], and indices stay absolute.

use ifs_types::RngLogEntry;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::RngError;

/// Seeded random source with a call counter and draw log.
#[derive(Debug, Clone)]
pub struct SimRng {
    seed: u64,
    inner: StdRng,
    call_count: u64,
    log: Vec<RngLogEntry>,
    log_start: u64,
}

impl SimRng {
    /// Create a source seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: StdRng::seed_from_u64(seed),
            call_count: 0,
            log: Vec::new(),
            log_start: 0,
        }
    }

    /// The seed this source was created with.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Draw a uniform value in `[0, 1)`.
    pub fn random(&mut self, label: &str) -> f64 {
        let value: f64 = self.inner.random();
        self.log.push(RngLogEntry {
            index: self.call_count,
            label: label.to_owned(),
            value,
        });
        self.call_count = self.call_count.saturating_add(1);
        value
    }

    /// Pick one element uniformly, consuming exactly one draw.
    ///
    /// # Errors
    ///
    /// Returns [`RngError::EmptyPick`] if `items` is empty. No draw is
    /// consumed in that case.
    pub fn pick<'a, T>(&mut self, label: &str, items: &'a [T]) -> Result<&'a T, RngError> {
        let len = u32::try_from(items.len()).unwrap_or(u32::MAX);
        if len == 0 {
            return Err(RngError::EmptyPick {
                label: label.to_owned(),
            });
        }
        let slot = (self.random(label) * f64::from(len)).floor();
        let chosen = items
            .iter()
            .zip(0_u32..)
            .find(|(_, position)| f64::from(*position) >= slot)
            .map(|(item, _)| item);
        chosen.or_else(|| items.last()).ok_or_else(|| RngError::EmptyPick {
            label: label.to_owned(),
        })
    }

    /// Number of draws since seeding.
    pub const fn call_count(&self) -> u64 {
        self.call_count
    }

    /// Retained draws, oldest first.
    pub fn call_log(&self) -> &[RngLogEntry] {
        &self.log
    }

    /// Retained draws made after the first `from` draws.
    pub fn log_since(&self, from: u64) -> Vec<RngLogEntry> {
        let skip = usize::try_from(from.saturating_sub(self.log_start)).unwrap_or(usize::MAX);
        self.log.get(skip..).map_or_else(Vec::new, <[RngLogEntry]>::to_vec)
    }

    /// Drop logged draws with an index below `count`.
    pub fn discard_log_before(&mut self, count: u64) {
        let drop = usize::try_from(count.saturating_sub(self.log_start))
            .unwrap_or(usize::MAX)
            .min(self.log.len());
        if drop == 0 {
            return;
        }
        self.log.drain(..drop);
        self.log_start = self
            .log_start
            .saturating_add(u64::try_from(drop).unwrap_or(u64::MAX));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SimRng::new(42);
        let mut b = SimRng::new(42);
        for _ in 0..16 {
            assert!((a.random("x") - b.random("x")).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn draws_are_counted_and_logged() {
        let mut rng = SimRng::new(7);
        let first = rng.random("help_protected");
        let _ = rng.random("ask_to_wait");
        assert_eq!(rng.call_count(), 2);
        assert_eq!(rng.call_log().len(), 2);
        let entry = rng.call_log().first().unwrap();
        assert_eq!(entry.index, 0);
        assert_eq!(entry.label, "help_protected");
        assert!((entry.value - first).abs() < f64::EPSILON);
        assert_eq!(rng.log_since(1).len(), 1);
    }

    #[test]
    fn discarded_entries_keep_absolute_indices() {
        let mut rng = SimRng::new(5);
        for _ in 0..5 {
            let _ = rng.random("x");
        }
        rng.discard_log_before(3);
        assert_eq!(rng.call_log().len(), 2);
        assert_eq!(rng.call_log().first().unwrap().index, 3);
        assert_eq!(rng.log_since(4).len(), 1);
        assert_eq!(rng.log_since(4).first().unwrap().index, 4);
        assert_eq!(rng.log_since(0).len(), 2);

        rng.discard_log_before(2);
        assert_eq!(rng.call_log().len(), 2);
        rng.discard_log_before(99);
        assert!(rng.call_log().is_empty());
        assert_eq!(rng.call_count(), 5);
        let _ = rng.random("y");
        assert_eq!(rng.log_since(5).first().unwrap().index, 5);
    }

    #[test]
    fn values_are_in_unit_interval() {
        let mut rng = SimRng::new(3);
        for _ in 0..1000 {
            let v = rng.random("unit");
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn pick_from_empty_is_an_error() {
        let mut rng = SimRng::new(1);
        let empty: [u8; 0] = [];
        assert_eq!(
            rng.pick("line", &empty),
            Err(RngError::EmptyPick {
                label: "line".to_owned()
            })
        );
        assert_eq!(rng.call_count(), 0);
    }

    #[test]
    fn pick_consumes_one_draw_and_returns_member() {
        let mut rng = SimRng::new(9);
        let items = ["a", "b", "c"];
        for _ in 0..50 {
            let picked = rng.pick("line", &items).unwrap();
            assert!(items.contains(picked));
        }
        assert_eq!(rng.call_count(), 50);
    }

    #[test]
    fn pick_covers_every_element() {
        let mut rng = SimRng::new(11);
        let items = [0_u8, 1, 2, 3];
        let mut seen = [false; 4];
        for _ in 0..200 {
            let picked = *rng.pick("cover", &items).unwrap();
            if let Some(flag) = seen.get_mut(usize::from(picked)) {
                *flag = true;
            }
        }
        assert!(seen.iter().all(|s| *s));
    }
}
