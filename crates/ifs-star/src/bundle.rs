//! One or two planned transitions that may overlap in time.
//!
//! The second transition starts once the first has passed `overlap_start`.
//! Its source index refers to the star the first transition is heading
//! toward, not the star currently on screen.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::transition::{Direction, TransitionType, direction_sign};

/// Bounds on the overlap point.
const OVERLAP_MIN: f64 = 1e-3;
const OVERLAP_MAX: f64 = 1.0;

/// Progress at or above this counts as finished.
const COMPLETE_AT: f64 = 1.0 - 1e-9;

/// One transition inside a bundle.
///
/// On the wire: `{type, direction: 1 | -1, progress, sourceArmIndex,
/// startArmCount}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PlannedTransition {
    /// Adding or removing.
    #[serde(rename = "type")]
    pub kind: TransitionType,
    /// Source arm index, counted in a star of `start_arm_count` arms.
    #[serde(rename = "sourceArmIndex")]
    pub source_index: usize,
    /// Side on which a new arm grows.
    #[serde(with = "direction_sign")]
    #[ts(type = "1 | -1")]
    pub direction: Direction,
    /// Progress in `[0, 1]`.
    pub progress: f64,
    /// Arms in the star this transition starts from.
    pub start_arm_count: usize,
}

impl PlannedTransition {
    /// A transition that has not started.
    pub const fn new(
        kind: TransitionType,
        source_index: usize,
        direction: Direction,
        start_arm_count: usize,
    ) -> Self {
        Self {
            kind,
            source_index,
            direction,
            progress: 0.0,
            start_arm_count,
        }
    }

    /// A transition planned against the star this one leaves behind.
    #[must_use]
    pub const fn followed_by(
        &self,
        kind: TransitionType,
        source_index: usize,
        direction: Direction,
    ) -> Self {
        Self::new(kind, source_index, direction, self.end_arm_count())
    }

    /// Arms once this transition completes.
    pub const fn end_arm_count(&self) -> usize {
        match self.kind {
            TransitionType::Adding => self.start_arm_count.saturating_add(1),
            TransitionType::Removing => self.start_arm_count.saturating_sub(1),
        }
    }

    /// Progress clamped to `[0, 1]`, with NaN read as not started.
    pub fn clamped_progress(&self) -> f64 {
        if self.progress.is_nan() {
            0.0
        } else {
            self.progress.clamp(0.0, 1.0)
        }
    }

    /// Arm-count change once complete.
    pub const fn delta(&self) -> i32 {
        match self.kind {
            TransitionType::Adding => 1,
            TransitionType::Removing => -1,
        }
    }
}

/// A first transition and an optional overlapping second one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PlannedTransitionBundle {
    /// The transition that starts first.
    pub first: PlannedTransition,
    /// The transition that starts during the first.
    pub second: Option<PlannedTransition>,
    /// First-transition progress at which the second one may start.
    pub overlap_start: f64,
    /// Whether the first transition has reached the end.
    pub first_completed: bool,
}

impl PlannedTransitionBundle {
    /// A bundle with one transition.
    pub const fn single(first: PlannedTransition) -> Self {
        Self {
            first,
            second: None,
            overlap_start: OVERLAP_MAX,
            first_completed: false,
        }
    }

    /// A bundle whose second transition starts at `overlap_start`.
    pub fn overlapping(
        first: PlannedTransition,
        second: PlannedTransition,
        overlap_start: f64,
    ) -> Self {
        Self {
            first,
            second: Some(second),
            overlap_start: clamp_overlap(overlap_start),
            first_completed: false,
        }
    }

    /// The overlap point, clamped into range.
    pub fn overlap(&self) -> f64 {
        clamp_overlap(self.overlap_start)
    }

    /// Length of the overall sweep: 1 for one transition, `1 + overlap`
    /// for two.
    pub fn sweep_length(&self) -> f64 {
        if self.second.is_some() {
            1.0 + self.overlap()
        } else {
            1.0
        }
    }

    /// Whether the second transition is in flight.
    pub fn second_started(&self) -> bool {
        self.second.is_some() && self.first.clamped_progress() >= self.overlap()
    }

    /// Whether every transition has reached the end.
    pub fn is_complete(&self) -> bool {
        self.first.clamped_progress() >= COMPLETE_AT
            && self
                .second
                .is_none_or(|second| second.clamped_progress() >= COMPLETE_AT)
    }

    /// The bundle at overall sweep position `u`.
    ///
    /// The first transition runs over `[0, 1]` and the second over
    /// `[overlap, 1 + overlap]`. Progress that lands within rounding of the
    /// end is reported as exactly 1, so `at_overall(sweep_length())` is
    /// always complete.
    #[must_use]
    pub fn at_overall(&self, u: f64) -> Self {
        let u = if u.is_nan() { 0.0 } else { u };
        let overlap = self.overlap();
        let first_progress = settle(u);
        Self {
            first: PlannedTransition {
                progress: first_progress,
                ..self.first
            },
            second: self.second.map(|second| PlannedTransition {
                progress: settle(u - overlap),
                ..second
            }),
            overlap_start: overlap,
            first_completed: first_progress >= 1.0,
        }
    }

    /// Arms before the bundle starts.
    pub const fn start_arm_count(&self) -> usize {
        self.first.start_arm_count
    }

    /// Arm count once every transition completes.
    pub fn final_arm_count(&self) -> usize {
        self.second
            .map_or(self.first.end_arm_count(), |second| {
                second.end_arm_count()
            })
    }

    /// Whether the second transition was planned against the star the first
    /// one leaves behind.
    pub fn is_chained(&self) -> bool {
        self.second
            .is_none_or(|second| second.start_arm_count == self.first.end_arm_count())
    }
}

/// Clamp into `[0, 1]`, reading anything within 1e-9 of the end as 1.
fn settle(progress: f64) -> f64 {
    let progress = progress.clamp(0.0, 1.0);
    if progress >= COMPLETE_AT { 1.0 } else { progress }
}

fn clamp_overlap(overlap: f64) -> f64 {
    if overlap.is_nan() {
        OVERLAP_MAX
    } else {
        overlap.clamp(OVERLAP_MIN, OVERLAP_MAX)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn add(source: usize) -> PlannedTransition {
        PlannedTransition::new(TransitionType::Adding, source, Direction::Clockwise, 5)
    }

    #[test]
    fn at_overall_staggers_progress() {
        let bundle = PlannedTransitionBundle::overlapping(add(0), add(2), 0.4);
        assert!((bundle.sweep_length() - 1.4).abs() < 1e-12);

        let early = bundle.at_overall(0.3);
        assert!((early.first.progress - 0.3).abs() < 1e-12);
        assert!(early.second.is_some_and(|s| s.progress.abs() < f64::EPSILON));
        assert!(!early.second_started());

        let mid = bundle.at_overall(0.9);
        assert!(mid.second_started());
        assert!(mid.second.is_some_and(|s| (s.progress - 0.5).abs() < 1e-12));
        assert!(!mid.first_completed);

        let end = bundle.at_overall(1.4);
        assert!(end.first_completed);
        assert!(end.is_complete());
    }

    #[test]
    fn sweep_end_completes_for_every_overlap() {
        for step in 1..=9 {
            let overlap = f64::from(step) / 10.0;
            let bundle = PlannedTransitionBundle::overlapping(add(0), add(2), overlap);
            let end = bundle.at_overall(bundle.sweep_length());
            assert!(end.first_completed, "overlap {overlap}");
            assert!(end.is_complete(), "overlap {overlap}");
            assert!(end.second.is_some_and(|s| s.progress >= 1.0), "overlap {overlap}");

            let before = bundle.at_overall(bundle.sweep_length() - 0.01);
            assert!(!before.is_complete(), "overlap {overlap}");
        }
    }

    #[test]
    fn overlap_is_clamped() {
        let bundle = PlannedTransitionBundle::overlapping(add(0), add(1), -2.0);
        assert!(bundle.overlap() > 0.0);
        let bundle = PlannedTransitionBundle::overlapping(add(0), add(1), f64::NAN);
        assert!((bundle.overlap() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn final_count_applies_both_deltas() {
        let first = add(0);
        let remove = first.followed_by(TransitionType::Removing, 1, Direction::Clockwise);
        assert_eq!(remove.start_arm_count, 6);
        let bundle = PlannedTransitionBundle::overlapping(first, remove, 0.5);
        assert!(bundle.is_chained());
        assert_eq!(bundle.start_arm_count(), 5);
        assert_eq!(bundle.final_arm_count(), 5);
        assert_eq!(PlannedTransitionBundle::single(add(0)).final_arm_count(), 6);
        assert_eq!(remove.delta(), -1);
    }

    #[test]
    fn unchained_second_is_detected() {
        let bundle = PlannedTransitionBundle::overlapping(add(0), add(1), 0.5);
        assert!(!bundle.is_chained());
    }

    #[test]
    fn transition_uses_signed_direction_on_the_wire() {
        let transition = PlannedTransition::new(
            TransitionType::Removing,
            2,
            Direction::CounterClockwise,
            4,
        );
        let json = serde_json::to_value(transition).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "removing",
                "sourceArmIndex": 2,
                "direction": -1,
                "progress": 0.0,
                "startArmCount": 4,
            })
        );
        let back: PlannedTransition = serde_json::from_value(json).unwrap();
        assert_eq!(back, transition);

        let bad = serde_json::json!({
            "type": "adding",
            "sourceArmIndex": 0,
            "direction": 0,
            "progress": 0.0,
            "startArmCount": 3,
        });
        assert!(serde_json::from_value::<PlannedTransition>(bad).is_err());
    }
}
