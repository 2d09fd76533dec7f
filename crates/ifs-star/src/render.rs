//! Full star render spec, with or without transitions in flight.
//!
//! Static arms fill every slot not owned by a transitioning arm. Their half
//! step and inner radius follow the effective arm count, so the star stays
//! (nearly) regular while arms grow and shrink.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::bundle::{PlannedTransition, PlannedTransitionBundle};
use crate::layout::{Frame, Role, Slot, insertion_index, lay_out};
use crate::shape::{ArmShape, Point};
use crate::transition::TransitionType;

/// A static arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct StaticArmSpec {
    /// Outline.
    pub shape: ArmShape,
}

/// An arm that is growing or shrinking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TransitionArmSpec {
    /// Outline.
    pub shape: ArmShape,
    /// Adding or removing.
    pub kind: TransitionType,
    /// Visible size of the arm in `[0, 1]`.
    pub visibility: f64,
}

/// Inputs to [`render_spec`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct RenderParams {
    /// Transitions in flight, if any.
    pub bundle: Option<PlannedTransitionBundle>,
    /// Arms of the static star. A bundle brings its own start count, which
    /// takes precedence.
    pub arm_count: usize,
    /// Axis angle of the first slot.
    pub rotation: f64,
    /// Star center.
    pub center: Point,
    /// Tip radius of static arms.
    pub outer_radius: f64,
}

/// Everything needed to draw the star at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct RenderSpec {
    /// Static arms keyed by their index before the bundle.
    pub static_arms: BTreeMap<usize, StaticArmSpec>,
    /// The arm moved by the first transition.
    pub first_transition_arm: Option<TransitionArmSpec>,
    /// The arm moved by the second transition. Equal to the first when the
    /// second removes the arm the first is adding.
    pub second_transition_arm: Option<TransitionArmSpec>,
    /// Sum of arm weights: the arm count the star currently looks like.
    pub effective_arm_count: f64,
    /// Radius every base point sits on.
    pub inner_radius: f64,
}

impl RenderSpec {
    /// Every visible arm once, in angular order.
    pub fn arms_by_angle(&self) -> Vec<ArmShape> {
        let mut arms: Vec<ArmShape> = self.static_arms.values().map(|a| a.shape).collect();
        arms.extend(self.first_transition_arm.map(|a| a.shape));
        if self.second_transition_arm != self.first_transition_arm {
            arms.extend(self.second_transition_arm.map(|a| a.shape));
        }
        arms.sort_by(|a, b| a.angle.total_cmp(&b.angle));
        arms
    }
}

/// Build the render spec.
pub fn render_spec(params: &RenderParams) -> RenderSpec {
    let slots = match &params.bundle {
        Some(bundle) => bundle_slots(bundle, bundle.start_arm_count()),
        None => (0..params.arm_count).map(Slot::fixed).collect(),
    };
    let frame = Frame {
        center: params.center,
        outer_radius: params.outer_radius,
        rotation: params.rotation,
    };
    let layout = lay_out(&slots, &frame);

    let mut spec = RenderSpec {
        static_arms: BTreeMap::new(),
        first_transition_arm: None,
        second_transition_arm: None,
        effective_arm_count: layout.effective_count,
        inner_radius: layout.inner_radius,
    };
    let weights: Vec<f64> = slots.iter().map(|s| s.weight).collect();
    for ((role, shape), visibility) in layout.arms.into_iter().zip(weights) {
        match role {
            Role::Static(index) => {
                spec.static_arms.insert(index, StaticArmSpec { shape });
            }
            Role::First => {
                spec.first_transition_arm = params
                    .bundle
                    .map(|b| transition_spec(shape, &b.first, visibility));
            }
            Role::Second => {
                spec.second_transition_arm = params
                    .bundle
                    .and_then(|b| b.second)
                    .map(|second| transition_spec(shape, &second, visibility));
            }
            Role::Both => {
                let arm = params
                    .bundle
                    .and_then(|b| b.second)
                    .map(|second| transition_spec(shape, &second, visibility));
                spec.first_transition_arm = arm;
                spec.second_transition_arm = arm;
            }
        }
    }
    spec
}

const fn transition_spec(
    shape: ArmShape,
    transition: &PlannedTransition,
    visibility: f64,
) -> TransitionArmSpec {
    TransitionArmSpec {
        shape,
        kind: transition.kind,
        visibility,
    }
}

/// Slots for a star of `arm_count` arms with the bundle applied.
fn bundle_slots(bundle: &PlannedTransitionBundle, arm_count: usize) -> Vec<Slot> {
    let mut slots: Vec<Slot> = (0..arm_count).map(Slot::fixed).collect();
    let first = &bundle.first;
    let p1 = first.clamped_progress();

    match first.kind {
        TransitionType::Adding => {
            let at = insertion_index(first.source_index, arm_count, first.direction.is_clockwise())
                .min(slots.len());
            slots.insert(at, Slot::moving(Role::First, p1));
        }
        TransitionType::Removing => {
            let at = first.source_index.min(arm_count.saturating_sub(1));
            if let Some(slot) = slots.get_mut(at) {
                *slot = Slot::moving(Role::First, 1.0 - p1);
            }
        }
    }

    let Some(second) = bundle.second.filter(|_| bundle.second_started()) else {
        return slots;
    };
    let p2 = second.clamped_progress();

    // Positions of the arms the star will have once the first completes.
    let intermediate: Vec<usize> = slots
        .iter()
        .enumerate()
        .filter(|(_, s)| !(s.role == Role::First && first.kind == TransitionType::Removing))
        .map(|(position, _)| position)
        .collect();

    match second.kind {
        TransitionType::Adding => {
            let index = insertion_index(
                second.source_index,
                intermediate.len(),
                second.direction.is_clockwise(),
            );
            let at = if index < intermediate.len() {
                intermediate.get(index).copied().unwrap_or(slots.len())
            } else {
                // After the last intermediate arm.
                intermediate
                    .last()
                    .map_or(0, |last| last.saturating_add(1))
            };
            slots.insert(at.min(slots.len()), Slot::moving(Role::Second, p2));
        }
        TransitionType::Removing => {
            let index = second.source_index.min(intermediate.len().saturating_sub(1));
            let target = intermediate.get(index).and_then(|&at| slots.get_mut(at));
            if let Some(slot) = target {
                *slot = if slot.role == Role::First {
                    // The arm is still growing: both progresses shape it.
                    Slot {
                        role: Role::Both,
                        weight: slot.weight * (1.0 - p2),
                        reach: slot.reach * (1.0 - p2),
                    }
                } else {
                    Slot::moving(Role::Second, 1.0 - p2)
                };
            }
        }
    }
    slots
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::transition::Direction;

    fn params(bundle: Option<PlannedTransitionBundle>) -> RenderParams {
        RenderParams {
            bundle,
            arm_count: 5,
            rotation: 0.0,
            center: Point::new(0.0, 0.0),
            outer_radius: 10.0,
        }
    }

    fn transition(kind: TransitionType, source: usize) -> PlannedTransition {
        PlannedTransition::new(kind, source, Direction::Clockwise, 5)
    }

    fn then(first: PlannedTransition, kind: TransitionType, source: usize) -> PlannedTransition {
        first.followed_by(kind, source, Direction::Clockwise)
    }

    #[test]
    fn no_bundle_renders_static_star() {
        let spec = render_spec(&params(None));
        assert_eq!(spec.static_arms.len(), 5);
        assert!(spec.first_transition_arm.is_none());
        assert!((spec.effective_arm_count - 5.0).abs() < 1e-12);
    }

    #[test]
    fn single_add_reports_first_arm() {
        let bundle = PlannedTransitionBundle::single(transition(TransitionType::Adding, 1));
        let spec = render_spec(&params(Some(bundle.at_overall(0.5))));
        assert_eq!(spec.static_arms.len(), 5);
        let arm = spec.first_transition_arm.unwrap();
        assert_eq!(arm.kind, TransitionType::Adding);
        assert!((arm.visibility - 0.5).abs() < 1e-12);
        assert!((spec.effective_arm_count - 5.5).abs() < 1e-12);
        // The new arm sits between static arms 1 and 2.
        let before = spec.static_arms.get(&1).unwrap().shape.angle;
        let after = spec.static_arms.get(&2).unwrap().shape.angle;
        assert!(before < arm.shape.angle && arm.shape.angle < after);
    }

    #[test]
    fn second_waits_for_overlap() {
        let first = transition(TransitionType::Adding, 0);
        let bundle = PlannedTransitionBundle::overlapping(
            first,
            then(first, TransitionType::Adding, 3),
            0.6,
        );
        let early = render_spec(&params(Some(bundle.at_overall(0.5))));
        assert!(early.second_transition_arm.is_none());
        let late = render_spec(&params(Some(bundle.at_overall(0.8))));
        assert!(late.second_transition_arm.is_some());
        assert_eq!(late.static_arms.len(), 5);
    }

    #[test]
    fn removing_a_growing_arm_merges_transitions() {
        // The first adds an arm after arm 0, landing at intermediate index 1,
        // which the second then removes.
        let first = transition(TransitionType::Adding, 0);
        let bundle = PlannedTransitionBundle::overlapping(
            first,
            then(first, TransitionType::Removing, 1),
            0.5,
        );
        let spec = render_spec(&params(Some(bundle.at_overall(0.75))));
        let first = spec.first_transition_arm.unwrap();
        assert_eq!(spec.second_transition_arm, Some(first));
        assert_eq!(first.kind, TransitionType::Removing);
        assert!((first.visibility - 0.75 * 0.75).abs() < 1e-12);
        assert_eq!(spec.arms_by_angle().len(), 6);
    }

    #[test]
    fn bundle_start_count_overrides_params() {
        let bundle = PlannedTransitionBundle::single(PlannedTransition::new(
            TransitionType::Adding,
            0,
            Direction::Clockwise,
            3,
        ));
        let spec = render_spec(&params(Some(bundle.at_overall(0.0))));
        assert_eq!(spec.static_arms.len(), 3);
        assert!((spec.effective_arm_count - 3.0).abs() < 1e-12);
    }

    #[test]
    fn spec_serializes_with_camel_case_keys() {
        let bundle = PlannedTransitionBundle::single(transition(TransitionType::Removing, 2));
        let spec = render_spec(&params(Some(bundle.at_overall(0.3))));
        let json = serde_json::to_value(&spec).unwrap();
        assert!(json.get("staticArms").is_some());
        assert!(json.get("effectiveArmCount").is_some());
        let arm = json.get("firstTransitionArm").unwrap();
        assert_eq!(arm.get("kind").unwrap(), "removing");
        assert!(json.get("secondTransitionArm").unwrap().is_null());
    }

    #[test]
    fn second_indexes_the_intermediate_star() {
        // Removing arm 0 first shifts every later arm down by one.
        let first = transition(TransitionType::Removing, 0);
        let bundle = PlannedTransitionBundle::overlapping(
            first,
            then(first, TransitionType::Removing, 0),
            0.5,
        );
        let spec = render_spec(&params(Some(bundle.at_overall(0.75))));
        // Intermediate arm 0 is the original arm 1.
        assert!(!spec.static_arms.contains_key(&1));
        assert!(spec.static_arms.contains_key(&2));
        assert!(spec.second_transition_arm.is_some());
    }
}
