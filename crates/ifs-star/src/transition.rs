//! Geometry of a single arm being added or removed.
//!
//! [`create_single_transition_geometry`] fixes everything that does not
//! depend on progress. [`compute_transition_with_geometry`] evaluates the
//! moving arm at any progress, from scratch, so scrubbing back and forth
//! lands on exactly the same shapes.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::layout::{Frame, Role, Slot, insertion_index, lay_out};
use crate::shape::{ArmShape, Point};

/// Whether an arm appears or disappears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TransitionType {
    /// A new arm grows out of the star.
    Adding,
    /// An existing arm shrinks into the star.
    Removing,
}

/// Side of the source arm on which a new arm grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Direction {
    /// After the source arm (`+1`).
    #[default]
    Clockwise,
    /// Before the source arm (`-1`).
    CounterClockwise,
}

impl Direction {
    /// Direction from a signed step; zero counts as clockwise.
    pub const fn from_sign(sign: i32) -> Self {
        if sign < 0 {
            Self::CounterClockwise
        } else {
            Self::Clockwise
        }
    }

    /// `+1` or `-1`.
    pub const fn sign(self) -> i32 {
        match self {
            Self::Clockwise => 1,
            Self::CounterClockwise => -1,
        }
    }

    pub(crate) const fn is_clockwise(self) -> bool {
        matches!(self, Self::Clockwise)
    }
}

/// Serde adapter that writes a [`Direction`] as `1` or `-1`.
pub(crate) mod direction_sign {
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::Direction;

    /// Write the sign.
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(direction: &Direction, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(direction.sign())
    }

    /// Read a sign, rejecting anything but `1` and `-1`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Direction, D::Error> {
        match i32::deserialize(deserializer)? {
            1 => Ok(Direction::Clockwise),
            -1 => Ok(Direction::CounterClockwise),
            other => Err(de::Error::custom(format!(
                "direction must be 1 or -1, got {other}"
            ))),
        }
    }
}

/// Inputs to a single transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TransitionParams {
    /// Arm next to which a new arm grows, or the arm that shrinks.
    pub source_index: usize,
    /// Arms before the transition.
    pub arm_count: usize,
    /// Star center.
    pub center: Point,
    /// Tip radius of static arms.
    pub outer_radius: f64,
    /// Axis angle of arm 0.
    pub rotation: f64,
    /// Side on which a new arm grows, `1` or `-1` on the wire.
    #[serde(with = "direction_sign")]
    #[ts(type = "1 | -1")]
    pub direction: Direction,
    /// Adding or removing.
    pub kind: TransitionType,
}

/// Progress-independent part of a single transition.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleTransitionGeometry {
    params: TransitionParams,
    /// Slot position of the moving arm.
    moving_index: usize,
}

impl SingleTransitionGeometry {
    /// The inputs this geometry was created from.
    pub const fn params(&self) -> &TransitionParams {
        &self.params
    }

    /// Arm count once the transition completes.
    pub const fn target_arm_count(&self) -> usize {
        match self.params.kind {
            TransitionType::Adding => self.params.arm_count.saturating_add(1),
            TransitionType::Removing => self.params.arm_count.saturating_sub(1),
        }
    }

    fn slots(&self, t: f64) -> Vec<Slot> {
        let t = t.clamp(0.0, 1.0);
        let mut slots: Vec<Slot> = (0..self.params.arm_count).map(Slot::fixed).collect();
        match self.params.kind {
            TransitionType::Adding => {
                let at = self.moving_index.min(slots.len());
                slots.insert(at, Slot::moving(Role::First, t));
            }
            TransitionType::Removing => {
                if let Some(slot) = slots.get_mut(self.moving_index) {
                    *slot = Slot::moving(Role::First, 1.0 - t);
                }
            }
        }
        slots
    }
}

/// Prepare a single transition.
///
/// An out-of-range source index is clamped to the last arm.
pub fn create_single_transition_geometry(params: TransitionParams) -> SingleTransitionGeometry {
    let moving_index = match params.kind {
        TransitionType::Adding => insertion_index(
            params.source_index,
            params.arm_count,
            params.direction.is_clockwise(),
        ),
        TransitionType::Removing => params
            .source_index
            .min(params.arm_count.saturating_sub(1)),
    };
    SingleTransitionGeometry {
        params,
        moving_index,
    }
}

/// The moving arm at progress `t`, clamped to `[0, 1]`.
///
/// Removing at `t` mirrors adding at `1 - t` into the smaller star. A star
/// with no arm to remove yields a collapsed arm at the center.
pub fn compute_transition_with_geometry(geometry: &SingleTransitionGeometry, t: f64) -> ArmShape {
    let frame = Frame {
        center: geometry.params.center,
        outer_radius: geometry.params.outer_radius,
        rotation: geometry.params.rotation,
    };
    let layout = lay_out(&geometry.slots(t), &frame);
    layout
        .arms
        .into_iter()
        .find_map(|(role, shape)| (role == Role::First).then_some(shape))
        .unwrap_or(ArmShape {
            angle: geometry.params.rotation,
            half_step: 0.0,
            tip: frame.center,
            b1: frame.center,
            b2: frame.center,
        })
}
