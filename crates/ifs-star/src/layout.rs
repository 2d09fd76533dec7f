//! Weighted slot layout shared by single and bundled transitions.
//!
//! Every arm owns an angular slot proportional to its weight: static arms
//! weigh 1, a growing arm weighs its progress and a shrinking arm the rest.
//! Slots are laid out back to back, so neighbouring arms share base points
//! and no gap can open or close between them.

use std::f64::consts::{PI, TAU};

use crate::radius::inner_radius;
use crate::shape::{ArmShape, Point, smoothstep};

/// Bounds on any arm's half step.
pub const MIN_HALF_STEP: f64 = 1e-4;

/// Effective counts below this fall back to a full-circle unit slot.
const MIN_EFFECTIVE_COUNT: f64 = 1e-6;

/// Which arm a slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A static arm with its index in the star before any transition.
    Static(usize),
    /// The arm moved by the first transition.
    First,
    /// The arm moved by the second transition.
    Second,
    /// The arm added by the first transition and removed by the second.
    Both,
}

/// One arm awaiting placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    /// Owner.
    pub role: Role,
    /// Share of a unit slot, in `[0, 1]`.
    pub weight: f64,
    /// How far the tip extends from the inner circle to the outer one.
    pub reach: f64,
}

impl Slot {
    /// A full static arm.
    pub const fn fixed(index: usize) -> Self {
        Self {
            role: Role::Static(index),
            weight: 1.0,
            reach: 1.0,
        }
    }

    /// A partially grown arm.
    pub fn moving(role: Role, amount: f64) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        Self {
            role,
            weight: amount,
            reach: amount,
        }
    }
}

/// Center, size and orientation of the star.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Center point.
    pub center: Point,
    /// Radius of static tips.
    pub outer_radius: f64,
    /// Axis angle of the first slot.
    pub rotation: f64,
}

/// Placed arms plus the star-wide values they were placed with.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Arms in slot order with their owner.
    pub arms: Vec<(Role, ArmShape)>,
    /// Sum of the slot weights.
    pub effective_count: f64,
    /// Radius every base point sits on.
    pub inner_radius: f64,
}

/// Place slots around the frame.
pub fn lay_out(slots: &[Slot], frame: &Frame) -> Layout {
    let effective_count: f64 = slots.iter().map(|s| s.weight.max(0.0)).sum();
    let unit = if effective_count > MIN_EFFECTIVE_COUNT {
        TAU / effective_count
    } else {
        TAU
    };
    let inner = inner_radius(effective_count, frame.outer_radius);
    let mut cursor = frame.rotation - unit / 2.0;

    let arms = slots
        .iter()
        .map(|slot| {
            let span = slot.weight.max(0.0) * unit;
            let angle = cursor + span / 2.0;
            cursor += span;
            let half_step = (span / 2.0).clamp(MIN_HALF_STEP, PI - MIN_HALF_STEP);
            let tip_radius = (frame.outer_radius - inner).mul_add(smoothstep(slot.reach), inner);
            let shape = ArmShape {
                angle,
                half_step,
                tip: frame.center.polar(tip_radius, angle),
                b1: frame.center.polar(inner, angle - half_step),
                b2: frame.center.polar(inner, angle + half_step),
            };
            (slot.role, shape)
        })
        .collect();

    Layout {
        arms,
        effective_count,
        inner_radius: inner,
    }
}

/// Position at which an arm grows next to `source` among `len` arms.
pub fn insertion_index(source: usize, len: usize, clockwise: bool) -> usize {
    let source = source.min(len.saturating_sub(1));
    if clockwise && len > 0 {
        source.saturating_add(1)
    } else {
        source
    }
}
