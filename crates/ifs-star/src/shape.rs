//! Points and arm outlines.
//!
//! Angles are in radians in screen coordinates (y grows downward), so a
//! growing angle turns clockwise on screen.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A point in view space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate, growing downward.
    pub y: f64,
}

impl Point {
    /// A point from its coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The point at `radius` and `angle` around `self`.
    pub fn polar(self, radius: f64, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: radius.mul_add(cos, self.x),
            y: radius.mul_add(sin, self.y),
        }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One arm of the star: a tip and the two base points on the inner circle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ArmShape {
    /// Angle of the arm's axis.
    pub angle: f64,
    /// Angular distance from the axis to each base point.
    pub half_step: f64,
    /// Outer point.
    pub tip: Point,
    /// Base point before the axis.
    pub b1: Point,
    /// Base point after the axis.
    pub b2: Point,
}

impl ArmShape {
    /// Length of the straight segment between the base points.
    pub fn base_chord(&self) -> f64 {
        self.b1.distance(self.b2)
    }

    /// Angle of the leading base point.
    pub const fn start_angle(&self) -> f64 {
        self.angle - self.half_step
    }

    /// Angle of the trailing base point.
    pub const fn end_angle(&self) -> f64 {
        self.angle + self.half_step
    }
}

/// Cubic ease with zero slope at both ends, on a clamped input.
pub(crate) fn smoothstep(x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    x * x * 2.0f64.mul_add(-x, 3.0)
}
