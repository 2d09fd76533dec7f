//! Inner radius of a regular star.

use std::f64::consts::{PI, TAU};

/// Smallest arm count the ratio is evaluated at.
pub const MIN_ARM_COUNT: f64 = 3.0;

/// Bounds on the inner-to-outer radius ratio.
const RATIO_MIN: f64 = 0.3;
const RATIO_MAX: f64 = 0.75;

/// Radius of the inner vertices of a regular star with `arm_count` arms.
///
/// The ratio `cos(2π/n) / cos(π/n)` puts each base point on the line through
/// the neighbouring tips. It is clamped so that three-armed stars keep some
/// body and many-armed stars keep visible arms. Fractional counts are
/// accepted, which lets a star re-equalize while an arm grows or shrinks.
pub fn inner_radius(arm_count: f64, outer_radius: f64) -> f64 {
    let n = if arm_count.is_finite() {
        arm_count.max(MIN_ARM_COUNT)
    } else {
        MIN_ARM_COUNT
    };
    let ratio = ((TAU / n).cos() / (PI / n).cos()).clamp(RATIO_MIN, RATIO_MAX);
    outer_radius * ratio
}

/// Base chord of one arm of a regular star.
pub fn regular_base_chord(arm_count: f64, outer_radius: f64) -> f64 {
    let n = arm_count.max(MIN_ARM_COUNT);
    2.0 * inner_radius(n, outer_radius) * (PI / n).sin()
}
