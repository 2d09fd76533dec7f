//! Headless playback of a planned star transition.
//!
//! Plans one part joining the conference and another leaving while the
//! first arm is still growing, then steps the bundle a frame at a time until
//! both transitions complete. Every frame's render spec is kept so the run
//! can be written out and inspected.

use ifs_star::{
    Direction, PlannedTransition, PlannedTransitionBundle, Point, RenderParams, RenderSpec,
    TransitionType, render_spec,
};
use tracing::{debug, info};

/// Overall progress per frame: one transition lasts a second at 60 fps.
const PROGRESS_PER_FRAME: f64 = 1.0 / 60.0;

/// First-transition progress at which the departure starts.
const OVERLAP: f64 = 0.5;

/// Tip radius of the played star.
const OUTER_RADIUS: f64 = 120.0;

/// A join at arm 0 followed by the last arm leaving.
pub const fn plan(arm_count: usize) -> PlannedTransitionBundle {
    let join = PlannedTransition::new(TransitionType::Adding, 0, Direction::Clockwise, arm_count);
    let leave = join.followed_by(TransitionType::Removing, arm_count, Direction::Clockwise);
    PlannedTransitionBundle {
        first: join,
        second: Some(leave),
        overlap_start: OVERLAP,
        first_completed: false,
    }
}

/// Render `bundle` frame by frame until it completes.
pub fn play(bundle: &PlannedTransitionBundle) -> Vec<RenderSpec> {
    let end = bundle.sweep_length();
    let mut frames = Vec::new();
    let mut overall = 0.0_f64;
    let mut first_reported = false;
    loop {
        let frame = bundle.at_overall(overall);
        if frame.first_completed && !first_reported {
            first_reported = true;
            debug!(frame = frames.len(), "First transition finished");
        }
        frames.push(render_spec(&RenderParams {
            bundle: Some(frame),
            arm_count: bundle.start_arm_count(),
            rotation: 0.0,
            center: Point::new(0.0, 0.0),
            outer_radius: OUTER_RADIUS,
        }));
        if frame.is_complete() {
            break;
        }
        overall = (overall + PROGRESS_PER_FRAME).min(end);
    }
    info!(
        frames = frames.len(),
        start_arms = bundle.start_arm_count(),
        final_arms = bundle.final_arm_count(),
        "Star transition played"
    );
    frames
}
