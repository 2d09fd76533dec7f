//! Star arm transition geometry for the IFS therapy simulator.
//!
//! The conference is drawn as a star with one arm per part in it. When a
//! part joins or leaves, an arm grows out of or shrinks back into the star.
//! Everything here is a pure function of its inputs: no state is carried
//! between calls, so any progress value can be evaluated directly and
//! overlapping or scrubbed transitions stay exact.
//!
//! # Modules
//!
//! - [`shape`] -- Points and arm outlines.
//! - [`radius`] -- Inner radius of a regular star.
//! - [`transition`] -- A single arm being added or removed.
//! - [`bundle`] -- Up to two overlapping planned transitions.
//! - [`render`] -- The full render spec for one instant.

pub mod bundle;
mod layout;
pub mod radius;
pub mod render;
pub mod shape;
pub mod transition;

pub use bundle::{PlannedTransition, PlannedTransitionBundle};
pub use radius::{inner_radius, regular_base_chord};
pub use render::{RenderParams, RenderSpec, StaticArmSpec, TransitionArmSpec, render_spec};
pub use shape::{ArmShape, Point};
pub use transition::{
    Direction, SingleTransitionGeometry, TransitionParams, TransitionType,
    compute_transition_with_geometry, create_single_transition_geometry,
};
