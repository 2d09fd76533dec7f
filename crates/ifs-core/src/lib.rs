//! Deterministic simulation core for the IFS therapy simulator.
//!
//! This crate owns the model of parts, their relationships, the therapist
//! action state machine and the fixed-tick time loop. Everything that moves
//! the simulation forward draws from one seeded RNG, so a recorded session
//! replays to the same final state.
//!
//! # Modules
//!
//! - [`actions`] -- Validation pipeline and per-action resolution.
//! - [`applicator`] -- Applies resolved effects to the model.
//! - [`clock`] -- Fixed-tick quantization of fed time.
//! - [`config`] -- Configuration loading from `ifs-config.yaml`.
//! - [`diff`] -- Structural diff of serialized state.
//! - [`error`] -- Error types.
//! - [`messages`] -- Grievance and blended dialogue timers.
//! - [`model`] -- Parts, conference, blending and global state.
//! - [`recorder`] -- Session capture for replay.
//! - [`relationships`] -- Protections, grievances and proxies.
//! - [`replay`] -- [`SessionReplayer`] and its report.
//! - [`rng`] -- The seeded, counting RNG.
//! - [`scenario`] -- Scenario definitions and the built-in cast.
//! - [`simulation`] -- [`SimulationContext`], the single owner of state.
//! - [`tick`] -- The per-tick phase sequence.
//!
//! [`SessionReplayer`]: replay::SessionReplayer
//! [`SimulationContext`]: simulation::SimulationContext

pub mod actions;
pub mod applicator;
pub mod clock;
pub mod config;
pub mod diff;
pub mod error;
pub mod messages;
pub mod model;
pub mod recorder;
pub mod relationships;
pub mod replay;
pub mod rng;
pub mod scenario;
pub mod simulation;
pub mod tick;
