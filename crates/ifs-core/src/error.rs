//! Error types for the ifs-core crate.
//!
//! These are programmer and data-contract errors: unknown action ids,
//! malformed setup, empty random picks. Recoverable domain failures (an
//! unknown cloud id in an action, a missing target) are not errors; they
//! come back as an unsuccessful `ActionResult`.

use ifs_types::{ParseEnumError, PartId};

/// Errors raised by the seeded simulation RNG.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RngError {
    /// A random pick was requested from an empty list.
    #[error("random pick from empty list ({label})")]
    EmptyPick {
        /// What the pick was for.
        label: String,
    },
}

/// Errors that can occur while setting up or driving a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The action id is not part of the action catalogue.
    #[error("unknown action: {action}")]
    UnknownAction {
        /// The rejected action id.
        action: String,
    },

    /// A field or mode argument did not parse.
    #[error(transparent)]
    InvalidArgument(#[from] ParseEnumError),

    /// A setup or mutation call referenced a part that was never registered.
    #[error("unknown part: {0}")]
    UnknownPart(PartId),

    /// A part with this id is already registered.
    #[error("duplicate part: {0}")]
    DuplicatePart(PartId),

    /// A part was set up as its own proxy.
    #[error("part {0} cannot be its own proxy")]
    SelfProxy(PartId),

    /// A grievance was set up without any complaint lines.
    #[error("grievance held by {holder} has no lines")]
    EmptyGrievance {
        /// The grievance holder.
        holder: PartId,
    },

    /// A grievance was set up without any targets.
    #[error("grievance held by {holder} has no targets")]
    GrievanceWithoutTargets {
        /// The grievance holder.
        holder: PartId,
    },

    /// A single `advance` call would run more ticks than configured.
    #[error("advance of {delta}s needs {due} ticks, limit is {limit}")]
    TooManyTicks {
        /// The fed amount of simulated time.
        delta: f64,
        /// Ticks the feed would make due.
        due: u64,
        /// The configured `time.max_ticks_per_advance`.
        limit: u64,
    },

    /// The RNG rejected a draw.
    #[error(transparent)]
    Rng(#[from] RngError),
}
