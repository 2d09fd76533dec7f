//! Recorded session schema.
//!
//! A [`RecordedSession`] is the persisted artifact used for regression
//! testing and solution playback. Replaying its `actions` against the
//! initial state with the same seed must reproduce the final state exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActionKind, BiographyField, SimulationMode};
use crate::ids::PartId;
use crate::structs::{ModelState, RelationshipState};

/// The only session format version this build reads and writes.
pub const SESSION_VERSION: u32 = 1;

/// One random draw, as logged by the simulation RNG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct RngLogEntry {
    /// Zero-based index of the draw since seeding.
    pub index: u64,
    /// What the draw was used for.
    pub label: String,
    /// The value drawn in `[0, 1)`.
    pub value: f64,
}

/// One action in a recorded session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct RecordedAction {
    /// The action id.
    pub action: ActionKind,
    /// The acting part.
    pub cloud_id: PartId,
    /// Second part, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_cloud_id: Option<PartId>,
    /// Biography field, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<BiographyField>,
    /// Requested mode, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_mode: Option<SimulationMode>,
    /// Simulated time fed to the advancer since the previous record.
    pub elapsed_time: f64,
    /// Time covered by full ticks since the previous record.
    pub effective_time: f64,
    /// Total simulated time at which the action ran.
    pub cumulative_time: f64,
    /// RNG draws consumed since the previous record, if captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng_call_count: Option<u64>,
    /// The draws consumed since the previous record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rng_log: Vec<RngLogEntry>,
    /// Total RNG count at the moment a spontaneous blend triggered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_rng_count: Option<u64>,
    /// Simulated time of the tick before the trigger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_trigger_time: Option<f64>,
    /// Whether this record was produced by the simulation itself.
    #[serde(default)]
    pub spontaneous: bool,
}

/// A complete recorded session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct RecordedSession {
    /// Format version; must equal [`SESSION_VERSION`].
    pub version: u32,
    /// Version of the code that produced the session.
    pub code_version: String,
    /// Free-form platform string.
    pub platform: String,
    /// Seed for the simulation RNG.
    pub model_seed: u64,
    /// When recording started.
    pub timestamp: DateTime<Utc>,
    /// Model state before the first action.
    pub initial_model: ModelState,
    /// Relationship state before the first action.
    pub initial_relationships: RelationshipState,
    /// Recorded actions in execution order.
    pub actions: Vec<RecordedAction>,
    /// Model state after the last action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_model: Option<ModelState>,
    /// Relationship state after the last action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_relationships: Option<RelationshipState>,
}

impl RecordedSession {
    /// Number of actions issued by the driver (spontaneous records excluded).
    pub fn driver_action_count(&self) -> usize {
        self.actions.iter().filter(|a| !a.spontaneous).count()
    }
}
