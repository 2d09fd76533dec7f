//! Deterministic replay of recorded sessions.
//!
//! The replayer rebuilds a context from the session's initial state and seed,
//! ticks forward to each recorded action's cumulative time, executes it and
//! compares RNG consumption with what was recorded. Spontaneous records are
//! not executed; the ticks produce them again on their own. At the end the
//! final model and relationships are diffed against the recorded ones,
//! exactly unless a [`Tolerance`] is configured.

use std::path::{Path, PathBuf};

use ifs_types::{ActionRequest, ActionResult, RecordedAction, RecordedSession, SESSION_VERSION};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::SimConfig;
use crate::diff::{StateDifference, Tolerance, diff_states_within};
use crate::error::SimError;
use crate::simulation::SimulationContext;

/// Errors that can occur while loading or replaying a session.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// The session was written by an incompatible format version.
    #[error("unsupported session version {found} (expected {SESSION_VERSION})")]
    UnsupportedVersion {
        /// The version found in the file.
        found: u32,
    },

    /// The session file could not be read.
    #[error("failed to read session {path}: {source}")]
    Io {
        /// The session path.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The session JSON did not match the schema.
    #[error("session JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The simulation raised a programmer error while replaying.
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// A driver action whose RNG consumption differed from the recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RngMismatch {
    /// Index of the record in the session's action list.
    pub index: usize,
    /// Total draws expected after the action.
    pub expected: u64,
    /// Total draws observed after the action.
    pub actual: u64,
}

/// Outcome of a replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplayReport {
    /// Results of every driver action, in order.
    pub action_results: Vec<ActionResult>,
    /// Differences between the recorded and replayed final state.
    pub differences: Vec<StateDifference>,
    /// Driver actions whose RNG consumption diverged.
    pub rng_mismatches: Vec<RngMismatch>,
}

impl ReplayReport {
    /// Whether the replay reproduced the recording exactly.
    pub fn is_clean(&self) -> bool {
        self.differences.is_empty() && self.rng_mismatches.is_empty()
    }
}

/// Replays recorded sessions against a fixed configuration.
#[derive(Debug, Clone)]
pub struct SessionReplayer {
    config: SimConfig,
    tolerance: Tolerance,
}

impl SessionReplayer {
    /// A replayer using the given tuning.
    pub const fn new(config: SimConfig) -> Self {
        Self {
            config,
            tolerance: Tolerance::Exact,
        }
    }

    /// Accept numeric drift in the final state within `tolerance`.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Read and parse a session file.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Io`] or [`ReplayError::Json`].
    pub fn load(path: &Path) -> Result<RecordedSession, ReplayError> {
        let text = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse a session from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Json`] if the text does not match the schema.
    pub fn parse(text: &str) -> Result<RecordedSession, ReplayError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Replay a session.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::UnsupportedVersion`] for a foreign format and
    /// [`ReplayError::Sim`] if the simulation hits a programmer error.
    pub fn replay(&self, session: &RecordedSession) -> Result<ReplayReport, ReplayError> {
        if session.version != SESSION_VERSION {
            return Err(ReplayError::UnsupportedVersion {
                found: session.version,
            });
        }

        let mut ctx = SimulationContext::from_states(
            self.config.clone(),
            session.model_seed,
            session.initial_model.clone(),
            session.initial_relationships.clone(),
        );
        let mut report = ReplayReport::default();
        // Cumulative draws, tracked while every record so far carried a count.
        let mut expected_draws = Some(0_u64);

        for (index, record) in session.actions.iter().enumerate() {
            self.tick_until(&mut ctx, record.cumulative_time)?;
            expected_draws = expected_draws
                .zip(record.rng_call_count)
                .map(|(total, count)| total.saturating_add(count));
            if record.spontaneous {
                continue;
            }

            let result = ctx.execute(&request_of(record))?;
            report.action_results.push(result);

            if let Some(expected) = expected_draws {
                let actual = ctx.rng().call_count();
                if actual != expected {
                    warn!(index, expected, actual, action = %record.action, "RNG parity lost");
                    report.rng_mismatches.push(RngMismatch {
                        index,
                        expected,
                        actual,
                    });
                    expected_draws = None;
                }
            }
        }

        if let Some(final_model) = &session.final_model {
            self.tick_until(&mut ctx, final_model.elapsed)?;
            report
                .differences
                .extend(diff_states_within(
                    "model",
                    final_model,
                    &ctx.model().snapshot(),
                    self.tolerance,
                )?);
        }
        if let Some(final_relationships) = &session.final_relationships {
            report.differences.extend(diff_states_within(
                "relationships",
                final_relationships,
                &ctx.relationships().snapshot(),
                self.tolerance,
            )?);
        }

        for difference in &report.differences {
            warn!(
                path = %difference.path,
                expected = %difference.expected,
                actual = %difference.actual,
                "Replay diverged"
            );
        }
        info!(
            actions = report.action_results.len(),
            differences = report.differences.len(),
            rng_mismatches = report.rng_mismatches.len(),
            "Replay finished"
        );
        Ok(report)
    }

    /// Run whole ticks until elapsed time reaches `target`, to half a tick.
    fn tick_until(&self, ctx: &mut SimulationContext, target: f64) -> Result<(), SimError> {
        let half = self.config.time.tick_seconds / 2.0;
        while ctx.elapsed() + half <= target {
            ctx.advance_intervals(1)?;
        }
        Ok(())
    }
}

fn request_of(record: &RecordedAction) -> ActionRequest {
    ActionRequest {
        action: record.action,
        cloud_id: record.cloud_id.clone(),
        target_cloud_id: record.target_cloud_id.clone(),
        field: record.field,
        new_mode: record.new_mode,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ifs_types::{ActionKind, PartId};

    use super::*;
    use crate::scenario::Scenario;

    fn recorded_session() -> RecordedSession {
        let mut ctx = SimulationContext::new(SimConfig::default(), 99);
        Scenario::inner_critic().install(&mut ctx).unwrap();
        ctx.start_recording("test", "unit");
        ctx.execute(&ActionRequest::new(ActionKind::SelectATarget, "inner-critic"))
            .unwrap();
        ctx.advance(3.2).unwrap();
        ctx.execute(&ActionRequest::new(ActionKind::AskToWait, "inner-critic"))
            .unwrap();
        ctx.advance(1.0).unwrap();
        ctx.finish_recording().unwrap()
    }

    #[test]
    fn live_recording_replays_cleanly() {
        let session = recorded_session();
        let report = SessionReplayer::new(SimConfig::default())
            .replay(&session)
            .unwrap();
        assert_eq!(report.action_results.len(), 2);
        assert!(report.is_clean(), "{report:?}");
    }

    #[test]
    fn foreign_version_is_rejected() {
        let mut session = recorded_session();
        session.version = 2;
        let result = SessionReplayer::new(SimConfig::default()).replay(&session);
        assert!(matches!(
            result,
            Err(ReplayError::UnsupportedVersion { found: 2 })
        ));
    }

    #[test]
    fn tampered_final_state_is_reported() {
        let mut session = recorded_session();
        let criticized = PartId::from("criticized");
        if let Some(part) = session
            .final_model
            .as_mut()
            .and_then(|model| model.parts.get_mut(&criticized))
        {
            part.trust = 0.9;
        }
        let report = SessionReplayer::new(SimConfig::default())
            .replay(&session)
            .unwrap();
        assert_eq!(report.differences.len(), 1);
        assert_eq!(
            report.differences.first().map(|d| d.path.as_str()),
            Some("model.parts.criticized.trust")
        );
    }

    #[test]
    fn rounding_drift_needs_an_explicit_tolerance() {
        let mut session = recorded_session();
        let criticized = PartId::from("criticized");
        if let Some(part) = session
            .final_model
            .as_mut()
            .and_then(|model| model.parts.get_mut(&criticized))
        {
            part.trust += 1e-12;
        }
        let exact = SessionReplayer::new(SimConfig::default())
            .replay(&session)
            .unwrap();
        assert_eq!(exact.differences.len(), 1);

        let lenient = SessionReplayer::new(SimConfig::default())
            .with_tolerance(Tolerance::Relative(1e-9))
            .replay(&session)
            .unwrap();
        assert!(lenient.is_clean(), "{lenient:?}");
    }

    #[test]
    fn tampered_rng_count_is_reported() {
        let mut session = recorded_session();
        if let Some(record) = session.actions.get_mut(1) {
            record.rng_call_count = Some(5);
        }
        let report = SessionReplayer::new(SimConfig::default())
            .replay(&session)
            .unwrap();
        assert_eq!(report.rng_mismatches.len(), 1);
        assert_eq!(report.rng_mismatches.first().map(|m| m.index), Some(1));
    }
}
