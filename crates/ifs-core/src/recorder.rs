//! Captures a session for deterministic replay.
//!
//! The recorder is fed by the simulation context: time fed, ticks run,
//! actions executed and spontaneous blends. Each record carries the RNG draws
//! consumed since the previous record, so the counts of all records sum to
//! the RNG call count of the session.

use chrono::Utc;
use ifs_types::{
    ActionRequest, ModelState, RecordedAction, RecordedSession, RelationshipState,
    SESSION_VERSION,
};

use crate::rng::SimRng;
use crate::tick::SpontaneousBlend;

/// In-progress recording.
#[derive(Debug, Clone)]
pub struct ActionRecorder {
    session: RecordedSession,
    last_rng_count: u64,
    fed_since_last: f64,
    effective_since_last: f64,
}

impl ActionRecorder {
    /// Start recording from the given initial state.
    ///
    /// The RNG the session runs with must be freshly seeded with `seed`.
    pub fn start(
        code_version: &str,
        platform: &str,
        seed: u64,
        initial_model: ModelState,
        initial_relationships: RelationshipState,
    ) -> Self {
        Self {
            session: RecordedSession {
                version: SESSION_VERSION,
                code_version: code_version.to_owned(),
                platform: platform.to_owned(),
                model_seed: seed,
                timestamp: Utc::now(),
                initial_model,
                initial_relationships,
                actions: Vec::new(),
                final_model: None,
                final_relationships: None,
            },
            last_rng_count: 0,
            fed_since_last: 0.0,
            effective_since_last: 0.0,
        }
    }

    /// Note simulated time fed to the advancer.
    pub fn note_fed(&mut self, delta: f64) {
        if delta.is_finite() && delta > 0.0 {
            self.fed_since_last += delta;
        }
    }

    /// Note one full tick.
    pub fn note_tick(&mut self, tick_seconds: f64) {
        self.effective_since_last += tick_seconds;
    }

    /// Record a driver action after it executed.
    pub fn record_action(&mut self, request: &ActionRequest, cumulative_time: f64, rng: &SimRng) {
        let count = rng.call_count();
        let record = RecordedAction {
            action: request.action,
            cloud_id: request.cloud_id.clone(),
            target_cloud_id: request.target_cloud_id.clone(),
            field: request.field,
            new_mode: request.new_mode,
            elapsed_time: self.fed_since_last,
            effective_time: self.effective_since_last,
            cumulative_time,
            rng_call_count: Some(count.saturating_sub(self.last_rng_count)),
            rng_log: rng.log_since(self.last_rng_count),
            trigger_rng_count: None,
            pre_trigger_time: None,
            spontaneous: false,
        };
        self.push(record, count);
    }

    /// Record a spontaneous blend produced by a tick.
    pub fn record_spontaneous(&mut self, blend: &SpontaneousBlend, cumulative_time: f64, rng: &SimRng) {
        let count = blend.trigger_rng_count;
        let log = rng
            .log_since(self.last_rng_count)
            .into_iter()
            .filter(|entry| entry.index < count)
            .collect();
        let record = RecordedAction {
            action: ifs_types::ActionKind::Blend,
            cloud_id: blend.part.clone(),
            target_cloud_id: None,
            field: None,
            new_mode: None,
            elapsed_time: self.fed_since_last,
            effective_time: self.effective_since_last,
            cumulative_time,
            rng_call_count: Some(count.saturating_sub(self.last_rng_count)),
            rng_log: log,
            trigger_rng_count: Some(count),
            pre_trigger_time: Some(blend.pre_trigger_time),
            spontaneous: true,
        };
        self.push(record, count);
    }

    fn push(&mut self, record: RecordedAction, count: u64) {
        self.session.actions.push(record);
        self.last_rng_count = count;
        self.fed_since_last = 0.0;
        self.effective_since_last = 0.0;
    }

    /// RNG call count at the most recent record.
    pub const fn last_rng_count(&self) -> u64 {
        self.last_rng_count
    }

    /// The session recorded so far, without final state.
    pub const fn session(&self) -> &RecordedSession {
        &self.session
    }

    /// Close the recording with the final state.
    pub fn finish(
        mut self,
        final_model: ModelState,
        final_relationships: RelationshipState,
    ) -> RecordedSession {
        self.session.final_model = Some(final_model);
        self.session.final_relationships = Some(final_relationships);
        self.session
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ifs_types::{ActionKind, PartId};

    use super::*;

    #[test]
    fn counts_are_deltas_since_previous_record() {
        let mut rng = SimRng::new(4);
        let mut recorder = ActionRecorder::start(
            "0.1.0",
            "test",
            4,
            ModelState::default(),
            RelationshipState::default(),
        );
        let _ = rng.random("help_protected");
        recorder.note_fed(0.7);
        recorder.note_tick(0.5);
        recorder.record_action(
            &ActionRequest::new(ActionKind::HelpProtected, "inner-critic"),
            0.5,
            &rng,
        );
        let _ = rng.random("ask_to_wait");
        let _ = rng.random("attention_check");
        recorder.record_action(&ActionRequest::new(ActionKind::AskToWait, "criticized"), 0.5, &rng);

        let session = recorder.finish(ModelState::default(), RelationshipState::default());
        assert_eq!(session.version, SESSION_VERSION);
        let first = session.actions.first().unwrap();
        assert_eq!(first.rng_call_count, Some(1));
        assert!((first.elapsed_time - 0.7).abs() < 1e-12);
        assert!((first.effective_time - 0.5).abs() < 1e-12);
        let second = session.actions.get(1).unwrap();
        assert_eq!(second.rng_call_count, Some(2));
        assert_eq!(second.rng_log.len(), 2);
        assert!(second.elapsed_time.abs() < f64::EPSILON);
        assert!(session.final_model.is_some());
    }

    #[test]
    fn spontaneous_record_carries_trigger() {
        let mut rng = SimRng::new(4);
        let _ = rng.random("attention_check");
        let mut recorder = ActionRecorder::start(
            "0.1.0",
            "test",
            4,
            ModelState::default(),
            RelationshipState::default(),
        );
        let blend = SpontaneousBlend {
            part: PartId::from("criticized"),
            need_attention: 1.3,
            trigger_rng_count: 1,
            pre_trigger_time: 12.0,
        };
        recorder.record_spontaneous(&blend, 12.5, &rng);
        let record = recorder.session().actions.first().unwrap();
        assert!(record.spontaneous);
        assert_eq!(record.action, ActionKind::Blend);
        assert_eq!(record.trigger_rng_count, Some(1));
        assert!(
            record
                .pre_trigger_time
                .is_some_and(|t| (t - 12.0).abs() < f64::EPSILON)
        );
        assert_eq!(record.rng_call_count, Some(1));
    }
}
