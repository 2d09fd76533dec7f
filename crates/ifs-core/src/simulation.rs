//! The simulation context: single owner of all mutable simulator state.
//!
//! [`SimulationContext`] wires the model, relationship graph, RNG, message
//! orchestrator, time advancer, observer and optional recorder together and
//! is the only way to drive them. It exposes three kinds of entry points:
//!
//! - setup (`register_part`, `add_target_cloud`, `add_blended_part`,
//!   `add_protection`, `set_grievance`, `add_proxy`),
//! - actions (`execute`, `execute_action`),
//! - time (`advance`, `advance_intervals`).

use std::collections::BTreeSet;

use ifs_types::{
    ActionKind, ActionRequest, ActionResult, BiographyField, BlendReason, ModelState, PartConfig,
    PartId, RecordedSession, RelationshipState, SimulationMode,
};
use tracing::info;

use crate::actions::{self, ActionContext};
use crate::applicator::EffectApplicator;
use crate::clock::TimeAdvancer;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::messages::{Message, MessageOrchestrator};
use crate::model::SimulationModel;
use crate::recorder::ActionRecorder;
use crate::relationships::RelationshipManager;
use crate::rng::SimRng;
use crate::tick::{self, SpontaneousBlend, TickState, TickSummary};

/// RNG log entries kept for inspection while nothing is recording.
const UNRECORDED_LOG_WINDOW: u64 = 1024;

/// Callback invoked when the simulation does something on its own.
///
/// The embedding layer uses it to animate spontaneous blends and message
/// deliveries. The core never waits on it.
pub trait SimulationObserver {
    /// A part took over because its need for attention became urgent.
    fn on_spontaneous_blend(&mut self, blend: &SpontaneousBlend, model: &ModelState);

    /// A message reached its recipient.
    fn on_message(&mut self, _message: &Message) {}
}

/// An observer that ignores everything.
pub struct NoOpObserver;

impl SimulationObserver for NoOpObserver {
    fn on_spontaneous_blend(&mut self, _blend: &SpontaneousBlend, _model: &ModelState) {}
}

/// Whether the system is self-led: nothing blended, no outstanding
/// grievance, every protector has consented and every part trusts enough.
pub fn self_leadership_reached(
    model: &SimulationModel,
    relationships: &RelationshipManager,
    config: &SimConfig,
) -> bool {
    model.parts().next().is_some()
        && model.state().blended.is_empty()
        && !relationships.has_outstanding_grievances()
        && relationships.protectors().all(|protector| {
            model
                .part(protector)
                .is_some_and(|p| p.biography.is_revealed(BiographyField::Consent))
        })
        && model
            .parts()
            .all(|p| p.trust >= config.victory.min_trust)
}

/// Owner of every piece of mutable simulator state.
pub struct SimulationContext {
    config: SimConfig,
    model: SimulationModel,
    relationships: RelationshipManager,
    rng: SimRng,
    orchestrator: MessageOrchestrator,
    advancer: TimeAdvancer,
    observer: Box<dyn SimulationObserver>,
    recorder: Option<ActionRecorder>,
}

impl SimulationContext {
    /// An empty simulation seeded with `seed`.
    pub fn new(config: SimConfig, seed: u64) -> Self {
        Self::from_states(
            config,
            seed,
            ModelState::default(),
            RelationshipState::default(),
        )
    }

    /// A simulation restored from serialized state, with fresh timers and a
    /// freshly seeded RNG.
    pub fn from_states(
        config: SimConfig,
        seed: u64,
        model: ModelState,
        relationships: RelationshipState,
    ) -> Self {
        let advancer = TimeAdvancer::new(config.time.tick_seconds);
        Self {
            config,
            model: SimulationModel::from_state(model),
            relationships: RelationshipManager::from_state(relationships),
            rng: SimRng::new(seed),
            orchestrator: MessageOrchestrator::new(),
            advancer,
            observer: Box::new(NoOpObserver),
            recorder: None,
        }
    }

    /// Replace the observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn SimulationObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Tuning in effect.
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The model.
    pub const fn model(&self) -> &SimulationModel {
        &self.model
    }

    /// The relationship graph.
    pub const fn relationships(&self) -> &RelationshipManager {
        &self.relationships
    }

    /// The seeded RNG, for call-count introspection.
    pub const fn rng(&self) -> &SimRng {
        &self.rng
    }

    /// Simulated seconds processed in full ticks.
    pub const fn elapsed(&self) -> f64 {
        self.model.elapsed()
    }

    /// Ticks processed since creation or the start of recording.
    pub const fn ticks(&self) -> u64 {
        self.advancer.ticks()
    }

    /// Whether self-leadership has been achieved.
    pub const fn is_victory(&self) -> bool {
        self.model.victory()
    }

    // -----------------------------------------------------------------------
    // Setup
    // -----------------------------------------------------------------------

    /// Register a part.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DuplicatePart`] if the id is taken.
    pub fn register_part(&mut self, config: PartConfig) -> Result<(), SimError> {
        self.model.register_part(config)
    }

    /// Put a registered part into the conference.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownPart`] for an unregistered id.
    pub fn add_target_cloud(&mut self, id: &PartId) -> Result<(), SimError> {
        self.model.add_target_cloud(id)
    }

    /// Blend a registered part.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownPart`] for an unregistered id.
    pub fn add_blended_part(
        &mut self,
        id: &PartId,
        reason: BlendReason,
        degree: f64,
    ) -> Result<(), SimError> {
        self.model.add_blended_part(id, reason, degree)
    }

    /// Add a protection edge between two registered parts.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownPart`] if either id is unregistered.
    pub fn add_protection(&mut self, protector: &PartId, protected: &PartId) -> Result<(), SimError> {
        self.require_part(protector)?;
        self.require_part(protected)?;
        self.relationships.add_protection(protector, protected);
        Ok(())
    }

    /// Give a registered part a grievance against registered targets.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownPart`] for an unregistered id, or the
    /// relationship manager's error for an empty grievance.
    pub fn set_grievance(
        &mut self,
        holder: &PartId,
        targets: impl IntoIterator<Item = PartId>,
        lines: Vec<String>,
    ) -> Result<(), SimError> {
        self.require_part(holder)?;
        let targets = targets.into_iter().collect::<BTreeSet<_>>();
        for target in &targets {
            self.require_part(target)?;
        }
        self.relationships.set_grievance(holder, targets, lines)
    }

    /// Add a proxy edge between two registered parts.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownPart`] for an unregistered id or
    /// [`SimError::SelfProxy`] if both ids are the same.
    pub fn add_proxy(&mut self, part: &PartId, proxy: &PartId) -> Result<(), SimError> {
        self.require_part(part)?;
        self.require_part(proxy)?;
        self.relationships.add_proxy(part, proxy)
    }

    fn require_part(&self, id: &PartId) -> Result<(), SimError> {
        if self.model.has_part(id) {
            Ok(())
        } else {
            Err(SimError::UnknownPart(id.clone()))
        }
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Execute an action given as wire strings.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownAction`] for an action id outside the
    /// catalogue and [`SimError::InvalidArgument`] for an unparseable field or
    /// mode. Unknown cloud ids are domain failures, not errors.
    pub fn execute_action(
        &mut self,
        action: &str,
        cloud_id: &str,
        target_cloud_id: Option<&str>,
        field: Option<&str>,
        new_mode: Option<&str>,
    ) -> Result<ActionResult, SimError> {
        let action = action
            .parse::<ActionKind>()
            .map_err(|err| SimError::UnknownAction { action: err.value })?;
        let request = ActionRequest {
            action,
            cloud_id: PartId::from(cloud_id),
            target_cloud_id: target_cloud_id.map(PartId::from),
            field: field.map(str::parse::<BiographyField>).transpose()?,
            new_mode: new_mode.map(str::parse::<SimulationMode>).transpose()?,
        };
        self.execute(&request)
    }

    /// Validate, resolve and apply one action.
    ///
    /// Either every effect applies or none does. Victory is re-evaluated
    /// after each successful action.
    ///
    /// # Errors
    ///
    /// Returns [`SimError`] only if an effect names an unregistered part,
    /// which validation rules out.
    pub fn execute(&mut self, request: &ActionRequest) -> Result<ActionResult, SimError> {
        let result = {
            let ctx = ActionContext::new(&self.model, &self.relationships, &self.config);
            actions::execute_action(request, &ctx, &mut self.rng)
        };

        if result.success {
            let mut model = self.model.clone();
            let mut relationships = self.relationships.clone();
            EffectApplicator::new(&mut model, &mut relationships, &self.config).apply(&result)?;
            if !model.victory() && self_leadership_reached(&model, &relationships, &self.config) {
                model.set_victory();
                info!(elapsed = model.elapsed(), "Self-leadership achieved");
            }
            self.model = model;
            self.relationships = relationships;
        }

        if let Some(recorder) = &mut self.recorder {
            recorder.record_action(request, self.model.elapsed(), &self.rng);
        }
        self.trim_rng_log();
        Ok(result)
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Feed simulated time and run every tick that completes.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::TooManyTicks`] without consuming the time when
    /// the feed exceeds `time.max_ticks_per_advance`, and propagates the
    /// first tick error.
    pub fn advance(&mut self, delta: f64) -> Result<Vec<TickSummary>, SimError> {
        let due = self.advancer.due_after(delta);
        let limit = self.config.time.max_ticks_per_advance;
        if due > limit {
            return Err(SimError::TooManyTicks { delta, due, limit });
        }
        if let Some(recorder) = &mut self.recorder {
            recorder.note_fed(delta);
        }
        let due = self.advancer.feed(delta);
        (0..due).map(|_| self.tick()).collect()
    }

    /// Run exactly `count` ticks.
    ///
    /// # Errors
    ///
    /// Propagates the first tick error.
    pub fn advance_intervals(&mut self, count: u32) -> Result<Vec<TickSummary>, SimError> {
        (0..count)
            .map(|_| {
                let tick_seconds = self.advancer.tick_seconds();
                if let Some(recorder) = &mut self.recorder {
                    recorder.note_fed(tick_seconds);
                }
                self.tick()
            })
            .collect()
    }

    fn tick(&mut self) -> Result<TickSummary, SimError> {
        let tick = self.advancer.record_tick();
        let summary = tick::run_tick(
            TickState {
                model: &mut self.model,
                relationships: &self.relationships,
                rng: &mut self.rng,
                orchestrator: &mut self.orchestrator,
                config: &self.config,
            },
            tick,
        )?;

        if let Some(recorder) = &mut self.recorder {
            recorder.note_tick(self.advancer.tick_seconds());
        }
        for message in &summary.messages {
            self.observer.on_message(message);
        }
        if let Some(blend) = &summary.spontaneous {
            self.observer.on_spontaneous_blend(blend, self.model.state());
            if let Some(recorder) = &mut self.recorder {
                recorder.record_spontaneous(blend, summary.elapsed, &self.rng);
            }
        }
        self.trim_rng_log();
        Ok(summary)
    }

    /// Keep only the draws the recorder has not yet claimed, or a bounded
    /// window of recent draws when not recording.
    fn trim_rng_log(&mut self) {
        let keep_from = self.recorder.as_ref().map_or_else(
            || self.rng.call_count().saturating_sub(UNRECORDED_LOG_WINDOW),
            ActionRecorder::last_rng_count,
        );
        self.rng.discard_log_before(keep_from);
    }

    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    /// Start recording from the current state.
    ///
    /// The RNG is re-seeded and timers restart so that a replay from the
    /// captured state runs the same draws.
    pub fn start_recording(&mut self, code_version: &str, platform: &str) {
        let seed = self.rng.seed();
        self.rng = SimRng::new(seed);
        self.orchestrator.reset();
        self.advancer.reset();
        self.recorder = Some(ActionRecorder::start(
            code_version,
            platform,
            seed,
            self.model.snapshot(),
            self.relationships.snapshot(),
        ));
        info!(seed, elapsed = self.model.elapsed(), "Recording started");
    }

    /// Whether a recording is in progress.
    pub const fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    /// Stop recording and return the session with its final state.
    pub fn finish_recording(&mut self) -> Option<RecordedSession> {
        let recorder = self.recorder.take()?;
        let session = recorder.finish(self.model.snapshot(), self.relationships.snapshot());
        info!(actions = session.actions.len(), "Recording finished");
        Some(session)
    }
}
