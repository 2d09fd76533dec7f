//! The simulation model: parts, conference targets, blending, self-ray,
//! thought bubbles and the victory flag.
//!
//! [`SimulationModel`] is the single writer of [`ModelState`]. Callers read
//! through [`SimulationModel::state`] and mutate only through the methods
//! here, which keep the invariants:
//!
//! - trust stays within `[0, 1]` and need-attention never goes negative,
//! - biography flags only go from `false` to `true`,
//! - a blend degree is in `(0, 1]`; reaching 0 removes the part from the
//!   blended set,
//! - victory, once reached, stays.

use ifs_types::{
    BiographyField, BlendReason, BlendState, ModelState, PartConfig, PartId, PartState, SelfRay,
    SimulationMode, ThoughtBubble,
};
use tracing::debug;

use crate::error::SimError;

/// Owner of the mutable model state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationModel {
    state: ModelState,
}

impl SimulationModel {
    /// An empty model in panorama mode at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a model from a serialized state.
    pub const fn from_state(state: ModelState) -> Self {
        Self { state }
    }

    /// Read-only view of the full state.
    pub const fn state(&self) -> &ModelState {
        &self.state
    }

    /// Clone the full state for recording.
    pub fn snapshot(&self) -> ModelState {
        self.state.clone()
    }

    // -----------------------------------------------------------------------
    // Parts
    // -----------------------------------------------------------------------

    /// Register a part from its scenario config.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DuplicatePart`] if the id is already taken.
    pub fn register_part(&mut self, config: PartConfig) -> Result<(), SimError> {
        if self.state.parts.contains_key(&config.id) {
            return Err(SimError::DuplicatePart(config.id));
        }
        let part = PartState::from_config(config);
        debug!(part = %part.id, trust = part.trust, "Part registered");
        self.state.parts.insert(part.id.clone(), part);
        Ok(())
    }

    /// Whether a part with this id exists.
    pub fn has_part(&self, id: &PartId) -> bool {
        self.state.parts.contains_key(id)
    }

    /// Look up a part.
    pub fn part(&self, id: &PartId) -> Option<&PartState> {
        self.state.parts.get(id)
    }

    /// Every part, ordered by id.
    pub fn parts(&self) -> impl Iterator<Item = &PartState> {
        self.state.parts.values()
    }

    fn part_mut(&mut self, id: &PartId) -> Result<&mut PartState, SimError> {
        self.state
            .parts
            .get_mut(id)
            .ok_or_else(|| SimError::UnknownPart(id.clone()))
    }

    /// Shift a part's trust, clamping into `[0, 1]`.
    pub fn adjust_trust(&mut self, id: &PartId, delta: f64) -> Result<f64, SimError> {
        let part = self.part_mut(id)?;
        part.trust = (part.trust + delta).clamp(0.0, 1.0);
        Ok(part.trust)
    }

    /// Add to a part's attention need (floored at zero).
    pub fn add_need_attention(&mut self, id: &PartId, amount: f64) -> Result<(), SimError> {
        let part = self.part_mut(id)?;
        part.need_attention = (part.need_attention + amount).max(0.0);
        Ok(())
    }

    /// Reset a part's attention need to zero.
    pub fn reset_need_attention(&mut self, id: &PartId) -> Result<(), SimError> {
        self.part_mut(id)?.need_attention = 0.0;
        Ok(())
    }

    /// Record that a part will not demand attention before `until`.
    pub fn set_agreed_wait_until(&mut self, id: &PartId, until: f64) -> Result<(), SimError> {
        self.part_mut(id)?.agreed_wait_until = until;
        Ok(())
    }

    /// Whether a part is still honouring an agreement to wait.
    pub fn is_waiting(&self, id: &PartId) -> bool {
        self.part(id)
            .is_some_and(|p| p.agreed_wait_until > self.state.elapsed)
    }

    /// Mark a part as having surfaced as a proxy.
    pub fn mark_proxy(&mut self, id: &PartId) -> Result<(), SimError> {
        self.part_mut(id)?.was_proxy = true;
        Ok(())
    }

    /// Mark a part as having received a grievance.
    pub fn mark_attacked(&mut self, id: &PartId) -> Result<(), SimError> {
        self.part_mut(id)?.attacked = true;
        Ok(())
    }

    /// Reveal a biography field. Returns whether the flag was newly set.
    pub fn reveal_biography(&mut self, id: &PartId, field: BiographyField) -> Result<bool, SimError> {
        let bio = &mut self.part_mut(id)?.biography;
        let flag = match field {
            BiographyField::Age => &mut bio.age_revealed,
            BiographyField::Identity => &mut bio.identity_revealed,
            BiographyField::Job => &mut bio.job_revealed,
            BiographyField::Relationships => &mut bio.relationships_revealed,
            BiographyField::Consent => &mut bio.consent_revealed,
            BiographyField::SelfReaction => &mut bio.self_reaction_revealed,
        };
        let newly = !*flag;
        *flag = true;
        Ok(newly)
    }

    // -----------------------------------------------------------------------
    // Conference and blending
    // -----------------------------------------------------------------------

    /// Put a part into the conference.
    pub fn add_target_cloud(&mut self, id: &PartId) -> Result<(), SimError> {
        if !self.has_part(id) {
            return Err(SimError::UnknownPart(id.clone()));
        }
        self.state.targets.insert(id.clone());
        Ok(())
    }

    /// Take a part out of the conference. Returns whether it was present.
    pub fn remove_target(&mut self, id: &PartId) -> bool {
        self.state.targets.remove(id)
    }

    /// Whether a part is in the conference.
    pub fn is_target(&self, id: &PartId) -> bool {
        self.state.targets.contains(id)
    }

    /// Blend a part. The degree is clamped into `[0, 1]`; a degree of zero
    /// unblends it.
    pub fn add_blended_part(
        &mut self,
        id: &PartId,
        reason: BlendReason,
        degree: f64,
    ) -> Result<(), SimError> {
        if !self.has_part(id) {
            return Err(SimError::UnknownPart(id.clone()));
        }
        let degree = degree.clamp(0.0, 1.0);
        if degree <= 0.0 {
            self.state.blended.remove(id);
        } else {
            self.state
                .blended
                .insert(id.clone(), BlendState { reason, degree });
        }
        Ok(())
    }

    /// Lower a part's blend degree by `amount`. Returns the remaining degree;
    /// the part leaves the blended set when it reaches zero.
    pub fn reduce_blending(&mut self, id: &PartId, amount: f64) -> f64 {
        let Some(blend) = self.state.blended.get_mut(id) else {
            return 0.0;
        };
        blend.degree = (blend.degree - amount.max(0.0)).max(0.0);
        let remaining = blend.degree;
        if remaining <= 0.0 {
            self.state.blended.remove(id);
            debug!(part = %id, "Part fully separated");
        }
        remaining
    }

    /// Blend state of a part, if blended.
    pub fn blend_state(&self, id: &PartId) -> Option<&BlendState> {
        self.state.blended.get(id)
    }

    /// Whether a part is blended.
    pub fn is_blended(&self, id: &PartId) -> bool {
        self.state.blended.contains_key(id)
    }

    /// Blended parts, ordered by id.
    pub fn blended_parts(&self) -> impl Iterator<Item = &PartId> {
        self.state.blended.keys()
    }

    /// Whether a part is in the conference or blended.
    pub fn is_present(&self, id: &PartId) -> bool {
        self.is_target(id) || self.is_blended(id)
    }

    // -----------------------------------------------------------------------
    // Global state
    // -----------------------------------------------------------------------

    /// Current simulation mode.
    pub const fn mode(&self) -> SimulationMode {
        self.state.mode
    }

    /// Change the simulation mode.
    pub const fn set_mode(&mut self, mode: SimulationMode) {
        self.state.mode = mode;
    }

    /// Point the self-ray at a part.
    pub fn set_self_ray(&mut self, id: &PartId) -> Result<(), SimError> {
        if !self.has_part(id) {
            return Err(SimError::UnknownPart(id.clone()));
        }
        self.state.self_ray = Some(SelfRay {
            part: id.clone(),
            created_at: self.state.elapsed,
        });
        Ok(())
    }

    /// Remove the self-ray.
    pub fn clear_self_ray(&mut self) {
        self.state.self_ray = None;
    }

    /// The part the self-ray points at.
    pub fn self_ray_target(&self) -> Option<&PartId> {
        self.state.self_ray.as_ref().map(|ray| &ray.part)
    }

    /// Show a bubble over a part until `elapsed + duration`.
    pub fn add_thought_bubble(&mut self, part: &PartId, text: &str, duration: f64) {
        self.state.thought_bubbles.push(ThoughtBubble {
            part: part.clone(),
            text: text.to_owned(),
            expires_at: self.state.elapsed + duration,
        });
    }

    /// Drop bubbles whose expiry has passed.
    pub fn prune_thought_bubbles(&mut self) {
        let now = self.state.elapsed;
        self.state.thought_bubbles.retain(|b| b.expires_at > now);
    }

    /// Simulated seconds processed in full ticks.
    pub const fn elapsed(&self) -> f64 {
        self.state.elapsed
    }

    /// Advance the simulated clock by one tick.
    pub fn advance_elapsed(&mut self, seconds: f64) {
        self.state.elapsed += seconds;
    }

    /// Whether self-leadership has been achieved.
    pub const fn victory(&self) -> bool {
        self.state.victory
    }

    /// Latch the victory flag.
    pub const fn set_victory(&mut self) {
        self.state.victory = true;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ifs_types::{Biography, Dialogues};

    use super::*;

    fn part(id: &str, trust: f64) -> PartConfig {
        PartConfig {
            id: PartId::from(id),
            name: id.to_owned(),
            trust,
            need_attention: 0.0,
            biography: Biography::default(),
            dialogues: Dialogues::default(),
        }
    }

    fn model() -> SimulationModel {
        let mut model = SimulationModel::new();
        model.register_part(part("inner-critic", 0.3)).unwrap();
        model.register_part(part("criticized", 0.2)).unwrap();
        model
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut model = model();
        let result = model.register_part(part("criticized", 0.9));
        assert!(matches!(result, Err(SimError::DuplicatePart(_))));
    }

    #[test]
    fn trust_is_clamped() {
        let mut model = model();
        let id = PartId::from("criticized");
        assert!((model.adjust_trust(&id, 5.0).unwrap() - 1.0).abs() < f64::EPSILON);
        assert!(model.adjust_trust(&id, -5.0).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_part_mutation_fails() {
        let mut model = model();
        let ghost = PartId::from("ghost");
        assert!(matches!(
            model.adjust_trust(&ghost, 0.1),
            Err(SimError::UnknownPart(_))
        ));
        assert!(model.add_target_cloud(&ghost).is_err());
    }

    #[test]
    fn biography_flags_are_monotone() {
        let mut model = model();
        let id = PartId::from("inner-critic");
        assert!(model.reveal_biography(&id, BiographyField::Job).unwrap());
        assert!(!model.reveal_biography(&id, BiographyField::Job).unwrap());
        assert!(model.part(&id).unwrap().biography.job_revealed);
    }

    #[test]
    fn reduce_blending_removes_at_zero() {
        let mut model = model();
        let id = PartId::from("inner-critic");
        model
            .add_blended_part(&id, BlendReason::Spontaneous, 1.0)
            .unwrap();
        let remaining = model.reduce_blending(&id, 0.4);
        assert!((remaining - 0.6).abs() < 1e-12);
        assert!(model.is_blended(&id));
        let remaining = model.reduce_blending(&id, 0.9);
        assert!(remaining.abs() < f64::EPSILON);
        assert!(!model.is_blended(&id));
    }

    #[test]
    fn blend_degree_is_clamped() {
        let mut model = model();
        let id = PartId::from("criticized");
        model.add_blended_part(&id, BlendReason::Manual, 3.0).unwrap();
        assert!((model.blend_state(&id).unwrap().degree - 1.0).abs() < f64::EPSILON);
        model.add_blended_part(&id, BlendReason::Manual, -1.0).unwrap();
        assert!(!model.is_blended(&id));
    }

    #[test]
    fn bubbles_expire_with_elapsed_time() {
        let mut model = model();
        let id = PartId::from("inner-critic");
        model.add_thought_bubble(&id, "hello", 1.0);
        model.advance_elapsed(0.5);
        model.prune_thought_bubbles();
        assert_eq!(model.state().thought_bubbles.len(), 1);
        model.advance_elapsed(0.5);
        model.prune_thought_bubbles();
        assert!(model.state().thought_bubbles.is_empty());
    }

    #[test]
    fn presence_covers_targets_and_blended() {
        let mut model = model();
        let critic = PartId::from("inner-critic");
        let criticized = PartId::from("criticized");
        model.add_target_cloud(&critic).unwrap();
        model
            .add_blended_part(&criticized, BlendReason::Spontaneous, 0.5)
            .unwrap();
        assert!(model.is_present(&critic));
        assert!(model.is_present(&criticized));
        assert!(model.remove_target(&critic));
        assert!(!model.is_present(&critic));
    }
}
