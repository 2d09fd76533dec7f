//! Applies the effects of a resolved action to the model and relationships.
//!
//! Every mutation goes through the owners' own mutator methods. The
//! simulation context runs the applicator against a scratch copy and only
//! commits it when every effect applied, so a failed action never leaves
//! partial state behind.

use ifs_types::{ActionEffect, ActionResult, BlendReason};
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::error::SimError;
use crate::model::SimulationModel;
use crate::relationships::RelationshipManager;

/// Blend reduction for one `separate`: higher need resists separation.
pub fn separation_amount(base: f64, need_attention: f64) -> f64 {
    base / (1.0 + need_attention.max(0.0))
}

/// Mutable access to the state an action can change.
#[derive(Debug)]
pub struct EffectApplicator<'a> {
    model: &'a mut SimulationModel,
    relationships: &'a mut RelationshipManager,
    config: &'a SimConfig,
}

impl<'a> EffectApplicator<'a> {
    /// Borrow the state to mutate.
    pub const fn new(
        model: &'a mut SimulationModel,
        relationships: &'a mut RelationshipManager,
        config: &'a SimConfig,
    ) -> Self {
        Self {
            model,
            relationships,
            config,
        }
    }

    /// Apply every effect of a successful result, in order.
    ///
    /// Unsuccessful results carry no effects and are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownPart`] if an effect names an unregistered
    /// part. Effects before the failing one have already been applied.
    pub fn apply(&mut self, result: &ActionResult) -> Result<(), SimError> {
        if !result.success {
            return Ok(());
        }
        for effect in &result.effects {
            self.apply_effect(effect)?;
        }
        Ok(())
    }

    fn apply_effect(&mut self, effect: &ActionEffect) -> Result<(), SimError> {
        match effect {
            ActionEffect::AddTarget { part } => self.model.add_target_cloud(part)?,
            ActionEffect::RemoveTarget { part } => {
                self.model.remove_target(part);
            }
            ActionEffect::SetMode { mode } => self.model.set_mode(*mode),
            ActionEffect::Blend {
                part,
                reason,
                degree,
            } => self.model.add_blended_part(part, *reason, *degree)?,
            ActionEffect::ReduceBlending { part, base } => {
                let need = self.model.part(part).map_or(0.0, |p| p.need_attention);
                let amount = separation_amount(*base, need);
                let remaining = self.model.reduce_blending(part, amount);
                debug!(part = %part, amount, remaining, "Blending reduced");
            }
            ActionEffect::RevealBiography { part, field } => {
                self.model.reveal_biography(part, *field)?;
            }
            ActionEffect::AdjustTrust { part, delta } => {
                self.model.adjust_trust(part, *delta)?;
            }
            ActionEffect::ResetAttention { part } => self.model.reset_need_attention(part)?,
            ActionEffect::AgreeToWait { part, duration } => {
                let until = self.model.elapsed() + duration;
                self.model.set_agreed_wait_until(part, until)?;
            }
            ActionEffect::ThoughtBubble { part, text } => {
                self.model
                    .add_thought_bubble(part, text, self.config.messages.bubble_duration);
            }
            ActionEffect::Backlash {
                protector,
                protectee,
            } => self.backlash(protector, protectee)?,
            ActionEffect::CreateSelfRay { part } => self.model.set_self_ray(part)?,
            ActionEffect::ClearSelfRay => self.model.clear_self_ray(),
            ActionEffect::ConsumeProxy { part, proxy } => {
                self.relationships.remove_proxy(part, proxy);
                self.model.mark_proxy(proxy)?;
            }
            ActionEffect::ResolveGrievance { holder, target } => {
                self.relationships.resolve_grievance(holder, target);
            }
        }
        Ok(())
    }

    /// The protector re-blends with a spike of need, the protectee loses
    /// trust and is pushed out of the conference.
    fn backlash(
        &mut self,
        protector: &ifs_types::PartId,
        protectee: &ifs_types::PartId,
    ) -> Result<(), SimError> {
        self.model
            .adjust_trust(protectee, -self.config.trust.backlash_penalty)?;
        self.model
            .add_need_attention(protector, self.config.blending.backlash_attention_spike)?;
        self.model
            .add_blended_part(protector, BlendReason::Backlash, 1.0)?;
        self.model.remove_target(protectee);
        if self.model.self_ray_target() == Some(protectee) {
            self.model.clear_self_ray();
        }
        let line = self
            .model
            .part(protector)
            .and_then(|p| p.dialogues.blended.first())
            .cloned();
        if let Some(line) = line {
            self.model
                .add_thought_bubble(protector, &line, self.config.messages.bubble_duration);
        }
        info!(protector = %protector, protectee = %protectee, "Backlash");
        Ok(())
    }
}
