//! Timed inter-part messages: grievances and blended dialogue.
//!
//! The orchestrator decides *when* a message fires and *what* it says. The
//! view layer decides how it looks. Grievances fire per holder once their
//! cooldown has run and one of their targets is present; they arrive in the
//! same tick (`immediate`) or after a travel time (`travel`). Blended
//! dialogue is spoken by the blended part itself and always lands at once.

use std::collections::BTreeMap;

use ifs_types::{DeliveryMode, MessageKind, PartId};
use tracing::debug;

use crate::config::SimConfig;
use crate::error::SimError;
use crate::model::SimulationModel;
use crate::relationships::RelationshipManager;
use crate::rng::SimRng;

/// A message that reached its recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Grievance or ambient dialogue.
    pub kind: MessageKind,
    /// The speaking part.
    pub sender: PartId,
    /// The part the message is aimed at, for grievances.
    pub recipient: Option<PartId>,
    /// The line spoken.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
struct InFlight {
    message: Message,
    arrives_at: f64,
}

/// Per-holder timers and in-flight messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageOrchestrator {
    grievance_timers: BTreeMap<PartId, f64>,
    dialogue_timers: BTreeMap<PartId, f64>,
    in_flight: Vec<InFlight>,
}

impl MessageOrchestrator {
    /// An orchestrator with every timer at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every timer and drop in-flight messages.
    pub fn reset(&mut self) {
        self.grievance_timers.clear();
        self.dialogue_timers.clear();
        self.in_flight.clear();
    }

    /// Number of messages still travelling.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Advance timers by `dt` and deliver whatever is due.
    ///
    /// Returns the messages delivered during this call, in delivery order.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Rng`] if a line has to be picked from an empty
    /// list.
    pub fn tick(
        &mut self,
        dt: f64,
        model: &mut SimulationModel,
        relationships: &RelationshipManager,
        rng: &mut SimRng,
        config: &SimConfig,
    ) -> Result<Vec<Message>, SimError> {
        let mut delivered = Vec::new();

        // Arrivals first, so a message sent this tick never lands twice.
        let now = model.elapsed();
        let (arrived, travelling): (Vec<InFlight>, Vec<InFlight>) = self
            .in_flight
            .drain(..)
            .partition(|m| m.arrives_at <= now);
        self.in_flight = travelling;
        for flight in arrived {
            deliver(model, config, &flight.message)?;
            delivered.push(flight.message);
        }

        self.fire_grievances(dt, model, relationships, rng, config, &mut delivered)?;
        self.fire_blended_dialogue(dt, model, rng, config, &mut delivered)?;
        Ok(delivered)
    }

    fn fire_grievances(
        &mut self,
        dt: f64,
        model: &mut SimulationModel,
        relationships: &RelationshipManager,
        rng: &mut SimRng,
        config: &SimConfig,
        delivered: &mut Vec<Message>,
    ) -> Result<(), SimError> {
        self.grievance_timers
            .retain(|holder, _| relationships.grievance(holder).is_some());

        for (holder, grievance) in relationships.grievances() {
            let timer = self.grievance_timers.entry(holder.clone()).or_insert(0.0);
            *timer += dt;
            if *timer < config.messages.grievance_cooldown {
                continue;
            }
            let Some(target) = grievance.targets.iter().find(|t| model.is_present(t)) else {
                continue;
            };
            *timer = 0.0;
            let line = rng.pick("grievance_line", &grievance.lines)?;
            let message = Message {
                kind: MessageKind::Grievance,
                sender: holder.clone(),
                recipient: Some(target.clone()),
                text: line.clone(),
            };
            match config.messages.delivery {
                DeliveryMode::Immediate => {
                    deliver(model, config, &message)?;
                    delivered.push(message);
                }
                DeliveryMode::Travel => {
                    debug!(sender = %holder, recipient = %target, "Grievance sent");
                    self.in_flight.push(InFlight {
                        message,
                        arrives_at: model.elapsed() + config.messages.travel_time,
                    });
                }
            }
        }
        Ok(())
    }

    fn fire_blended_dialogue(
        &mut self,
        dt: f64,
        model: &mut SimulationModel,
        rng: &mut SimRng,
        config: &SimConfig,
        delivered: &mut Vec<Message>,
    ) -> Result<(), SimError> {
        self.dialogue_timers.retain(|part, _| model.is_blended(part));

        let speakers: Vec<(PartId, Vec<String>)> = model
            .blended_parts()
            .filter_map(|id| {
                model
                    .part(id)
                    .filter(|p| !p.dialogues.blended.is_empty())
                    .map(|p| (id.clone(), p.dialogues.blended.clone()))
            })
            .collect();

        for (speaker, lines) in speakers {
            let timer = self.dialogue_timers.entry(speaker.clone()).or_insert(0.0);
            *timer += dt;
            if *timer < config.messages.blended_dialogue_interval {
                continue;
            }
            *timer = 0.0;
            let line = rng.pick("blended_line", &lines)?;
            let message = Message {
                kind: MessageKind::BlendedDialogue,
                sender: speaker,
                recipient: None,
                text: line.clone(),
            };
            deliver(model, config, &message)?;
            delivered.push(message);
        }
        Ok(())
    }
}

fn deliver(
    model: &mut SimulationModel,
    config: &SimConfig,
    message: &Message,
) -> Result<(), SimError> {
    if let Some(recipient) = &message.recipient {
        model.mark_attacked(recipient)?;
        model.adjust_trust(recipient, -config.trust.grievance_penalty)?;
    }
    model.add_thought_bubble(&message.sender, &message.text, config.messages.bubble_duration);
    debug!(
        kind = ?message.kind,
        sender = %message.sender,
        recipient = ?message.recipient,
        "Message delivered"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use ifs_types::{BlendReason, Biography, Dialogues, PartConfig};

    use super::*;

    fn id(s: &str) -> PartId {
        PartId::from(s)
    }

    fn setup() -> (SimulationModel, RelationshipManager) {
        let mut model = SimulationModel::new();
        for (part, trust) in [("inner-critic", 0.3), ("criticized", 0.2)] {
            model
                .register_part(PartConfig {
                    id: id(part),
                    name: part.to_owned(),
                    trust,
                    need_attention: 0.0,
                    biography: Biography::default(),
                    dialogues: Dialogues {
                        blended: vec!["Ugh.".to_owned(), "Not now.".to_owned()],
                        ..Dialogues::default()
                    },
                })
                .unwrap();
        }
        let mut rel = RelationshipManager::new();
        rel.set_grievance(
            &id("inner-critic"),
            BTreeSet::from([id("criticized")]),
            vec!["You're hopeless.".to_owned()],
        )
        .unwrap();
        (model, rel)
    }

    fn run(
        orchestrator: &mut MessageOrchestrator,
        ticks: u32,
        model: &mut SimulationModel,
        rel: &RelationshipManager,
        rng: &mut SimRng,
        config: &SimConfig,
    ) -> Vec<Message> {
        let mut all = Vec::new();
        for _ in 0..ticks {
            model.advance_elapsed(config.time.tick_seconds);
            all.extend(
                orchestrator
                    .tick(config.time.tick_seconds, model, rel, rng, config)
                    .unwrap(),
            );
        }
        all
    }

    #[test]
    fn grievance_waits_for_present_target() {
        let (mut model, rel) = setup();
        let config = SimConfig::default();
        let mut rng = SimRng::new(1);
        let mut orch = MessageOrchestrator::new();

        let sent = run(&mut orch, 20, &mut model, &rel, &mut rng, &config);
        assert!(sent.is_empty());
        assert_eq!(rng.call_count(), 0);

        model.add_target_cloud(&id("criticized")).unwrap();
        let sent = run(&mut orch, 1, &mut model, &rel, &mut rng, &config);
        assert_eq!(sent.len(), 1);
        let message = sent.first().unwrap();
        assert_eq!(message.kind, MessageKind::Grievance);
        assert_eq!(message.recipient, Some(id("criticized")));

        let target = model.part(&id("criticized")).unwrap();
        assert!(target.attacked);
        assert!((target.trust - 0.18).abs() < 1e-12);
        assert_eq!(model.state().thought_bubbles.len(), 1);
    }

    #[test]
    fn grievance_respects_cooldown() {
        let (mut model, rel) = setup();
        model.add_target_cloud(&id("criticized")).unwrap();
        let config = SimConfig::default();
        let mut rng = SimRng::new(1);
        let mut orch = MessageOrchestrator::new();
        // 8s cooldown at 0.5s ticks fires on tick 16 and 32.
        let sent = run(&mut orch, 15, &mut model, &rel, &mut rng, &config);
        assert!(sent.is_empty());
        let sent = run(&mut orch, 17, &mut model, &rel, &mut rng, &config);
        assert_eq!(sent.len(), 2);
    }

    #[test]
    fn travel_delivery_arrives_later() {
        let (mut model, rel) = setup();
        model.add_target_cloud(&id("criticized")).unwrap();
        let mut config = SimConfig::default();
        config.messages.delivery = DeliveryMode::Travel;
        let mut rng = SimRng::new(1);
        let mut orch = MessageOrchestrator::new();

        let sent = run(&mut orch, 16, &mut model, &rel, &mut rng, &config);
        assert!(sent.is_empty());
        assert_eq!(orch.in_flight_count(), 1);
        assert!(!model.part(&id("criticized")).unwrap().attacked);

        // 1.5s travel is three ticks.
        let sent = run(&mut orch, 3, &mut model, &rel, &mut rng, &config);
        assert_eq!(sent.len(), 1);
        assert_eq!(orch.in_flight_count(), 0);
        assert!(model.part(&id("criticized")).unwrap().attacked);
    }

    #[test]
    fn blended_part_speaks_on_interval() {
        let mut model = setup().0;
        let rel = RelationshipManager::new();
        model
            .add_blended_part(&id("criticized"), BlendReason::Spontaneous, 1.0)
            .unwrap();
        let config = SimConfig::default();
        let mut rng = SimRng::new(1);
        let mut orch = MessageOrchestrator::new();

        let sent = run(&mut orch, 12, &mut model, &rel, &mut rng, &config);
        assert_eq!(sent.len(), 1);
        let message = sent.first().unwrap();
        assert_eq!(message.kind, MessageKind::BlendedDialogue);
        assert_eq!(message.sender, id("criticized"));
        assert_eq!(rng.call_count(), 1);
    }
}
