//! Core entity structs for the IFS simulator.
//!
//! These are plain data: every field is public so that the view layer, the
//! recorder and the tests can read them directly. Mutation rules (trust
//! clamping, monotone biography flags, blend removal at degree 0) are
//! enforced by the owners in `ifs-core`, which only hand out shared
//! references to these structs.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{BiographyField, BlendReason, SimulationMode};
use crate::ids::PartId;

// ---------------------------------------------------------------------------
// Biography and dialogue
// ---------------------------------------------------------------------------

/// Revealed-fact flags plus the scripted facts behind them.
///
/// A `*_revealed` flag gates whether the matching question yields new
/// information or an "already answered" outcome. Flags only ever go from
/// `false` to `true`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export, export_to = "bindings/")]
pub struct Biography {
    /// Whether the part's age has been revealed.
    pub age_revealed: bool,
    /// Whether the part's identity has been revealed.
    pub identity_revealed: bool,
    /// Whether the part's job has been revealed.
    pub job_revealed: bool,
    /// Whether the part's relationships have been revealed.
    pub relationships_revealed: bool,
    /// Whether the part has consented to work with its protectee.
    pub consent_revealed: bool,
    /// Whether the client's reaction toward the part has been explored.
    pub self_reaction_revealed: bool,
    /// Scripted age answer.
    pub age: Option<String>,
    /// Scripted identity answer.
    pub identity: Option<String>,
    /// Scripted job answer (short form).
    pub job: Option<String>,
    /// Scripted relationships answer.
    pub relationships: Option<String>,
}

impl Biography {
    /// Whether the given field has already been revealed.
    pub const fn is_revealed(&self, field: BiographyField) -> bool {
        match field {
            BiographyField::Age => self.age_revealed,
            BiographyField::Identity => self.identity_revealed,
            BiographyField::Job => self.job_revealed,
            BiographyField::Relationships => self.relationships_revealed,
            BiographyField::Consent => self.consent_revealed,
            BiographyField::SelfReaction => self.self_reaction_revealed,
        }
    }

    /// The scripted answer for a field, if the scenario provided one.
    pub fn fact(&self, field: BiographyField) -> Option<&str> {
        match field {
            BiographyField::Age => self.age.as_deref(),
            BiographyField::Identity => self.identity.as_deref(),
            BiographyField::Job => self.job.as_deref(),
            BiographyField::Relationships => self.relationships.as_deref(),
            BiographyField::Consent | BiographyField::SelfReaction => None,
        }
    }
}

/// Scripted text a part can speak, keyed by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export, export_to = "bindings/")]
pub struct Dialogues {
    /// How the part appraises its burdened job.
    pub burdened_job_appraisal: Option<String>,
    /// What the burdened job costs the system.
    pub burdened_job_impact: Option<String>,
    /// What the part would do once unburdened.
    pub unburdened_job: Option<String>,
    /// Ambient lines spoken while blended.
    pub blended: Vec<String>,
    /// Complaint lines delivered with grievances.
    pub grievance: Vec<String>,
}

// ---------------------------------------------------------------------------
// Parts
// ---------------------------------------------------------------------------

/// Scenario input describing one part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PartConfig {
    /// Identifier used by relationships and actions.
    pub id: PartId,
    /// Display name.
    pub name: String,
    /// Starting trust in the client's Self, in `[0, 1]`.
    pub trust: f64,
    /// Starting attention need.
    #[serde(default)]
    pub need_attention: f64,
    /// Starting biography (usually only the scripted facts).
    #[serde(default)]
    pub biography: Biography,
    /// Scripted dialogue.
    #[serde(default)]
    pub dialogues: Dialogues,
}

/// Live state of one part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PartState {
    /// Identifier.
    pub id: PartId,
    /// Display name.
    pub name: String,
    /// Trust in the client's Self, always within `[0, 1]`.
    pub trust: f64,
    /// Urgency scalar; grows over time and is compared with thresholds.
    pub need_attention: f64,
    /// Simulated time until which the part agreed not to demand attention.
    pub agreed_wait_until: f64,
    /// Whether the part has surfaced as a proxy for another part.
    pub was_proxy: bool,
    /// Whether the part has received a grievance.
    pub attacked: bool,
    /// Revealed facts.
    pub biography: Biography,
    /// Scripted dialogue.
    pub dialogues: Dialogues,
}

impl PartState {
    /// Build the initial state of a part from its scenario config.
    ///
    /// Trust is clamped into `[0, 1]` and attention need floored at 0.
    pub fn from_config(config: PartConfig) -> Self {
        Self {
            id: config.id,
            name: config.name,
            trust: config.trust.clamp(0.0, 1.0),
            need_attention: config.need_attention.max(0.0),
            agreed_wait_until: 0.0,
            was_proxy: false,
            attacked: false,
            biography: config.biography,
            dialogues: config.dialogues,
        }
    }
}

/// Blend state of one blended part.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct BlendState {
    /// Why the part blended.
    pub reason: BlendReason,
    /// How strongly it is blended, in `(0, 1]`.
    pub degree: f64,
}

/// Transient text shown over a part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ThoughtBubble {
    /// The speaking part.
    pub part: PartId,
    /// The text.
    pub text: String,
    /// Simulated time at which the bubble disappears.
    pub expires_at: f64,
}

/// The client's focused attention from Self toward one part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SelfRay {
    /// The part the ray points at.
    pub part: PartId,
    /// Simulated time the ray was created.
    pub created_at: f64,
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

/// A complaint one part holds against one or more others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Grievance {
    /// Parts the complaint is aimed at.
    pub targets: BTreeSet<PartId>,
    /// Scripted complaint lines.
    pub lines: Vec<String>,
}

// ---------------------------------------------------------------------------
// Aggregate state
// ---------------------------------------------------------------------------

/// Serializable state of the whole simulation model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ModelState {
    /// Every registered part.
    pub parts: BTreeMap<PartId, PartState>,
    /// Parts currently in the conference.
    pub targets: BTreeSet<PartId>,
    /// Blended parts and their blend state.
    pub blended: BTreeMap<PartId, BlendState>,
    /// The client's self-ray, if one exists.
    pub self_ray: Option<SelfRay>,
    /// Current simulation mode.
    pub mode: SimulationMode,
    /// Whether self-leadership has been achieved.
    pub victory: bool,
    /// Transient bubbles, oldest first.
    pub thought_bubbles: Vec<ThoughtBubble>,
    /// Simulated seconds processed in full ticks.
    pub elapsed: f64,
}

/// Serializable state of the relationship graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct RelationshipState {
    /// Protector to the set of parts it protects.
    pub protections: BTreeMap<PartId, BTreeSet<PartId>>,
    /// Grievance holder to its grievance.
    pub grievances: BTreeMap<PartId, Grievance>,
    /// Part to the proxies that stand in for the client when it looks.
    pub proxies: BTreeMap<PartId, BTreeSet<PartId>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(trust: f64) -> PartConfig {
        PartConfig {
            id: PartId::from("inner-critic"),
            name: String::from("Inner Critic"),
            trust,
            need_attention: -1.0,
            biography: Biography::default(),
            dialogues: Dialogues::default(),
        }
    }

    #[test]
    fn from_config_clamps_trust_and_attention() {
        let high = PartState::from_config(config(1.7));
        assert!((high.trust - 1.0).abs() < f64::EPSILON);
        assert!(high.need_attention.abs() < f64::EPSILON);

        let low = PartState::from_config(config(-0.2));
        assert!(low.trust.abs() < f64::EPSILON);
    }

    #[test]
    fn biography_reports_revealed_fields() {
        let bio = Biography {
            job_revealed: true,
            job: Some(String::from("keeps us safe")),
            ..Biography::default()
        };
        assert!(bio.is_revealed(BiographyField::Job));
        assert!(!bio.is_revealed(BiographyField::Age));
        assert_eq!(bio.fact(BiographyField::Job), Some("keeps us safe"));
        assert_eq!(bio.fact(BiographyField::Consent), None);
    }

    #[test]
    fn part_config_uses_camel_case_and_defaults() {
        let json = r#"{"id":"criticized","name":"Criticized","trust":0.2}"#;
        let parsed: Result<PartConfig, _> = serde_json::from_str(json);
        assert!(parsed.is_ok());
        let parsed = parsed.ok();
        assert_eq!(
            parsed.as_ref().map(|c| c.id.as_str()),
            Some("criticized")
        );
        assert_eq!(
            parsed.map(|c| c.biography),
            Some(Biography::default())
        );
    }

    #[test]
    fn model_state_serializes_camel_case_keys() {
        let state = ModelState::default();
        let value = serde_json::to_value(&state).ok();
        let has_key = value
            .as_ref()
            .and_then(|v| v.get("thoughtBubbles"))
            .is_some();
        assert!(has_key);
    }
}
