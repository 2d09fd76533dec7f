//! Scenario definitions and installation.
//!
//! A scenario is the static cast of a session: the parts, how they relate
//! and who starts in the conference. It can be written as JSON or YAML and
//! is installed through the context's setup entry points only, so every id
//! is checked on the way in.

use serde::{Deserialize, Serialize};
use tracing::info;

use ifs_types::{Biography, BlendReason, Dialogues, PartConfig, PartId};

use crate::error::SimError;
use crate::simulation::SimulationContext;

/// Errors that can occur while loading or installing a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The JSON document did not match the scenario shape.
    #[error("scenario JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The YAML document did not match the scenario shape.
    #[error("scenario YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    /// Installation rejected the scenario.
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// A protector and the part it protects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionSpec {
    /// The protecting part.
    pub protector: PartId,
    /// The protected part.
    pub protected: PartId,
}

/// A grievance held by one part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrievanceSpec {
    /// The aggrieved part.
    pub holder: PartId,
    /// Who the grievance is against. May include the holder itself.
    pub targets: Vec<PartId>,
    /// Complaint lines, picked at random on delivery.
    pub lines: Vec<String>,
}

/// A part that can show up in place of another when asked who it sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySpec {
    /// The part being asked.
    pub part: PartId,
    /// The part that answers for it.
    pub proxy: PartId,
}

/// Relationship edges of a scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioRelationships {
    /// Protection edges.
    pub protections: Vec<ProtectionSpec>,
    /// Grievances.
    pub grievances: Vec<GrievanceSpec>,
    /// Proxy edges.
    pub proxies: Vec<ProxySpec>,
}

/// The static cast of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Human-readable scenario name.
    #[serde(default)]
    pub name: String,
    /// Parts, registered in order.
    pub parts: Vec<PartConfig>,
    /// Relationship edges.
    #[serde(default)]
    pub relationships: ScenarioRelationships,
    /// Parts in the conference at the start.
    #[serde(default)]
    pub initial_targets: Vec<PartId>,
    /// Parts blended at the start.
    #[serde(default)]
    pub initial_blended: Vec<PartId>,
}

impl Scenario {
    /// Parse a scenario from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Json`] if the document does not match.
    pub fn from_json(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse a scenario from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Yaml`] if the document does not match.
    pub fn from_yaml(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_yml::from_str(text)?)
    }

    /// Install the scenario into a context.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Sim`] for duplicate parts, unknown ids,
    /// self-proxies and empty grievances.
    pub fn install(&self, ctx: &mut SimulationContext) -> Result<(), ScenarioError> {
        for part in &self.parts {
            ctx.register_part(part.clone())?;
        }
        let relationships = &self.relationships;
        for edge in &relationships.protections {
            ctx.add_protection(&edge.protector, &edge.protected)?;
        }
        for grievance in &relationships.grievances {
            ctx.set_grievance(
                &grievance.holder,
                grievance.targets.iter().cloned(),
                grievance.lines.clone(),
            )?;
        }
        for edge in &relationships.proxies {
            ctx.add_proxy(&edge.part, &edge.proxy)?;
        }
        for id in &self.initial_targets {
            ctx.add_target_cloud(id)?;
        }
        for id in &self.initial_blended {
            ctx.add_blended_part(id, BlendReason::Spontaneous, 1.0)?;
        }
        info!(
            scenario = %self.name,
            parts = self.parts.len(),
            "Scenario installed"
        );
        Ok(())
    }

    /// The built-in inner critic scenario.
    ///
    /// A critic protects the part it criticizes and holds a grievance
    /// against itself.
    pub fn inner_critic() -> Self {
        let critic = PartId::from("inner-critic");
        let criticized = PartId::from("criticized");
        let critic_grievance = vec![
            "You never get anything right.".to_owned(),
            "Why do I even bother with you?".to_owned(),
        ];

        Self {
            name: "inner-critic".to_owned(),
            parts: vec![
                PartConfig {
                    id: critic.clone(),
                    name: "Inner Critic".to_owned(),
                    trust: 0.3,
                    need_attention: 0.0,
                    biography: Biography {
                        age: Some("I feel about twelve.".to_owned()),
                        identity: Some("I'm the voice that keeps you in line.".to_owned()),
                        job: Some("I point out mistakes before anyone else can.".to_owned()),
                        relationships: Some(
                            "I watch over the one who gets criticized.".to_owned(),
                        ),
                        ..Biography::default()
                    },
                    dialogues: Dialogues {
                        burdened_job_appraisal: Some(
                            "If I don't push, you'll fail and be rejected.".to_owned(),
                        ),
                        burdened_job_impact: Some("I know I make them feel small.".to_owned()),
                        unburdened_job: Some(
                            "I could help you notice what matters, gently.".to_owned(),
                        ),
                        blended: vec![
                            "You should have done better.".to_owned(),
                            "Everyone can see you're struggling.".to_owned(),
                        ],
                        grievance: critic_grievance.clone(),
                    },
                },
                PartConfig {
                    id: criticized.clone(),
                    name: "Criticized".to_owned(),
                    trust: 0.2,
                    need_attention: 0.0,
                    biography: Biography {
                        age: Some("Seven.".to_owned()),
                        identity: Some("I'm the little one who feels like a failure.".to_owned()),
                        job: Some("I hold the shame.".to_owned()),
                        relationships: Some("The critic never leaves me alone.".to_owned()),
                        ..Biography::default()
                    },
                    dialogues: Dialogues {
                        blended: vec![
                            "I'm not good enough.".to_owned(),
                            "Please don't look at me.".to_owned(),
                        ],
                        ..Dialogues::default()
                    },
                },
            ],
            relationships: ScenarioRelationships {
                protections: vec![ProtectionSpec {
                    protector: critic.clone(),
                    protected: criticized,
                }],
                grievances: vec![GrievanceSpec {
                    holder: critic.clone(),
                    targets: vec![critic],
                    lines: critic_grievance,
                }],
                proxies: Vec::new(),
            },
            initial_targets: Vec::new(),
            initial_blended: Vec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    #[test]
    fn inner_critic_installs() {
        let mut ctx = SimulationContext::new(SimConfig::default(), 7);
        Scenario::inner_critic().install(&mut ctx).unwrap();
        let critic = PartId::from("inner-critic");
        assert_eq!(ctx.model().parts().count(), 2);
        assert!(
            ctx.relationships()
                .protects(&critic, &PartId::from("criticized"))
        );
        assert!(ctx.relationships().has_grievance_against(&critic, &critic));
    }

    #[test]
    fn yaml_scenario_parses_with_defaults() {
        let yaml = r"
name: pair
parts:
  - id: a
    name: A
    trust: 0.4
  - id: b
    name: B
    trust: 0.6
relationships:
  proxies:
    - part: a
      proxy: b
initialTargets: [a]
";
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert_eq!(scenario.parts.len(), 2);
        assert!(scenario.relationships.protections.is_empty());

        let mut ctx = SimulationContext::new(SimConfig::default(), 1);
        scenario.install(&mut ctx).unwrap();
        assert!(ctx.model().is_target(&PartId::from("a")));
        assert_eq!(
            ctx.relationships().first_proxy(&PartId::from("a")),
            Some(&PartId::from("b"))
        );
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let json = r#"{
            "parts": [{ "id": "a", "name": "A", "trust": 0.5 }],
            "initialTargets": ["ghost"]
        }"#;
        let scenario = Scenario::from_json(json).unwrap();
        let mut ctx = SimulationContext::new(SimConfig::default(), 1);
        assert!(matches!(
            scenario.install(&mut ctx),
            Err(ScenarioError::Sim(SimError::UnknownPart(_)))
        ));
    }
}
