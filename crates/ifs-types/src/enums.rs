//! Enumeration types for the IFS simulator.
//!
//! Action ids, simulation modes, blend reasons and biography fields all cross
//! the boundary to the view layer as snake_case strings. Parsing one of those
//! strings back into an enum is the only place an unknown value can enter
//! the core, so every `FromStr` here reports a typed [`ParseEnumError`].

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A string did not name a known variant of one of the simulator enums.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    /// Which enum was being parsed (e.g. `"action"`).
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

// ---------------------------------------------------------------------------
// Therapist actions
// ---------------------------------------------------------------------------

/// A therapist action the controller knows how to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionKind {
    /// Bring a part into the conference and switch to foreground mode.
    SelectATarget,
    /// Invite a part into an already running conference.
    JoinConference,
    /// Ask a part to leave the conference.
    StepBack,
    /// Ask a blended part to separate a little.
    Separate,
    /// Deliberately blend with a part.
    Blend,
    /// Ask a part what its job is.
    Job,
    /// Ask a part who it sees when it looks at the client.
    WhoDoYouSee,
    /// Ask how the client feels toward a part.
    FeelToward,
    /// Ask a protector for permission to help the part it protects.
    HelpProtected,
    /// Ask a part to notice another part (or itself).
    NoticePart,
    /// Answer a biography question through the self-ray.
    RayFieldSelect,
    /// Ask a part to stop demanding attention for a while.
    AskToWait,
    /// Switch between panorama and foreground mode.
    SwitchMode,
}

impl ActionKind {
    /// Every action kind, in declaration order.
    pub const ALL: [Self; 13] = [
        Self::SelectATarget,
        Self::JoinConference,
        Self::StepBack,
        Self::Separate,
        Self::Blend,
        Self::Job,
        Self::WhoDoYouSee,
        Self::FeelToward,
        Self::HelpProtected,
        Self::NoticePart,
        Self::RayFieldSelect,
        Self::AskToWait,
        Self::SwitchMode,
    ];

    /// The wire id of this action (e.g. `"select_a_target"`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SelectATarget => "select_a_target",
            Self::JoinConference => "join_conference",
            Self::StepBack => "step_back",
            Self::Separate => "separate",
            Self::Blend => "blend",
            Self::Job => "job",
            Self::WhoDoYouSee => "who_do_you_see",
            Self::FeelToward => "feel_toward",
            Self::HelpProtected => "help_protected",
            Self::NoticePart => "notice_part",
            Self::RayFieldSelect => "ray_field_select",
            Self::AskToWait => "ask_to_wait",
            Self::SwitchMode => "switch_mode",
        }
    }

    /// The closed set of outcome keys this action can produce.
    pub const fn outcome_keys(self) -> &'static [&'static str] {
        match self {
            Self::SelectATarget => &["SELECTED"],
            Self::JoinConference => &["JOINED", "ALREADY_PRESENT"],
            Self::StepBack => &["STEPPED_BACK", "NOT_PRESENT"],
            Self::Separate => &["SEPARATING", "UNBLENDED"],
            Self::Blend => &["BLENDED", "ALREADY_BLENDED"],
            Self::Job => &["REVEALED_JOB", "ALREADY_ANSWERED"],
            Self::WhoDoYouSee => &["SEES_PROXY", "REVEALED_IDENTITY", "ALREADY_ANSWERED"],
            Self::FeelToward => &[
                "BLENDED_PART_RESPONDS",
                "REVEALED_SELF_REACTION",
                "ALREADY_ANSWERED",
            ],
            Self::HelpProtected => &["CONSENTED_TO_HELP", "REFUSED_TO_HELP", "ALREADY_ANSWERED"],
            Self::NoticePart => &[
                "NOTICED_ITSELF",
                "RECOGNIZED_BURDEN",
                "RECOGNIZED_PROTECTOR",
                "RECOGNIZED_HARM",
                "NOTICED",
            ],
            Self::RayFieldSelect => &["REVEALED_FIELD", "ALREADY_ANSWERED", "TRIGGERED_BACKLASH"],
            Self::AskToWait => &["AGREED_TO_WAIT", "DECLINED_TO_WAIT"],
            Self::SwitchMode => &["MODE_CHANGED", "ALREADY_IN_MODE"],
        }
    }

    /// Whether the action must name a `target_cloud_id`.
    pub const fn requires_target(self) -> bool {
        matches!(self, Self::NoticePart)
    }

    /// Whether the acting cloud id must name a registered part.
    ///
    /// Mode switches are global and ignore the cloud id.
    pub const fn requires_part(self) -> bool {
        !matches!(self, Self::SwitchMode)
    }
}

impl core::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "action",
                value: s.to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// Simulation mode
// ---------------------------------------------------------------------------

/// Whether the session is looking at the overview or running a conference.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SimulationMode {
    /// Background overview of every part.
    #[default]
    Panorama,
    /// Active conference with the targeted parts in front.
    Foreground,
}

impl SimulationMode {
    /// The wire name of the mode.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Panorama => "panorama",
            Self::Foreground => "foreground",
        }
    }
}

impl core::fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimulationMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "panorama" => Ok(Self::Panorama),
            "foreground" => Ok(Self::Foreground),
            other => Err(ParseEnumError {
                kind: "mode",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Blending
// ---------------------------------------------------------------------------

/// Why a part is currently blended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum BlendReason {
    /// The part demanded attention and took over on its own.
    Spontaneous,
    /// The therapist asked the client to blend.
    Manual,
    /// A protector re-blended after its protectee was engaged without consent.
    Backlash,
    /// The part surfaced as a proxy during "who do you see".
    Proxy,
}

// ---------------------------------------------------------------------------
// Biography
// ---------------------------------------------------------------------------

/// A biography fact that can be revealed about a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum BiographyField {
    /// How old the part feels.
    Age,
    /// Who the part is.
    Identity,
    /// What the part does for the system.
    Job,
    /// Which parts it is connected to.
    Relationships,
    /// Whether the part has given consent to work with its protectee.
    Consent,
    /// How the client feels toward the part.
    SelfReaction,
}

impl BiographyField {
    /// Fields that can be answered through the self-ray.
    pub const RAY_FIELDS: [Self; 4] = [Self::Age, Self::Identity, Self::Job, Self::Relationships];

    /// The wire name of the field.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Identity => "identity",
            Self::Job => "job",
            Self::Relationships => "relationships",
            Self::Consent => "consent",
            Self::SelfReaction => "self_reaction",
        }
    }

    /// Whether the field can be selected through the self-ray.
    pub const fn is_ray_field(self) -> bool {
        matches!(self, Self::Age | Self::Identity | Self::Job | Self::Relationships)
    }
}

impl core::fmt::Display for BiographyField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BiographyField {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "age" => Ok(Self::Age),
            "identity" => Ok(Self::Identity),
            "job" => Ok(Self::Job),
            "relationships" => Ok(Self::Relationships),
            "consent" => Ok(Self::Consent),
            "self_reaction" => Ok(Self::SelfReaction),
            other => Err(ParseEnumError {
                kind: "biography field",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// The class of an inter-part message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MessageKind {
    /// A scripted complaint aimed at another part.
    Grievance,
    /// An ambient line spoken by a blended part.
    BlendedDialogue,
}

/// How messages reach their recipient.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum DeliveryMode {
    /// Delivered in the tick that sends it (headless and tests).
    #[default]
    Immediate,
    /// Delivered after a travel time so the view can animate it.
    Travel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_ids_round_trip_through_from_str() {
        for kind in ActionKind::ALL {
            assert_eq!(kind.as_str().parse::<ActionKind>(), Ok(kind));
        }
    }

    #[test]
    fn unknown_action_id_is_rejected() {
        let err = "hug".parse::<ActionKind>();
        assert_eq!(
            err,
            Err(ParseEnumError {
                kind: "action",
                value: String::from("hug"),
            })
        );
    }

    #[test]
    fn action_serializes_as_snake_case() {
        let json = serde_json::to_string(&ActionKind::WhoDoYouSee).ok();
        assert_eq!(json.as_deref(), Some("\"who_do_you_see\""));
    }

    #[test]
    fn every_action_has_at_least_one_outcome() {
        for kind in ActionKind::ALL {
            assert!(!kind.outcome_keys().is_empty(), "{kind} has no outcomes");
        }
    }

    #[test]
    fn only_notice_part_requires_target() {
        let with_target: Vec<ActionKind> = ActionKind::ALL
            .into_iter()
            .filter(|kind| kind.requires_target())
            .collect();
        assert_eq!(with_target, [ActionKind::NoticePart]);
    }

    #[test]
    fn mode_parses_wire_names() {
        assert_eq!("panorama".parse(), Ok(SimulationMode::Panorama));
        assert_eq!("foreground".parse(), Ok(SimulationMode::Foreground));
        assert!("background".parse::<SimulationMode>().is_err());
    }

    #[test]
    fn ray_fields_exclude_consent_and_self_reaction() {
        assert!(BiographyField::RAY_FIELDS.iter().all(|f| f.is_ray_field()));
        assert!(!BiographyField::Consent.is_ray_field());
        assert!(!BiographyField::SelfReaction.is_ray_field());
    }
}
