//! Action request, outcome, effect and result types.
//!
//! Each [`ActionKind`] resolves to exactly one variant of its own outcome
//! enum, wrapped in [`ActionOutcome`]. The wrapper gives the match in the
//! controller compile-time exhaustiveness while the string encoding
//! (`"<cloudId>:<KEY>[:<extra>]"`) stays available for logs and tests.
//!
//! Resolution never mutates state. It produces [`ActionEffect`] values that
//! the applicator in `ifs-core` turns into model mutations.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActionKind, BiographyField, BlendReason, SimulationMode};
use crate::ids::PartId;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A therapist action submitted by the view layer or a headless driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ActionRequest {
    /// The action to perform.
    pub action: ActionKind,
    /// The acting (clicked) part.
    pub cloud_id: PartId,
    /// Second part involved, for actions that need one.
    #[serde(default)]
    pub target_cloud_id: Option<PartId>,
    /// Biography field, for `ray_field_select`.
    #[serde(default)]
    pub field: Option<BiographyField>,
    /// Requested mode, for `switch_mode`.
    #[serde(default)]
    pub new_mode: Option<SimulationMode>,
}

impl ActionRequest {
    /// A request with no optional arguments.
    pub fn new(action: ActionKind, cloud_id: impl Into<PartId>) -> Self {
        Self {
            action,
            cloud_id: cloud_id.into(),
            target_cloud_id: None,
            field: None,
            new_mode: None,
        }
    }

    /// Attach a target part.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<PartId>) -> Self {
        self.target_cloud_id = Some(target.into());
        self
    }

    /// Attach a biography field.
    #[must_use]
    pub const fn with_field(mut self, field: BiographyField) -> Self {
        self.field = Some(field);
        self
    }

    /// Attach a requested mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: SimulationMode) -> Self {
        self.new_mode = Some(mode);
        self
    }
}

// ---------------------------------------------------------------------------
// Per-action outcomes
// ---------------------------------------------------------------------------

/// Outcome of `select_a_target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum SelectOutcome {
    /// The part is now a target.
    Selected,
}

/// Outcome of `join_conference`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum JoinOutcome {
    /// The part joined the conference.
    Joined,
    /// The part was already in the conference.
    AlreadyPresent,
}

/// Outcome of `step_back`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum StepBackOutcome {
    /// The part left the conference.
    SteppedBack,
    /// The part was not in the conference.
    NotPresent,
}

/// Outcome of `separate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum SeparateOutcome {
    /// The part's blend degree is being reduced.
    Separating,
    /// The part was not blended.
    Unblended,
}

/// Outcome of `blend`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum BlendOutcome {
    /// The part is now fully blended.
    Blended,
    /// The part was already fully blended.
    AlreadyBlended,
}

/// Outcome of `job`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum JobOutcome {
    /// The part described its job for the first time.
    RevealedJob,
    /// The job was already known.
    AlreadyAnswered,
}

/// Outcome of `who_do_you_see`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum WhoDoYouSeeOutcome {
    /// The part sees another part standing in for the client.
    SeesProxy {
        /// The proxy that surfaced.
        proxy: PartId,
    },
    /// The part sees the client and reveals who it is.
    RevealedIdentity,
    /// The identity was already known.
    AlreadyAnswered,
}

/// Outcome of `feel_toward`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum FeelTowardOutcome {
    /// A blended part answered instead of Self.
    BlendedPartResponds {
        /// The blended part that answered.
        blended: PartId,
    },
    /// Self answered and a self-ray formed.
    RevealedSelfReaction,
    /// Already explored.
    AlreadyAnswered,
}

/// Outcome of `help_protected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum HelpProtectedOutcome {
    /// The protector allowed work with the protected part.
    ConsentedToHelp {
        /// The protected part.
        protected: PartId,
    },
    /// The protector refused.
    RefusedToHelp {
        /// The protected part.
        protected: PartId,
    },
    /// Consent was already given.
    AlreadyAnswered,
}

/// Outcome of `notice_part`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum NoticePartOutcome {
    /// The part was asked to notice itself.
    NoticedItself,
    /// A protector recognized the burden of the part it protects.
    RecognizedBurden {
        /// The protected part.
        target: PartId,
    },
    /// A protected part recognized its protector.
    RecognizedProtector {
        /// The protector.
        target: PartId,
    },
    /// A part recognized the harm its grievance caused.
    RecognizedHarm {
        /// The part it had attacked.
        target: PartId,
    },
    /// Generic noticing with no relationship effect.
    Noticed {
        /// The noticed part.
        target: PartId,
    },
}

/// Outcome of `ray_field_select`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum RayFieldOutcome {
    /// The field was revealed.
    RevealedField {
        /// The revealed field.
        field: BiographyField,
    },
    /// The field was already known.
    AlreadyAnswered {
        /// The requested field.
        field: BiographyField,
    },
    /// A present protector or grievance holder reacted with backlash.
    TriggeredBacklash {
        /// The part that re-blended.
        protector: PartId,
    },
}

/// Outcome of `ask_to_wait`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum AskToWaitOutcome {
    /// The part agreed to wait.
    AgreedToWait,
    /// The part declined.
    DeclinedToWait,
}

/// Outcome of `switch_mode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum SwitchModeOutcome {
    /// The mode changed.
    ModeChanged {
        /// The new mode.
        mode: SimulationMode,
    },
    /// The simulation was already in that mode.
    AlreadyInMode {
        /// The current mode.
        mode: SimulationMode,
    },
}

/// The resolved outcome of one action, tagged by action kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "action", content = "outcome", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionOutcome {
    /// `select_a_target`.
    SelectATarget(SelectOutcome),
    /// `join_conference`.
    JoinConference(JoinOutcome),
    /// `step_back`.
    StepBack(StepBackOutcome),
    /// `separate`.
    Separate(SeparateOutcome),
    /// `blend`.
    Blend(BlendOutcome),
    /// `job`.
    Job(JobOutcome),
    /// `who_do_you_see`.
    WhoDoYouSee(WhoDoYouSeeOutcome),
    /// `feel_toward`.
    FeelToward(FeelTowardOutcome),
    /// `help_protected`.
    HelpProtected(HelpProtectedOutcome),
    /// `notice_part`.
    NoticePart(NoticePartOutcome),
    /// `ray_field_select`.
    RayFieldSelect(RayFieldOutcome),
    /// `ask_to_wait`.
    AskToWait(AskToWaitOutcome),
    /// `switch_mode`.
    SwitchMode(SwitchModeOutcome),
}

impl ActionOutcome {
    /// The action this outcome belongs to.
    pub const fn action(&self) -> ActionKind {
        match self {
            Self::SelectATarget(_) => ActionKind::SelectATarget,
            Self::JoinConference(_) => ActionKind::JoinConference,
            Self::StepBack(_) => ActionKind::StepBack,
            Self::Separate(_) => ActionKind::Separate,
            Self::Blend(_) => ActionKind::Blend,
            Self::Job(_) => ActionKind::Job,
            Self::WhoDoYouSee(_) => ActionKind::WhoDoYouSee,
            Self::FeelToward(_) => ActionKind::FeelToward,
            Self::HelpProtected(_) => ActionKind::HelpProtected,
            Self::NoticePart(_) => ActionKind::NoticePart,
            Self::RayFieldSelect(_) => ActionKind::RayFieldSelect,
            Self::AskToWait(_) => ActionKind::AskToWait,
            Self::SwitchMode(_) => ActionKind::SwitchMode,
        }
    }

    /// The SCREAMING_SNAKE outcome key.
    #[allow(clippy::too_many_lines)]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::SelectATarget(SelectOutcome::Selected) => "SELECTED",
            Self::JoinConference(JoinOutcome::Joined) => "JOINED",
            Self::JoinConference(JoinOutcome::AlreadyPresent) => "ALREADY_PRESENT",
            Self::StepBack(StepBackOutcome::SteppedBack) => "STEPPED_BACK",
            Self::StepBack(StepBackOutcome::NotPresent) => "NOT_PRESENT",
            Self::Separate(SeparateOutcome::Separating) => "SEPARATING",
            Self::Separate(SeparateOutcome::Unblended) => "UNBLENDED",
            Self::Blend(BlendOutcome::Blended) => "BLENDED",
            Self::Blend(BlendOutcome::AlreadyBlended) => "ALREADY_BLENDED",
            Self::Job(JobOutcome::RevealedJob) => "REVEALED_JOB",
            Self::WhoDoYouSee(WhoDoYouSeeOutcome::SeesProxy { .. }) => "SEES_PROXY",
            Self::WhoDoYouSee(WhoDoYouSeeOutcome::RevealedIdentity) => "REVEALED_IDENTITY",
            Self::FeelToward(FeelTowardOutcome::BlendedPartResponds { .. }) => {
                "BLENDED_PART_RESPONDS"
            }
            Self::FeelToward(FeelTowardOutcome::RevealedSelfReaction) => "REVEALED_SELF_REACTION",
            Self::HelpProtected(HelpProtectedOutcome::ConsentedToHelp { .. }) => {
                "CONSENTED_TO_HELP"
            }
            Self::HelpProtected(HelpProtectedOutcome::RefusedToHelp { .. }) => "REFUSED_TO_HELP",
            Self::Job(JobOutcome::AlreadyAnswered)
            | Self::WhoDoYouSee(WhoDoYouSeeOutcome::AlreadyAnswered)
            | Self::FeelToward(FeelTowardOutcome::AlreadyAnswered)
            | Self::HelpProtected(HelpProtectedOutcome::AlreadyAnswered)
            | Self::RayFieldSelect(RayFieldOutcome::AlreadyAnswered { .. }) => "ALREADY_ANSWERED",
            Self::NoticePart(NoticePartOutcome::NoticedItself) => "NOTICED_ITSELF",
            Self::NoticePart(NoticePartOutcome::RecognizedBurden { .. }) => "RECOGNIZED_BURDEN",
            Self::NoticePart(NoticePartOutcome::RecognizedProtector { .. }) => {
                "RECOGNIZED_PROTECTOR"
            }
            Self::NoticePart(NoticePartOutcome::RecognizedHarm { .. }) => "RECOGNIZED_HARM",
            Self::NoticePart(NoticePartOutcome::Noticed { .. }) => "NOTICED",
            Self::RayFieldSelect(RayFieldOutcome::RevealedField { .. }) => "REVEALED_FIELD",
            Self::RayFieldSelect(RayFieldOutcome::TriggeredBacklash { .. }) => {
                "TRIGGERED_BACKLASH"
            }
            Self::AskToWait(AskToWaitOutcome::AgreedToWait) => "AGREED_TO_WAIT",
            Self::AskToWait(AskToWaitOutcome::DeclinedToWait) => "DECLINED_TO_WAIT",
            Self::SwitchMode(SwitchModeOutcome::ModeChanged { .. }) => "MODE_CHANGED",
            Self::SwitchMode(SwitchModeOutcome::AlreadyInMode { .. }) => "ALREADY_IN_MODE",
        }
    }

    /// The optional trailing segment of the encoded outcome.
    pub fn extra(&self) -> Option<String> {
        match self {
            Self::WhoDoYouSee(WhoDoYouSeeOutcome::SeesProxy { proxy }) => {
                Some(proxy.to_string())
            }
            Self::FeelToward(FeelTowardOutcome::BlendedPartResponds { blended }) => {
                Some(blended.to_string())
            }
            Self::HelpProtected(
                HelpProtectedOutcome::ConsentedToHelp { protected }
                | HelpProtectedOutcome::RefusedToHelp { protected },
            ) => Some(protected.to_string()),
            Self::NoticePart(
                NoticePartOutcome::RecognizedBurden { target }
                | NoticePartOutcome::RecognizedProtector { target }
                | NoticePartOutcome::RecognizedHarm { target }
                | NoticePartOutcome::Noticed { target },
            ) => Some(target.to_string()),
            Self::RayFieldSelect(
                RayFieldOutcome::RevealedField { field }
                | RayFieldOutcome::AlreadyAnswered { field },
            ) => Some(field.to_string()),
            Self::RayFieldSelect(RayFieldOutcome::TriggeredBacklash { protector }) => {
                Some(protector.to_string())
            }
            Self::SwitchMode(
                SwitchModeOutcome::ModeChanged { mode } | SwitchModeOutcome::AlreadyInMode { mode },
            ) => Some(mode.to_string()),
            _ => None,
        }
    }

    /// Encode as `"<cloudId>:<KEY>[:<extra>]"`.
    pub fn encode(&self, cloud_id: &PartId) -> String {
        match self.extra() {
            Some(extra) => format!("{cloud_id}:{}:{extra}", self.key()),
            None => format!("{cloud_id}:{}", self.key()),
        }
    }

    /// Whether the outcome leaves the model untouched.
    pub const fn is_no_op(&self) -> bool {
        matches!(
            self,
            Self::JoinConference(JoinOutcome::AlreadyPresent)
                | Self::StepBack(StepBackOutcome::NotPresent)
                | Self::Separate(SeparateOutcome::Unblended)
                | Self::Blend(BlendOutcome::AlreadyBlended)
                | Self::Job(JobOutcome::AlreadyAnswered)
                | Self::WhoDoYouSee(WhoDoYouSeeOutcome::AlreadyAnswered)
                | Self::FeelToward(FeelTowardOutcome::AlreadyAnswered)
                | Self::HelpProtected(HelpProtectedOutcome::AlreadyAnswered)
                | Self::RayFieldSelect(RayFieldOutcome::AlreadyAnswered { .. })
                | Self::SwitchMode(SwitchModeOutcome::AlreadyInMode { .. })
        )
    }
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// One state mutation requested by a resolved action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionEffect {
    /// Add a part to the conference.
    AddTarget {
        /// The part.
        part: PartId,
    },
    /// Remove a part from the conference.
    RemoveTarget {
        /// The part.
        part: PartId,
    },
    /// Change the simulation mode.
    SetMode {
        /// The new mode.
        mode: SimulationMode,
    },
    /// Blend a part at the given degree.
    Blend {
        /// The part.
        part: PartId,
        /// Why it blends.
        reason: BlendReason,
        /// Blend degree in `(0, 1]`.
        degree: f64,
    },
    /// Reduce a part's blend degree; the applicator scales `base` by the
    /// part's attention need.
    ReduceBlending {
        /// The part.
        part: PartId,
        /// Unscaled reduction.
        base: f64,
    },
    /// Set a biography flag.
    RevealBiography {
        /// The part.
        part: PartId,
        /// The field to reveal.
        field: BiographyField,
    },
    /// Shift a part's trust (clamped to `[0, 1]`).
    AdjustTrust {
        /// The part.
        part: PartId,
        /// Signed change.
        delta: f64,
    },
    /// Reset a part's attention need to zero.
    ResetAttention {
        /// The part.
        part: PartId,
    },
    /// Record that a part agreed not to demand attention for a while.
    AgreeToWait {
        /// The part.
        part: PartId,
        /// How long it waits, in simulated seconds.
        duration: f64,
    },
    /// Show transient text over a part.
    ThoughtBubble {
        /// The speaking part.
        part: PartId,
        /// The text.
        text: String,
    },
    /// A protector re-blends and its protectee steps back.
    Backlash {
        /// The reacting part.
        protector: PartId,
        /// The part that was engaged.
        protectee: PartId,
    },
    /// Point the self-ray at a part.
    CreateSelfRay {
        /// The part.
        part: PartId,
    },
    /// Remove the self-ray.
    ClearSelfRay,
    /// Remove a proxy edge and mark the proxy as used.
    ConsumeProxy {
        /// The part that looked.
        part: PartId,
        /// The proxy that surfaced.
        proxy: PartId,
    },
    /// Drop one target from a part's grievance.
    ResolveGrievance {
        /// The grievance holder.
        holder: PartId,
        /// The target to drop.
        target: PartId,
    },
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// The result of executing one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ActionResult {
    /// Whether the action was legally attempted.
    pub success: bool,
    /// Human-readable failure reason.
    pub message: Option<String>,
    /// The resolved outcome (absent on failure).
    pub outcome: Option<ActionOutcome>,
    /// Encoded outcome strings (one per resolution).
    pub state_changes: Vec<String>,
    /// Mutations to apply.
    pub effects: Vec<ActionEffect>,
}

impl ActionResult {
    /// A recoverable domain failure with no effects.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            outcome: None,
            state_changes: Vec::new(),
            effects: Vec::new(),
        }
    }

    /// A successful resolution.
    pub fn resolved(cloud_id: &PartId, outcome: ActionOutcome, effects: Vec<ActionEffect>) -> Self {
        Self {
            success: true,
            message: None,
            state_changes: vec![outcome.encode(cloud_id)],
            outcome: Some(outcome),
            effects,
        }
    }

    /// The outcome key, if the action succeeded.
    pub fn outcome_key(&self) -> Option<&'static str> {
        self.outcome.as_ref().map(ActionOutcome::key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_without_extra() {
        let outcome = ActionOutcome::Job(JobOutcome::RevealedJob);
        assert_eq!(
            outcome.encode(&PartId::from("inner-critic")),
            "inner-critic:REVEALED_JOB"
        );
    }

    #[test]
    fn encode_with_extra() {
        let outcome = ActionOutcome::HelpProtected(HelpProtectedOutcome::RefusedToHelp {
            protected: PartId::from("criticized"),
        });
        assert_eq!(
            outcome.encode(&PartId::from("inner-critic")),
            "inner-critic:REFUSED_TO_HELP:criticized"
        );
    }

    #[test]
    fn outcome_key_is_in_action_outcome_set() {
        let samples = [
            ActionOutcome::SelectATarget(SelectOutcome::Selected),
            ActionOutcome::Separate(SeparateOutcome::Unblended),
            ActionOutcome::RayFieldSelect(RayFieldOutcome::AlreadyAnswered {
                field: BiographyField::Age,
            }),
            ActionOutcome::SwitchMode(SwitchModeOutcome::ModeChanged {
                mode: SimulationMode::Foreground,
            }),
        ];
        for outcome in samples {
            assert!(outcome.action().outcome_keys().contains(&outcome.key()));
        }
    }

    #[test]
    fn failure_carries_no_effects() {
        let result = ActionResult::failure("unknown cloud: ghost");
        assert!(!result.success);
        assert!(result.effects.is_empty());
        assert!(result.state_changes.is_empty());
        assert_eq!(result.outcome_key(), None);
    }

    #[test]
    fn resolved_records_encoded_state_change() {
        let id = PartId::from("inner-critic");
        let result = ActionResult::resolved(
            &id,
            ActionOutcome::Job(JobOutcome::AlreadyAnswered),
            Vec::new(),
        );
        assert!(result.success);
        assert_eq!(result.state_changes, ["inner-critic:ALREADY_ANSWERED"]);
    }

    #[test]
    fn request_builder_sets_optional_fields() {
        let req = ActionRequest::new(ActionKind::RayFieldSelect, "criticized")
            .with_field(BiographyField::Age)
            .with_target("inner-critic");
        assert_eq!(req.field, Some(BiographyField::Age));
        assert_eq!(req.target_cloud_id, Some(PartId::from("inner-critic")));
        assert_eq!(req.new_mode, None);
    }
}
