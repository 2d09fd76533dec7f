//! Shared type definitions for the IFS therapy simulator.
//!
//! This crate is the single source of truth for all types that cross the
//! boundary between the simulator core, the headless driver and the browser
//! view layer. Types defined here flow downstream to `TypeScript` via
//! `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- String newtype for part identifiers
//! - [`enums`] -- Action ids, simulation modes, blend reasons, biography fields
//! - [`structs`] -- Part, biography, blend and relationship state
//! - [`actions`] -- Action request, tagged outcome, effect and result types
//! - [`session`] -- Recorded session schema for deterministic replay

pub mod actions;
pub mod enums;
pub mod ids;
pub mod session;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::{
    ActionEffect, ActionOutcome, ActionRequest, ActionResult, AskToWaitOutcome, BlendOutcome,
    FeelTowardOutcome, HelpProtectedOutcome, JobOutcome, JoinOutcome, NoticePartOutcome,
    RayFieldOutcome, SelectOutcome, SeparateOutcome, StepBackOutcome, SwitchModeOutcome,
    WhoDoYouSeeOutcome,
};
pub use enums::{
    ActionKind, BiographyField, BlendReason, DeliveryMode, MessageKind, ParseEnumError,
    SimulationMode,
};
pub use ids::PartId;
pub use session::{RecordedAction, RecordedSession, RngLogEntry, SESSION_VERSION};
pub use structs::{
    Biography, BlendState, Dialogues, Grievance, ModelState, PartConfig, PartState,
    RelationshipState, SelfRay, ThoughtBubble,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::PartId::export_all();

        // Enums
        let _ = crate::enums::ActionKind::export_all();
        let _ = crate::enums::SimulationMode::export_all();
        let _ = crate::enums::BlendReason::export_all();
        let _ = crate::enums::BiographyField::export_all();
        let _ = crate::enums::MessageKind::export_all();
        let _ = crate::enums::DeliveryMode::export_all();

        // Structs
        let _ = crate::structs::Biography::export_all();
        let _ = crate::structs::Dialogues::export_all();
        let _ = crate::structs::PartConfig::export_all();
        let _ = crate::structs::PartState::export_all();
        let _ = crate::structs::BlendState::export_all();
        let _ = crate::structs::ThoughtBubble::export_all();
        let _ = crate::structs::SelfRay::export_all();
        let _ = crate::structs::Grievance::export_all();
        let _ = crate::structs::ModelState::export_all();
        let _ = crate::structs::RelationshipState::export_all();

        // Actions
        let _ = crate::actions::ActionRequest::export_all();
        let _ = crate::actions::ActionOutcome::export_all();
        let _ = crate::actions::ActionEffect::export_all();
        let _ = crate::actions::ActionResult::export_all();

        // Sessions
        let _ = crate::session::RngLogEntry::export_all();
        let _ = crate::session::RecordedAction::export_all();
        let _ = crate::session::RecordedSession::export_all();
    }
}
