//! Scripted headless run of the built-in scenario.
//!
//! The script walks through a short session with the inner critic: select
//! both parts, ask about the critic's job, check feelings toward the
//! criticized part, help it, and finally separate. Frames of one sixtieth of
//! a second are fed between actions, so tick quantization is exercised the
//! way a browser frame loop would.

use ifs_core::config::SimConfig;
use ifs_core::messages::Message;
use ifs_core::scenario::Scenario;
use ifs_core::simulation::{SimulationContext, SimulationObserver};
use ifs_core::tick::SpontaneousBlend;
use ifs_types::{
    ActionKind, ActionRequest, BiographyField, ModelState, RecordedSession, SimulationMode,
};
use tracing::{debug, info};

use crate::error::EngineError;

/// Frames fed between two scripted actions.
const FRAMES_BETWEEN_ACTIONS: u32 = 45;

/// Simulated seconds per frame.
const FRAME_SECONDS: f64 = 1.0 / 60.0;

/// Logs what the simulation does on its own.
struct LoggingObserver;

impl SimulationObserver for LoggingObserver {
    fn on_spontaneous_blend(&mut self, blend: &SpontaneousBlend, model: &ModelState) {
        info!(
            part = %blend.part,
            need_attention = blend.need_attention,
            blended = model.blended.len(),
            "Part blended spontaneously"
        );
    }

    fn on_message(&mut self, message: &Message) {
        debug!(
            kind = ?message.kind,
            sender = %message.sender,
            text = %message.text,
            "Message delivered"
        );
    }
}

fn script() -> Vec<ActionRequest> {
    vec![
        ActionRequest::new(ActionKind::SelectATarget, "criticized"),
        ActionRequest::new(ActionKind::SelectATarget, "inner-critic"),
        ActionRequest::new(ActionKind::Job, "inner-critic"),
        ActionRequest::new(ActionKind::WhoDoYouSee, "inner-critic"),
        ActionRequest::new(ActionKind::FeelToward, "criticized"),
        ActionRequest::new(ActionKind::RayFieldSelect, "criticized").with_field(BiographyField::Age),
        ActionRequest::new(ActionKind::HelpProtected, "inner-critic"),
        ActionRequest::new(ActionKind::NoticePart, "inner-critic").with_target("criticized"),
        ActionRequest::new(ActionKind::Separate, "inner-critic"),
        ActionRequest::new(ActionKind::SwitchMode, "").with_mode(SimulationMode::Panorama),
    ]
}

/// Run the scripted session while recording it.
///
/// `settle_ticks` extra ticks run after the last action.
pub fn run(config: &SimConfig, seed: u64, settle_ticks: u32) -> Result<RecordedSession, EngineError> {
    let mut ctx =
        SimulationContext::new(config.clone(), seed).with_observer(Box::new(LoggingObserver));
    Scenario::inner_critic().install(&mut ctx)?;
    ctx.start_recording(env!("CARGO_PKG_VERSION"), std::env::consts::OS);

    for request in script() {
        let result = ctx.execute(&request)?;
        info!(
            action = %request.action,
            part = %request.cloud_id,
            success = result.success,
            outcome = ?result.state_changes,
            "Action executed"
        );
        for _ in 0..FRAMES_BETWEEN_ACTIONS {
            ctx.advance(FRAME_SECONDS)?;
        }
    }
    ctx.advance_intervals(settle_ticks)?;

    info!(
        elapsed = ctx.elapsed(),
        ticks = ctx.ticks(),
        victory = ctx.is_victory(),
        "Demo finished"
    );
    ctx.finish_recording().ok_or(EngineError::MissingRecording)
}
