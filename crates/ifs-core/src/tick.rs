//! The single tick of simulated time.
//!
//! Every path that moves time forward (real-time feeding, fast-forward,
//! replay) ends up here, one tick at a time, so RNG consumption depends only
//! on how many ticks ran.
//!
//! # Phases
//!
//! 1. Clock -- advance elapsed time, expire thought bubbles
//! 2. Attention growth -- absent, non-waiting parts grow their need
//! 3. Messages -- deliver arrivals, fire grievances and blended dialogue
//! 4. Attention check -- the neediest absent part may blend on its own

use ifs_types::{BlendReason, PartId, SimulationMode};
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::error::SimError;
use crate::messages::{Message, MessageOrchestrator};
use crate::model::SimulationModel;
use crate::relationships::RelationshipManager;
use crate::rng::SimRng;

/// Everything one tick mutates or reads.
#[derive(Debug)]
pub struct TickState<'a> {
    /// The model.
    pub model: &'a mut SimulationModel,
    /// The relationship graph.
    pub relationships: &'a RelationshipManager,
    /// The seeded RNG.
    pub rng: &'a mut SimRng,
    /// Message timers.
    pub orchestrator: &'a mut MessageOrchestrator,
    /// Tuning.
    pub config: &'a SimConfig,
}

/// A part that blended on its own during a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SpontaneousBlend {
    /// The part.
    pub part: PartId,
    /// Its need when it took over.
    pub need_attention: f64,
    /// Total RNG draws at the moment it triggered.
    pub trigger_rng_count: u64,
    /// Elapsed time before the triggering tick.
    pub pre_trigger_time: f64,
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// The tick number.
    pub tick: u64,
    /// Elapsed simulated time after the tick.
    pub elapsed: f64,
    /// Messages delivered.
    pub messages: Vec<Message>,
    /// The spontaneous blend, if one triggered.
    pub spontaneous: Option<SpontaneousBlend>,
}

/// Run one tick.
///
/// # Errors
///
/// Returns [`SimError`] if a message line is picked from an empty list or a
/// mutation names an unknown part.
pub fn run_tick(state: TickState<'_>, tick: u64) -> Result<TickSummary, SimError> {
    let TickState {
        model,
        relationships,
        rng,
        orchestrator,
        config,
    } = state;
    let dt = config.time.tick_seconds;

    // --- Phase 1: Clock ---
    let pre_trigger_time = model.elapsed();
    model.advance_elapsed(dt);
    model.prune_thought_bubbles();

    // --- Phase 2: Attention growth ---
    grow_attention(model, config, dt)?;

    // --- Phase 3: Messages ---
    let messages = orchestrator.tick(dt, model, relationships, rng, config)?;

    // --- Phase 4: Attention check ---
    let spontaneous = check_attention(model, rng, config)?.map(|(part, need_attention)| {
        SpontaneousBlend {
            part,
            need_attention,
            trigger_rng_count: rng.call_count(),
            pre_trigger_time,
        }
    });

    if let Some(blend) = &spontaneous {
        info!(
            tick,
            part = %blend.part,
            need = blend.need_attention,
            "Spontaneous blend"
        );
    }
    debug!(tick, elapsed = model.elapsed(), messages = messages.len(), "Tick complete");

    Ok(TickSummary {
        tick,
        elapsed: model.elapsed(),
        messages,
        spontaneous,
    })
}

/// Parts that are neither present nor honouring a wait.
fn absent_ids(model: &SimulationModel) -> Vec<PartId> {
    model
        .parts()
        .filter(|p| !model.is_present(&p.id) && !model.is_waiting(&p.id))
        .map(|p| p.id.clone())
        .collect()
}

fn grow_attention(model: &mut SimulationModel, config: &SimConfig, dt: f64) -> Result<(), SimError> {
    let rate = match model.mode() {
        SimulationMode::Panorama => config.attention.panorama_rate,
        SimulationMode::Foreground => config.attention.foreground_rate,
    };
    for id in absent_ids(model) {
        model.add_need_attention(&id, rate * dt)?;
    }
    Ok(())
}

/// Blend the neediest absent part if its demand is urgent. Returns the part
/// and its need.
fn check_attention(
    model: &mut SimulationModel,
    rng: &mut SimRng,
    config: &SimConfig,
) -> Result<Option<(PartId, f64)>, SimError> {
    let threshold = config.attention.demand_threshold;
    let mut candidate: Option<(PartId, f64)> = None;
    for id in absent_ids(model) {
        let need = model.part(&id).map_or(0.0, |p| p.need_attention);
        // Strictly greater keeps the lowest id on ties.
        if candidate.as_ref().is_none_or(|(_, best)| need > *best) {
            candidate = Some((id, need));
        }
    }
    let Some((id, need)) = candidate else {
        return Ok(None);
    };
    if need < threshold {
        return Ok(None);
    }
    let urgent = match model.mode() {
        SimulationMode::Foreground => true,
        SimulationMode::Panorama => need - threshold > rng.random("attention_check"),
    };
    if !urgent {
        return Ok(None);
    }
    model.add_blended_part(&id, BlendReason::Spontaneous, 1.0)?;
    Ok(Some((id, need)))
}
