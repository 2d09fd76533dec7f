//! Therapist action validation and resolution.
//!
//! Resolution is a decision function: it reads the model and relationship
//! graph, draws from the RNG at most once, and returns an
//! [`ActionResult`] carrying one tagged outcome and the effects to apply.
//! Nothing here mutates the model; the applicator does that.
//!
//! # Submodules
//!
//! - [`validation`] -- The 3-stage validation pipeline.
//! - [`resolve`] -- Per-action resolution rules.

pub mod resolve;
pub mod validation;

use ifs_types::{ActionRequest, ActionResult};
use tracing::debug;

use crate::config::SimConfig;
use crate::model::SimulationModel;
use crate::relationships::RelationshipManager;
use crate::rng::SimRng;

/// Read-only view of everything resolution needs.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    /// The model.
    pub model: &'a SimulationModel,
    /// The relationship graph.
    pub relationships: &'a RelationshipManager,
    /// Tuning.
    pub config: &'a SimConfig,
}

impl<'a> ActionContext<'a> {
    /// Bundle the borrowed state.
    pub const fn new(
        model: &'a SimulationModel,
        relationships: &'a RelationshipManager,
        config: &'a SimConfig,
    ) -> Self {
        Self {
            model,
            relationships,
            config,
        }
    }
}

/// Validate and resolve one action.
///
/// A failed validation yields an unsuccessful result with no effects and no
/// RNG draws.
pub fn execute_action(
    request: &ActionRequest,
    ctx: &ActionContext<'_>,
    rng: &mut SimRng,
) -> ActionResult {
    if let Err(rejection) = validation::validate_action(request, ctx) {
        debug!(
            action = %request.action,
            part = %request.cloud_id,
            %rejection,
            "Action rejected"
        );
        return ActionResult::failure(rejection.to_string());
    }
    let result = resolve::resolve_action(request, ctx, rng);
    if let Some(change) = result.state_changes.first() {
        debug!(action = %request.action, outcome = %change, "Action resolved");
    }
    result
}
