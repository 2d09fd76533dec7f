//! Action validation pipeline.
//!
//! The pipeline runs three stages in order:
//! 1. Syntax -- does the request carry the arguments its action needs?
//! 2. References -- do the acting and target clouds exist?
//! 3. Preconditions -- is the action legal in the current model state?
//!
//! Each stage returns `Ok(())` on success or a [`Rejection`] on failure. A
//! rejection becomes an unsuccessful `ActionResult` and leaves the model
//! untouched.

use ifs_types::{ActionKind, ActionRequest, BiographyField, PartId, SimulationMode};

use super::ActionContext;

/// Why an action was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The acting cloud id is not registered.
    #[error("unknown cloud: {0}")]
    UnknownCloud(PartId),

    /// The target cloud id is not registered.
    #[error("unknown target cloud: {0}")]
    UnknownTarget(PartId),

    /// The action needs a target cloud and none was given.
    #[error("{action} requires a target cloud")]
    MissingTarget {
        /// The action.
        action: ActionKind,
    },

    /// `ray_field_select` was sent without a field.
    #[error("ray_field_select requires a field")]
    MissingField,

    /// The field cannot be answered through the self-ray.
    #[error("{0} cannot be selected through the self-ray")]
    InvalidField(BiographyField),

    /// `switch_mode` was sent without a mode.
    #[error("switch_mode requires a mode")]
    MissingMode,

    /// The action needs a running conference.
    #[error("{action} is only available in foreground mode")]
    NotInConference {
        /// The action.
        action: ActionKind,
    },

    /// The self-ray does not point at the acting cloud.
    #[error("no self-ray toward {0}")]
    NoSelfRay(PartId),

    /// The acting cloud protects nobody (or not the given target).
    #[error("{protector} does not protect {protected}")]
    NotProtecting {
        /// The acting cloud.
        protector: PartId,
        /// The part it was asked about, or `"anyone"`.
        protected: String,
    },
}

/// Validate a request through the full pipeline.
pub fn validate_action(request: &ActionRequest, ctx: &ActionContext<'_>) -> Result<(), Rejection> {
    // Stage 1: Syntax
    validate_syntax(request)?;

    // Stage 2: References
    validate_references(request, ctx)?;

    // Stage 3: Preconditions
    validate_preconditions(request, ctx)
}

fn validate_syntax(request: &ActionRequest) -> Result<(), Rejection> {
    if request.action.requires_target() && request.target_cloud_id.is_none() {
        return Err(Rejection::MissingTarget {
            action: request.action,
        });
    }
    match request.action {
        ActionKind::RayFieldSelect => {
            let field = request.field.ok_or(Rejection::MissingField)?;
            if !field.is_ray_field() {
                return Err(Rejection::InvalidField(field));
            }
        }
        ActionKind::SwitchMode if request.new_mode.is_none() => {
            return Err(Rejection::MissingMode);
        }
        _ => {}
    }
    Ok(())
}

fn validate_references(request: &ActionRequest, ctx: &ActionContext<'_>) -> Result<(), Rejection> {
    if request.action.requires_part() && !ctx.model.has_part(&request.cloud_id) {
        return Err(Rejection::UnknownCloud(request.cloud_id.clone()));
    }
    match &request.target_cloud_id {
        Some(target) if !ctx.model.has_part(target) => {
            Err(Rejection::UnknownTarget(target.clone()))
        }
        _ => Ok(()),
    }
}

fn validate_preconditions(
    request: &ActionRequest,
    ctx: &ActionContext<'_>,
) -> Result<(), Rejection> {
    let id = &request.cloud_id;
    match request.action {
        ActionKind::JoinConference if ctx.model.mode() == SimulationMode::Panorama => {
            Err(Rejection::NotInConference {
                action: request.action,
            })
        }
        ActionKind::RayFieldSelect if ctx.model.self_ray_target() != Some(id) => {
            Err(Rejection::NoSelfRay(id.clone()))
        }
        ActionKind::HelpProtected => match &request.target_cloud_id {
            Some(target) if !ctx.relationships.protects(id, target) => {
                Err(Rejection::NotProtecting {
                    protector: id.clone(),
                    protected: target.to_string(),
                })
            }
            None if ctx.relationships.protected_by(id).next().is_none() => {
                Err(Rejection::NotProtecting {
                    protector: id.clone(),
                    protected: "anyone".to_owned(),
                })
            }
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}
