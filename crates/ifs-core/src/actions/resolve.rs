//! Per-action resolution rules.
//!
//! Each rule assumes the request already passed validation. It picks exactly
//! one outcome from the action's outcome enum and lists the effects that
//! outcome implies. Outcomes that leave the model untouched carry no
//! effects. Only `help_protected`, `ray_field_select` and `ask_to_wait` draw
//! from the RNG, and never more than once.

use ifs_types::{
    ActionEffect, ActionKind, ActionOutcome, ActionRequest, ActionResult, AskToWaitOutcome,
    BiographyField, BlendOutcome, BlendReason, FeelTowardOutcome, HelpProtectedOutcome,
    JobOutcome, JoinOutcome, NoticePartOutcome, PartId, PartState, RayFieldOutcome, SelectOutcome,
    SeparateOutcome, SimulationMode, StepBackOutcome, SwitchModeOutcome, WhoDoYouSeeOutcome,
};

use super::ActionContext;
use super::validation::Rejection;
use crate::rng::SimRng;

/// The chosen outcome and its effects.
type Resolution = (ActionOutcome, Vec<ActionEffect>);

/// Resolve a validated request.
pub fn resolve_action(
    request: &ActionRequest,
    ctx: &ActionContext<'_>,
    rng: &mut SimRng,
) -> ActionResult {
    let id = &request.cloud_id;
    let resolution = match request.action {
        ActionKind::SelectATarget => Ok(select_a_target(id)),
        ActionKind::JoinConference => Ok(join_conference(id, ctx)),
        ActionKind::StepBack => Ok(step_back(id, ctx)),
        ActionKind::Separate => Ok(separate(id, ctx)),
        ActionKind::Blend => Ok(blend(id, ctx)),
        ActionKind::Job => job(id, ctx),
        ActionKind::WhoDoYouSee => who_do_you_see(id, ctx),
        ActionKind::FeelToward => feel_toward(id, ctx),
        ActionKind::HelpProtected => help_protected(request, ctx, rng),
        ActionKind::NoticePart => notice_part(request, ctx),
        ActionKind::RayFieldSelect => ray_field_select(request, ctx, rng),
        ActionKind::AskToWait => ask_to_wait(id, ctx, rng),
        ActionKind::SwitchMode => switch_mode(request, ctx),
    };
    match resolution {
        Ok((outcome, effects)) => ActionResult::resolved(id, outcome, effects),
        Err(rejection) => ActionResult::failure(rejection.to_string()),
    }
}

fn part<'a>(id: &PartId, ctx: &ActionContext<'a>) -> Result<&'a PartState, Rejection> {
    ctx.model
        .part(id)
        .ok_or_else(|| Rejection::UnknownCloud(id.clone()))
}

fn bubble(part: &PartId, text: Option<&str>) -> Option<ActionEffect> {
    text.map(|text| ActionEffect::ThoughtBubble {
        part: part.clone(),
        text: text.to_owned(),
    })
}

// ---------------------------------------------------------------------------
// Conference membership and blending
// ---------------------------------------------------------------------------

fn select_a_target(id: &PartId) -> Resolution {
    (
        ActionOutcome::SelectATarget(SelectOutcome::Selected),
        vec![
            ActionEffect::AddTarget { part: id.clone() },
            ActionEffect::ResetAttention { part: id.clone() },
            ActionEffect::SetMode {
                mode: SimulationMode::Foreground,
            },
        ],
    )
}

fn join_conference(id: &PartId, ctx: &ActionContext<'_>) -> Resolution {
    if ctx.model.is_target(id) {
        return (
            ActionOutcome::JoinConference(JoinOutcome::AlreadyPresent),
            Vec::new(),
        );
    }
    (
        ActionOutcome::JoinConference(JoinOutcome::Joined),
        vec![
            ActionEffect::AddTarget { part: id.clone() },
            ActionEffect::ResetAttention { part: id.clone() },
        ],
    )
}

fn step_back(id: &PartId, ctx: &ActionContext<'_>) -> Resolution {
    if !ctx.model.is_target(id) {
        return (
            ActionOutcome::StepBack(StepBackOutcome::NotPresent),
            Vec::new(),
        );
    }
    let mut effects = vec![ActionEffect::RemoveTarget { part: id.clone() }];
    if ctx.model.self_ray_target() == Some(id) {
        effects.push(ActionEffect::ClearSelfRay);
    }
    (ActionOutcome::StepBack(StepBackOutcome::SteppedBack), effects)
}

fn separate(id: &PartId, ctx: &ActionContext<'_>) -> Resolution {
    if !ctx.model.is_blended(id) {
        return (
            ActionOutcome::Separate(SeparateOutcome::Unblended),
            Vec::new(),
        );
    }
    (
        ActionOutcome::Separate(SeparateOutcome::Separating),
        vec![ActionEffect::ReduceBlending {
            part: id.clone(),
            base: ctx.config.blending.separate_base,
        }],
    )
}

fn blend(id: &PartId, ctx: &ActionContext<'_>) -> Resolution {
    let fully = ctx
        .model
        .blend_state(id)
        .is_some_and(|b| b.degree >= 1.0);
    if fully {
        return (
            ActionOutcome::Blend(BlendOutcome::AlreadyBlended),
            Vec::new(),
        );
    }
    (
        ActionOutcome::Blend(BlendOutcome::Blended),
        vec![ActionEffect::Blend {
            part: id.clone(),
            reason: BlendReason::Manual,
            degree: 1.0,
        }],
    )
}

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

fn job(id: &PartId, ctx: &ActionContext<'_>) -> Result<Resolution, Rejection> {
    let state = part(id, ctx)?;
    if state.biography.job_revealed {
        return Ok((ActionOutcome::Job(JobOutcome::AlreadyAnswered), Vec::new()));
    }
    let mut effects = vec![
        ActionEffect::RevealBiography {
            part: id.clone(),
            field: BiographyField::Job,
        },
        ActionEffect::AdjustTrust {
            part: id.clone(),
            delta: ctx.config.trust.reveal_gain,
        },
    ];
    let text = state
        .dialogues
        .burdened_job_appraisal
        .as_deref()
        .or(state.biography.job.as_deref());
    effects.extend(bubble(id, text));
    Ok((ActionOutcome::Job(JobOutcome::RevealedJob), effects))
}

fn who_do_you_see(id: &PartId, ctx: &ActionContext<'_>) -> Result<Resolution, Rejection> {
    let state = part(id, ctx)?;
    if state.biography.identity_revealed {
        return Ok((
            ActionOutcome::WhoDoYouSee(WhoDoYouSeeOutcome::AlreadyAnswered),
            Vec::new(),
        ));
    }
    if let Some(proxy) = ctx.relationships.first_proxy(id) {
        let mut effects = vec![
            ActionEffect::ConsumeProxy {
                part: id.clone(),
                proxy: proxy.clone(),
            },
            ActionEffect::Blend {
                part: proxy.clone(),
                reason: BlendReason::Proxy,
                degree: 1.0,
            },
        ];
        let seen = ctx.model.part(proxy).map(|p| format!("I see {}.", p.name));
        effects.extend(bubble(id, seen.as_deref()));
        return Ok((
            ActionOutcome::WhoDoYouSee(WhoDoYouSeeOutcome::SeesProxy {
                proxy: proxy.clone(),
            }),
            effects,
        ));
    }
    let mut effects = vec![
        ActionEffect::RevealBiography {
            part: id.clone(),
            field: BiographyField::Identity,
        },
        ActionEffect::AdjustTrust {
            part: id.clone(),
            delta: ctx.config.trust.reveal_gain,
        },
    ];
    effects.extend(bubble(id, state.biography.identity.as_deref()));
    Ok((
        ActionOutcome::WhoDoYouSee(WhoDoYouSeeOutcome::RevealedIdentity),
        effects,
    ))
}

fn feel_toward(id: &PartId, ctx: &ActionContext<'_>) -> Result<Resolution, Rejection> {
    let state = part(id, ctx)?;
    if state.biography.self_reaction_revealed {
        return Ok((
            ActionOutcome::FeelToward(FeelTowardOutcome::AlreadyAnswered),
            Vec::new(),
        ));
    }
    if let Some(blended) = ctx.model.blended_parts().find(|other| *other != id) {
        let line = ctx
            .model
            .part(blended)
            .and_then(|p| p.dialogues.blended.first())
            .map(String::as_str);
        let effects = bubble(blended, line).into_iter().collect();
        return Ok((
            ActionOutcome::FeelToward(FeelTowardOutcome::BlendedPartResponds {
                blended: blended.clone(),
            }),
            effects,
        ));
    }
    Ok((
        ActionOutcome::FeelToward(FeelTowardOutcome::RevealedSelfReaction),
        vec![
            ActionEffect::RevealBiography {
                part: id.clone(),
                field: BiographyField::SelfReaction,
            },
            ActionEffect::CreateSelfRay { part: id.clone() },
            ActionEffect::AdjustTrust {
                part: id.clone(),
                delta: ctx.config.trust.reveal_gain,
            },
        ],
    ))
}

fn help_protected(
    request: &ActionRequest,
    ctx: &ActionContext<'_>,
    rng: &mut SimRng,
) -> Result<Resolution, Rejection> {
    let id = &request.cloud_id;
    let state = part(id, ctx)?;
    if state.biography.consent_revealed {
        return Ok((
            ActionOutcome::HelpProtected(HelpProtectedOutcome::AlreadyAnswered),
            Vec::new(),
        ));
    }
    let protected = request
        .target_cloud_id
        .as_ref()
        .or_else(|| ctx.relationships.protected_by(id).next())
        .ok_or_else(|| Rejection::NotProtecting {
            protector: id.clone(),
            protected: "anyone".to_owned(),
        })?
        .clone();
    let protected_trust = part(&protected, ctx)?.trust;

    if protected_trust >= rng.random("help_protected") {
        Ok((
            ActionOutcome::HelpProtected(HelpProtectedOutcome::ConsentedToHelp {
                protected: protected.clone(),
            }),
            vec![
                ActionEffect::RevealBiography {
                    part: id.clone(),
                    field: BiographyField::Consent,
                },
                ActionEffect::AddTarget { part: protected },
                ActionEffect::AdjustTrust {
                    part: id.clone(),
                    delta: ctx.config.trust.consent_gain,
                },
            ],
        ))
    } else {
        Ok((
            ActionOutcome::HelpProtected(HelpProtectedOutcome::RefusedToHelp { protected }),
            vec![ActionEffect::AdjustTrust {
                part: id.clone(),
                delta: -ctx.config.trust.refusal_penalty,
            }],
        ))
    }
}

fn notice_part(request: &ActionRequest, ctx: &ActionContext<'_>) -> Result<Resolution, Rejection> {
    let id = &request.cloud_id;
    let target = request
        .target_cloud_id
        .as_ref()
        .ok_or(Rejection::MissingTarget {
            action: request.action,
        })?;
    let actor = part(id, ctx)?;
    let noticed = part(target, ctx)?;
    let gain = ctx.config.trust.recognition_gain;

    if target == id {
        let mut effects = Vec::new();
        if actor.attacked && ctx.relationships.has_grievance_against(id, id) {
            effects.push(ActionEffect::ResolveGrievance {
                holder: id.clone(),
                target: id.clone(),
            });
        }
        return Ok((
            ActionOutcome::NoticePart(NoticePartOutcome::NoticedItself),
            effects,
        ));
    }

    if ctx.relationships.protects(id, target) && actor.biography.job_revealed {
        let mut effects = vec![ActionEffect::AdjustTrust {
            part: id.clone(),
            delta: gain,
        }];
        effects.extend(bubble(id, actor.dialogues.burdened_job_impact.as_deref()));
        return Ok((
            ActionOutcome::NoticePart(NoticePartOutcome::RecognizedBurden {
                target: target.clone(),
            }),
            effects,
        ));
    }

    if ctx.relationships.protects(target, id) {
        return Ok((
            ActionOutcome::NoticePart(NoticePartOutcome::RecognizedProtector {
                target: target.clone(),
            }),
            vec![ActionEffect::AdjustTrust {
                part: target.clone(),
                delta: gain,
            }],
        ));
    }

    if noticed.attacked && ctx.relationships.has_grievance_against(id, target) {
        return Ok((
            ActionOutcome::NoticePart(NoticePartOutcome::RecognizedHarm {
                target: target.clone(),
            }),
            vec![
                ActionEffect::ResolveGrievance {
                    holder: id.clone(),
                    target: target.clone(),
                },
                ActionEffect::AdjustTrust {
                    part: target.clone(),
                    delta: gain,
                },
            ],
        ));
    }

    Ok((
        ActionOutcome::NoticePart(NoticePartOutcome::Noticed {
            target: target.clone(),
        }),
        Vec::new(),
    ))
}

// ---------------------------------------------------------------------------
// Self-ray, waiting and mode
// ---------------------------------------------------------------------------

fn ray_field_select(
    request: &ActionRequest,
    ctx: &ActionContext<'_>,
    rng: &mut SimRng,
) -> Result<Resolution, Rejection> {
    let id = &request.cloud_id;
    let field = request.field.ok_or(Rejection::MissingField)?;
    let state = part(id, ctx)?;
    if state.biography.is_revealed(field) {
        return Ok((
            ActionOutcome::RayFieldSelect(RayFieldOutcome::AlreadyAnswered { field }),
            Vec::new(),
        ));
    }

    // Lowest-id present part that either guards this one without consent or
    // holds a grievance against it.
    let candidate = ctx.model.parts().find(|other| {
        other.id != *id
            && ctx.model.is_present(&other.id)
            && ((ctx.relationships.protects(&other.id, id)
                && !other.biography.consent_revealed)
                || ctx.relationships.has_grievance_against(&other.id, id))
    });
    let backlash = match candidate {
        Some(protector) if protector.trust < rng.random("ray_field_backlash") => Some(protector),
        _ => None,
    };
    if let Some(protector) = backlash {
        return Ok((
            ActionOutcome::RayFieldSelect(RayFieldOutcome::TriggeredBacklash {
                protector: protector.id.clone(),
            }),
            vec![ActionEffect::Backlash {
                protector: protector.id.clone(),
                protectee: id.clone(),
            }],
        ));
    }

    let mut effects = vec![
        ActionEffect::RevealBiography {
            part: id.clone(),
            field,
        },
        ActionEffect::AdjustTrust {
            part: id.clone(),
            delta: ctx.config.trust.reveal_gain,
        },
    ];
    effects.extend(bubble(id, state.biography.fact(field)));
    Ok((
        ActionOutcome::RayFieldSelect(RayFieldOutcome::RevealedField { field }),
        effects,
    ))
}

fn ask_to_wait(
    id: &PartId,
    ctx: &ActionContext<'_>,
    rng: &mut SimRng,
) -> Result<Resolution, Rejection> {
    let state = part(id, ctx)?;
    if state.trust >= rng.random("ask_to_wait") {
        return Ok((
            ActionOutcome::AskToWait(AskToWaitOutcome::AgreedToWait),
            vec![
                ActionEffect::AgreeToWait {
                    part: id.clone(),
                    duration: ctx.config.attention.wait_duration,
                },
                ActionEffect::ResetAttention { part: id.clone() },
                ActionEffect::AdjustTrust {
                    part: id.clone(),
                    delta: ctx.config.trust.wait_gain,
                },
            ],
        ));
    }
    Ok((
        ActionOutcome::AskToWait(AskToWaitOutcome::DeclinedToWait),
        Vec::new(),
    ))
}

fn switch_mode(request: &ActionRequest, ctx: &ActionContext<'_>) -> Result<Resolution, Rejection> {
    let mode = request.new_mode.ok_or(Rejection::MissingMode)?;
    if ctx.model.mode() == mode {
        return Ok((
            ActionOutcome::SwitchMode(SwitchModeOutcome::AlreadyInMode { mode }),
            Vec::new(),
        ));
    }
    Ok((
        ActionOutcome::SwitchMode(SwitchModeOutcome::ModeChanged { mode }),
        vec![ActionEffect::SetMode { mode }],
    ))
}
