//! Integration tests for session recording and replay.
//!
//! Covers three paths: a checked-in session file, a session recorded live
//! from the built-in scenario, and a session pushed through a JSON round
//! trip before replay.

// Integration tests use unwrap extensively for clarity -- panicking on
// failure is the correct behavior in test code.
#![allow(clippy::unwrap_used)]

use std::path::PathBuf;

use ifs_core::config::SimConfig;
use ifs_core::replay::{ReplayError, SessionReplayer};
use ifs_core::scenario::Scenario;
use ifs_core::simulation::SimulationContext;
use ifs_types::{
    ActionKind, ActionRequest, BiographyField, BlendReason, PartId, RecordedSession, SimulationMode,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Record a scripted session on the built-in scenario.
fn record_live(seed: u64) -> RecordedSession {
    let mut ctx = SimulationContext::new(SimConfig::default(), seed);
    Scenario::inner_critic().install(&mut ctx).unwrap();
    ctx.start_recording("0.1.0", "integration");

    let script = [
        ActionRequest::new(ActionKind::SelectATarget, "criticized"),
        ActionRequest::new(ActionKind::SelectATarget, "inner-critic"),
        ActionRequest::new(ActionKind::Job, "inner-critic"),
        ActionRequest::new(ActionKind::FeelToward, "criticized"),
        ActionRequest::new(ActionKind::RayFieldSelect, "criticized").with_field(BiographyField::Age),
        ActionRequest::new(ActionKind::HelpProtected, "inner-critic"),
        ActionRequest::new(ActionKind::Separate, "inner-critic"),
        ActionRequest::new(ActionKind::AskToWait, "criticized"),
        ActionRequest::new(ActionKind::SwitchMode, "").with_mode(SimulationMode::Panorama),
    ];
    for request in &script {
        ctx.execute(request).unwrap();
        // Uneven frame times exercise the tick quantization.
        for _ in 0..7 {
            ctx.advance(0.37).unwrap();
        }
    }
    ctx.advance(20.0).unwrap();
    ctx.finish_recording().unwrap()
}

#[test]
fn protector_backlash_fixture_replays() {
    let session = SessionReplayer::load(&fixture("protector_backlash.json")).unwrap();
    assert_eq!(session.version, 1);
    assert_eq!(session.initial_model.parts.len(), 2);
    assert_eq!(session.actions.len(), 24);
    assert!(session.final_model.is_some());
    assert!(session.final_relationships.is_some());
    assert!(session.actions.iter().all(|a| a.rng_call_count.is_some()));

    let report = SessionReplayer::new(SimConfig::default())
        .replay(&session)
        .unwrap();
    assert_eq!(report.action_results.len(), 24);
    assert!(report.is_clean(), "{:?} {:?}", report.differences, report.rng_mismatches);
    for (index, result) in report.action_results.iter().enumerate() {
        assert!(result.success, "action {index} failed: {:?}", result.message);
    }

    let changes: Vec<&str> = report
        .action_results
        .iter()
        .flat_map(|r| r.state_changes.iter().map(String::as_str))
        .collect();
    for expected in [
        "criticized:TRIGGERED_BACKLASH:inner-critic",
        "inner-critic:RECOGNIZED_BURDEN:criticized",
        "criticized:SEES_PROXY:inner-critic",
        "inner-critic:REVEALED_FIELD:relationships",
        "inner-critic:CONSENTED_TO_HELP:criticized",
        "inner-critic:NOTICED_ITSELF",
        "criticized:AGREED_TO_WAIT",
        ":MODE_CHANGED:panorama",
    ] {
        assert!(changes.contains(&expected), "missing {expected} in {changes:?}");
    }
}

#[test]
fn fixture_backlash_blends_the_protector() {
    let session = SessionReplayer::load(&fixture("protector_backlash.json")).unwrap();
    let model = session.final_model.unwrap();
    let relationships = session.final_relationships.unwrap();
    let critic = PartId::from("inner-critic");

    let blend = model.blended.get(&critic).unwrap();
    assert_eq!(blend.reason, BlendReason::Proxy);
    let state = model.parts.get(&critic).unwrap();
    assert!(state.was_proxy);
    assert!(state.biography.consent_revealed);
    assert!((state.need_attention - 0.5).abs() < 1e-12);
    assert!(relationships.grievances.is_empty());
    assert!(relationships.proxies.is_empty());
    assert!(!model.victory);

    // One draw each: the backlash roll, two grievances, two dialogue lines
    // before the last action, the consent roll and the wait roll.
    let draws: u64 = session.actions.iter().filter_map(|a| a.rng_call_count).sum();
    assert_eq!(draws, 7);
    assert_eq!(session.actions.get(3).and_then(|a| a.rng_call_count), Some(1));
}

#[test]
fn fixture_tampering_is_detected() {
    let mut session = SessionReplayer::load(&fixture("protector_backlash.json")).unwrap();
    if let Some(part) = session
        .final_model
        .as_mut()
        .and_then(|model| model.parts.get_mut(&PartId::from("inner-critic")))
    {
        part.trust = 0.3;
    }
    if let Some(record) = session.actions.get_mut(17) {
        record.rng_call_count = Some(0);
    }
    let report = SessionReplayer::new(SimConfig::default())
        .replay(&session)
        .unwrap();
    assert_eq!(
        report.differences.first().map(|d| d.path.as_str()),
        Some("model.parts.inner-critic.trust")
    );
    assert_eq!(report.rng_mismatches.first().map(|m| m.index), Some(17));
}

#[test]
fn live_recording_replays_without_differences() {
    let session = record_live(1234);
    assert!(session.final_model.is_some());
    let counted: u64 = session
        .actions
        .iter()
        .filter_map(|a| a.rng_call_count)
        .sum();
    assert!(counted > 0);

    let report = SessionReplayer::new(SimConfig::default())
        .replay(&session)
        .unwrap();
    assert_eq!(report.action_results.len(), session.driver_action_count());
    assert!(report.is_clean(), "{:?}", report.differences);
}

#[test]
fn json_round_trip_preserves_replay() {
    let session = record_live(77);
    let text = serde_json::to_string_pretty(&session).unwrap();
    assert!(text.contains("\"modelSeed\""));
    let parsed = SessionReplayer::parse(&text).unwrap();
    let report = SessionReplayer::new(SimConfig::default())
        .replay(&parsed)
        .unwrap();
    assert!(report.is_clean());
}

#[test]
fn unsupported_version_is_rejected() {
    let mut session = record_live(5);
    session.version = 0;
    let result = SessionReplayer::new(SimConfig::default()).replay(&session);
    assert!(matches!(
        result,
        Err(ReplayError::UnsupportedVersion { found: 0 })
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let result = SessionReplayer::load(&fixture("does_not_exist.json"));
    assert!(matches!(result, Err(ReplayError::Io { .. })));
}
