//! Headless driver for the IFS simulator.
//!
//! Loads `ifs-config.yaml`, then either replays a recorded session and
//! reports any divergence, or runs a scripted demo of the built-in inner
//! critic scenario, replays its own recording and logs the verdict. It can
//! also play a planned star transition through to completion.
//!
//! # Commands
//!
//! - `ifs-engine replay <session.json>` exits non-zero if the replay diverges.
//! - `ifs-engine demo [ticks] [--out <path>]` optionally writes the recording.
//! - `ifs-engine star [arms] [--out <path>]` optionally writes the frames.

mod demo;
mod error;
mod star;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ifs_core::config::SimConfig;
use ifs_core::replay::{ReplayReport, SessionReplayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Command line summary printed on usage errors.
pub const USAGE: &str = "usage: ifs-engine replay <session.json>\n       \
                         ifs-engine demo [ticks] [--out <path>]\n       \
                         ifs-engine star [arms] [--out <path>]";

/// Seed used by the demo run.
const DEMO_SEED: u64 = 20_240_611;

/// Ticks run after the demo script when none are given.
const DEFAULT_SETTLE_TICKS: u32 = 40;

/// Arms in the played star when none are given.
const DEFAULT_STAR_ARMS: usize = 5;

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Replay { session: PathBuf },
    Demo { ticks: u32, out: Option<PathBuf> },
    Star { arms: usize, out: Option<PathBuf> },
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, EngineError> {
        let usage = |message: &str| EngineError::Usage {
            message: message.to_owned(),
        };
        match args.next().as_deref() {
            Some("replay") => {
                let session = args.next().ok_or_else(|| usage("missing session path"))?;
                if let Some(extra) = args.next() {
                    return Err(usage(&format!("unexpected argument: {extra}")));
                }
                Ok(Self::Replay {
                    session: PathBuf::from(session),
                })
            }
            Some("demo") => {
                let (ticks, out) = count_and_out(args, DEFAULT_SETTLE_TICKS, "tick count")?;
                Ok(Self::Demo { ticks, out })
            }
            Some("star") => {
                let (arms, out) = count_and_out(args, DEFAULT_STAR_ARMS, "arm count")?;
                Ok(Self::Star { arms, out })
            }
            Some(other) => Err(usage(&format!("unknown command: {other}"))),
            None => Err(usage("missing command")),
        }
    }
}

/// Parse `[count] [--out <path>]`.
fn count_and_out<T: std::str::FromStr<Err = std::num::ParseIntError>>(
    mut args: impl Iterator<Item = String>,
    default: T,
    what: &str,
) -> Result<(T, Option<PathBuf>), EngineError> {
    let usage = |message: String| EngineError::Usage { message };
    let mut count = default;
    let mut out = None;
    while let Some(arg) = args.next() {
        if arg == "--out" {
            let path = args
                .next()
                .ok_or_else(|| usage("--out needs a path".to_owned()))?;
            out = Some(PathBuf::from(path));
        } else {
            count = arg
                .parse()
                .map_err(|err| usage(format!("invalid {what} {arg}: {err}")))?;
        }
    }
    Ok((count, out))
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if configuration, scenario setup, or a replay fails.
fn main() -> Result<ExitCode, EngineError> {
    let command = Command::parse(std::env::args().skip(1))?;

    // Config first: its logging level is the fallback filter.
    let config = load_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        tick_seconds = config.time.tick_seconds,
        delivery = ?config.messages.delivery,
        "ifs-engine starting"
    );

    let clean = match command {
        Command::Replay { session } => replay_file(&config, &session)?,
        Command::Demo { ticks, out } => run_demo(&config, ticks, out.as_deref())?,
        Command::Star { arms, out } => {
            play_star(arms, out.as_deref())?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    if clean {
        info!("Replay matched the recording");
        Ok(ExitCode::SUCCESS)
    } else {
        warn!("Replay diverged from the recording");
        Ok(ExitCode::FAILURE)
    }
}

/// Load configuration from `ifs-config.yaml` in the working directory.
fn load_config() -> Result<SimConfig, EngineError> {
    let config_path = Path::new("ifs-config.yaml");
    if config_path.exists() {
        Ok(SimConfig::from_file(config_path)?)
    } else {
        Ok(SimConfig::default())
    }
}

fn replay_file(config: &SimConfig, path: &Path) -> Result<bool, EngineError> {
    let session = SessionReplayer::load(path)?;
    info!(
        path = %path.display(),
        seed = session.model_seed,
        actions = session.actions.len(),
        code_version = %session.code_version,
        "Session loaded"
    );
    let report = SessionReplayer::new(config.clone()).replay(&session)?;
    log_report(&report);
    Ok(report.is_clean())
}

fn play_star(arms: usize, out: Option<&Path>) -> Result<(), EngineError> {
    let frames = star::play(&star::plan(arms));
    if let Some(path) = out {
        write_json(path, &serde_json::to_string_pretty(&frames)?)?;
        info!(path = %path.display(), "Frames written");
    }
    Ok(())
}

fn write_json(path: &Path, text: &str) -> Result<(), EngineError> {
    std::fs::write(path, text).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn run_demo(config: &SimConfig, ticks: u32, out: Option<&Path>) -> Result<bool, EngineError> {
    let session = demo::run(config, DEMO_SEED, ticks)?;
    if let Some(path) = out {
        write_json(path, &serde_json::to_string_pretty(&session)?)?;
        info!(path = %path.display(), "Recording written");
    }
    let report = SessionReplayer::new(config.clone()).replay(&session)?;
    log_report(&report);
    Ok(report.is_clean())
}

fn log_report(report: &ReplayReport) {
    let failed = report.action_results.iter().filter(|r| !r.success).count();
    info!(
        actions = report.action_results.len(),
        failed_actions = failed,
        differences = report.differences.len(),
        rng_mismatches = report.rng_mismatches.len(),
        "Replay finished"
    );
    for mismatch in &report.rng_mismatches {
        warn!(
            index = mismatch.index,
            expected = mismatch.expected,
            actual = mismatch.actual,
            "RNG consumption diverged"
        );
    }
    for difference in &report.differences {
        warn!(
            path = %difference.path,
            expected = %difference.expected,
            actual = %difference.actual,
            "State differs"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args<'a>(list: &'a [&'a str]) -> impl Iterator<Item = String> + 'a {
        list.iter().map(|s| (*s).to_owned())
    }

    #[test]
    fn parses_replay() {
        let command = Command::parse(args(&["replay", "s.json"])).unwrap();
        assert_eq!(
            command,
            Command::Replay {
                session: PathBuf::from("s.json")
            }
        );
    }

    #[test]
    fn parses_demo_with_defaults_and_options() {
        assert_eq!(
            Command::parse(args(&["demo"])).unwrap(),
            Command::Demo {
                ticks: DEFAULT_SETTLE_TICKS,
                out: None
            }
        );
        assert_eq!(
            Command::parse(args(&["demo", "12", "--out", "run.json"])).unwrap(),
            Command::Demo {
                ticks: 12,
                out: Some(PathBuf::from("run.json"))
            }
        );
    }

    #[test]
    fn parses_star() {
        assert_eq!(
            Command::parse(args(&["star"])).unwrap(),
            Command::Star {
                arms: DEFAULT_STAR_ARMS,
                out: None
            }
        );
        assert_eq!(
            Command::parse(args(&["star", "7", "--out", "frames.json"])).unwrap(),
            Command::Star {
                arms: 7,
                out: Some(PathBuf::from("frames.json"))
            }
        );
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(Command::parse(args(&[])).is_err());
        assert!(Command::parse(args(&["replay"])).is_err());
        assert!(Command::parse(args(&["demo", "lots"])).is_err());
        assert!(Command::parse(args(&["demo", "--out"])).is_err());
        assert!(Command::parse(args(&["star", "-1"])).is_err());
        assert!(Command::parse(args(&["serve"])).is_err());
    }

    #[test]
    fn demo_recording_replays_clean() {
        let config = SimConfig::default();
        let session = demo::run(&config, DEMO_SEED, 10).unwrap();
        assert_eq!(session.driver_action_count(), 10);
        let report = SessionReplayer::new(config).replay(&session).unwrap();
        assert!(report.is_clean(), "{:?}", report.differences);
    }
}
