//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of a run so `main` can
//! propagate with `?`.

use std::path::PathBuf;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The command line could not be understood.
    #[error("usage error: {message}\n\n{usage}", usage = crate::USAGE)]
    Usage {
        /// What was wrong with the arguments.
        message: String,
    },

    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ifs_core::config::ConfigError,
    },

    /// Scenario setup failed.
    #[error("scenario error: {source}")]
    Scenario {
        /// The underlying scenario error.
        #[from]
        source: ifs_core::scenario::ScenarioError,
    },

    /// The simulation raised a programmer error.
    #[error("simulation error: {source}")]
    Sim {
        /// The underlying simulation error.
        #[from]
        source: ifs_core::error::SimError,
    },

    /// Loading or replaying a session failed.
    #[error("replay error: {source}")]
    Replay {
        /// The underlying replay error.
        #[from]
        source: ifs_core::replay::ReplayError,
    },

    /// The demo finished without a recording to replay.
    #[error("no recording was captured")]
    MissingRecording,

    /// Serializing a session or frames failed.
    #[error("serialization error: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// Writing an output file failed.
    #[error("failed to write {path}: {source}")]
    Io {
        /// The output path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
