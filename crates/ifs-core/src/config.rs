//! Configuration loading and typed config structures for the IFS simulator.
//!
//! The configuration lives in `ifs-config.yaml`. Every section and every
//! field has a default, so an empty document (or no file at all) yields the
//! tuning the simulator ships with. All durations are simulated seconds.

use std::path::Path;

use ifs_types::DeliveryMode;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but holds values the simulator cannot run with.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulator configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimConfig {
    /// Tick quantization.
    #[serde(default)]
    pub time: TimeConfig,

    /// Attention growth and urgency.
    #[serde(default)]
    pub attention: AttentionConfig,

    /// Blending and backlash.
    #[serde(default)]
    pub blending: BlendingConfig,

    /// Message timers and delivery.
    #[serde(default)]
    pub messages: MessagesConfig,

    /// Trust adjustments applied by actions and messages.
    #[serde(default)]
    pub trust: TrustConfig,

    /// Self-leadership predicate.
    #[serde(default)]
    pub victory: VictoryConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values that would stall or corrupt a run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.time.tick_seconds.is_finite() && self.time.tick_seconds > 0.0) {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "time.tick_seconds must be positive, got {}",
                    self.time.tick_seconds
                ),
            });
        }
        if self.time.max_ticks_per_advance == 0 {
            return Err(ConfigError::Invalid {
                reason: "time.max_ticks_per_advance must be at least 1".to_owned(),
            });
        }
        if !(0.0..=1.0).contains(&self.victory.min_trust) {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "victory.min_trust must be within [0, 1], got {}",
                    self.victory.min_trust
                ),
            });
        }
        if self.messages.grievance_cooldown <= 0.0 || self.messages.blended_dialogue_interval <= 0.0
        {
            return Err(ConfigError::Invalid {
                reason: "message intervals must be positive".to_owned(),
            });
        }
        Ok(())
    }
}

/// Tick quantization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeConfig {
    /// Simulated seconds covered by one tick.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: f64,

    /// Upper bound on the ticks a single `advance` call may run.
    #[serde(default = "default_max_ticks_per_advance")]
    pub max_ticks_per_advance: u64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            tick_seconds: default_tick_seconds(),
            max_ticks_per_advance: default_max_ticks_per_advance(),
        }
    }
}

/// Attention growth and urgency.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttentionConfig {
    /// Need growth per simulated second while in panorama mode.
    #[serde(default = "default_panorama_rate")]
    pub panorama_rate: f64,

    /// Need growth per simulated second while in foreground mode.
    #[serde(default = "default_foreground_rate")]
    pub foreground_rate: f64,

    /// Need level at which a part starts demanding attention.
    #[serde(default = "default_demand_threshold")]
    pub demand_threshold: f64,

    /// How long a part waits after agreeing to.
    #[serde(default = "default_wait_duration")]
    pub wait_duration: f64,
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            panorama_rate: default_panorama_rate(),
            foreground_rate: default_foreground_rate(),
            demand_threshold: default_demand_threshold(),
            wait_duration: default_wait_duration(),
        }
    }
}

/// Blending and backlash.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlendingConfig {
    /// Unscaled blend reduction applied by one `separate`.
    #[serde(default = "default_separate_base")]
    pub separate_base: f64,

    /// Need-attention added to a protector when it backlashes.
    #[serde(default = "default_backlash_attention_spike")]
    pub backlash_attention_spike: f64,
}

impl Default for BlendingConfig {
    fn default() -> Self {
        Self {
            separate_base: default_separate_base(),
            backlash_attention_spike: default_backlash_attention_spike(),
        }
    }
}

/// Message timers and delivery.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessagesConfig {
    /// Seconds between two grievance messages from the same holder.
    #[serde(default = "default_grievance_cooldown")]
    pub grievance_cooldown: f64,

    /// Seconds between two ambient lines from the same blended part.
    #[serde(default = "default_blended_dialogue_interval")]
    pub blended_dialogue_interval: f64,

    /// How long a thought bubble stays visible.
    #[serde(default = "default_bubble_duration")]
    pub bubble_duration: f64,

    /// Travel time of a message in `travel` delivery mode.
    #[serde(default = "default_travel_time")]
    pub travel_time: f64,

    /// Whether messages arrive in the tick that sends them.
    #[serde(default)]
    pub delivery: DeliveryMode,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            grievance_cooldown: default_grievance_cooldown(),
            blended_dialogue_interval: default_blended_dialogue_interval(),
            bubble_duration: default_bubble_duration(),
            travel_time: default_travel_time(),
            delivery: DeliveryMode::default(),
        }
    }
}

/// Trust adjustments.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrustConfig {
    /// Gain when a part reveals something about itself.
    #[serde(default = "default_reveal_gain")]
    pub reveal_gain: f64,

    /// Gain when a part is recognized by another.
    #[serde(default = "default_recognition_gain")]
    pub recognition_gain: f64,

    /// Gain when a protector consents.
    #[serde(default = "default_consent_gain")]
    pub consent_gain: f64,

    /// Loss when a protector refuses.
    #[serde(default = "default_refusal_penalty")]
    pub refusal_penalty: f64,

    /// Loss applied to the protectee on backlash.
    #[serde(default = "default_backlash_penalty")]
    pub backlash_penalty: f64,

    /// Loss applied to the target of a grievance.
    #[serde(default = "default_grievance_penalty")]
    pub grievance_penalty: f64,

    /// Gain when a part agrees to wait.
    #[serde(default = "default_wait_gain")]
    pub wait_gain: f64,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            reveal_gain: default_reveal_gain(),
            recognition_gain: default_recognition_gain(),
            consent_gain: default_consent_gain(),
            refusal_penalty: default_refusal_penalty(),
            backlash_penalty: default_backlash_penalty(),
            grievance_penalty: default_grievance_penalty(),
            wait_gain: default_wait_gain(),
        }
    }
}

/// Self-leadership predicate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VictoryConfig {
    /// Minimum trust every part must hold.
    #[serde(default = "default_min_trust")]
    pub min_trust: f64,
}

impl Default for VictoryConfig {
    fn default() -> Self {
        Self {
            min_trust: default_min_trust(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_tick_seconds() -> f64 {
    0.5
}

const fn default_max_ticks_per_advance() -> u64 {
    1_000_000
}

const fn default_panorama_rate() -> f64 {
    0.01
}

const fn default_foreground_rate() -> f64 {
    0.02
}

const fn default_demand_threshold() -> f64 {
    1.0
}

const fn default_wait_duration() -> f64 {
    30.0
}

const fn default_separate_base() -> f64 {
    0.5
}

const fn default_backlash_attention_spike() -> f64 {
    0.5
}

const fn default_grievance_cooldown() -> f64 {
    8.0
}

const fn default_blended_dialogue_interval() -> f64 {
    6.0
}

const fn default_bubble_duration() -> f64 {
    4.0
}

const fn default_travel_time() -> f64 {
    1.5
}

const fn default_reveal_gain() -> f64 {
    0.05
}

const fn default_recognition_gain() -> f64 {
    0.1
}

const fn default_consent_gain() -> f64 {
    0.1
}

const fn default_refusal_penalty() -> f64 {
    0.05
}

const fn default_backlash_penalty() -> f64 {
    0.1
}

const fn default_grievance_penalty() -> f64 {
    0.02
}

const fn default_wait_gain() -> f64 {
    0.02
}

const fn default_min_trust() -> f64 {
    0.5
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.time.tick_seconds - 0.5).abs() < f64::EPSILON);
        assert!((config.attention.foreground_rate - 0.02).abs() < f64::EPSILON);
        assert_eq!(config.messages.delivery, DeliveryMode::Immediate);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.time.max_ticks_per_advance, 1_000_000);
    }

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = SimConfig::parse("{}").unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
attention:
  foreground_rate: 0.05
messages:
  delivery: travel
  travel_time: 2.0
victory:
  min_trust: 0.6
logging:
  level: debug
";
        let config = SimConfig::parse(yaml).unwrap();
        assert!((config.attention.foreground_rate - 0.05).abs() < f64::EPSILON);
        assert!((config.attention.panorama_rate - 0.01).abs() < f64::EPSILON);
        assert_eq!(config.messages.delivery, DeliveryMode::Travel);
        assert!((config.messages.travel_time - 2.0).abs() < f64::EPSILON);
        assert!((config.messages.grievance_cooldown - 8.0).abs() < f64::EPSILON);
        assert!((config.victory.min_trust - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn zero_tick_is_rejected() {
        let result = SimConfig::parse("time:\n  tick_seconds: 0.0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn zero_tick_budget_is_rejected() {
        let result = SimConfig::parse("time:\n  max_ticks_per_advance: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn invalid_yaml_returns_error() {
        let result = SimConfig::parse("{{not yaml");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_returns_io_error() {
        let result = SimConfig::from_file(Path::new("/nonexistent/ifs-config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
