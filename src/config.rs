//! Configuration management for Ampshare
//!
//! This module handles loading, validation, and management of the balancer
//! configuration from YAML files. Values under `balancing` and the per-charger
//! limits are only the startup values: they can be changed at runtime through
//! the coordinator, which recomputes immediately.

use crate::coordinator::FallbackMode;
use crate::error::{AmpshareError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

mod defaults;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identifier of the managed service, carried on every emitted event
    pub service_id: String,

    /// Electrical service (breaker) limits
    pub service: ServiceConfig,

    /// Chargers sharing the service, in distribution order
    pub chargers: Vec<ChargerConfig>,

    /// Balancing behaviour
    pub balancing: BalancingConfig,

    /// Charger actuator configuration
    pub actuator: ActuatorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Where the host keeps the last committed state across restarts
    pub persistence_file: String,
}

/// Electrical service limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Nominal supply voltage in Volts
    pub voltage: f64,

    /// Whole-house breaker / service rating in Amps
    pub max_service_current: f64,
}

/// Per-charger operating band
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargerConfig {
    /// Identifier passed to the actuator
    pub id: String,

    /// Below this current charging stops instead of trickling
    pub min_current: f64,

    /// Highest current the charger may be commanded
    pub max_current: f64,

    /// Resolution of current adjustments
    #[serde(default = "defaults::default_step")]
    pub step: f64,
}

/// Behaviour when the power meter is unavailable or unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableBehavior {
    /// Stop charging (0 A)
    Stop,
    /// Keep the last committed current
    Ignore,
    /// Apply the configured fallback current, capped at the charger maximum
    SetCurrent,
}

/// Balancing behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancingConfig {
    /// Whether load balancing starts enabled
    pub enabled: bool,

    /// Cooldown after a reduction before the current may rise again
    pub ramp_up_time_s: f64,

    /// What to do while the meter is unavailable
    pub unavailable_behavior: UnavailableBehavior,

    /// Current applied in `set_current` mode
    pub unavailable_fallback_current: f64,
}

/// How charger commands are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorKind {
    /// Only log the commands (dry run)
    Log,
    /// Run shell commands per action
    Command,
}

/// Charger actuator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    pub kind: ActuatorKind,

    /// Upper bound for a single actuator call
    pub command_timeout_ms: u64,

    /// Shell command run to set the charging current
    pub set_current_command: Option<String>,

    /// Shell command run to start charging
    pub start_command: Option<String>,

    /// Shell command run to stop charging
    pub stop_command: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional override for the console output level
    pub console_level: Option<String>,

    /// Optional override for the file output level
    pub file_level: Option<String>,

    /// Path to log file (its directory receives the rolling files)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl BalancingConfig {
    /// Fallback policy in the form the coordinator consumes
    pub const fn fallback_mode(&self) -> FallbackMode {
        match self.unavailable_behavior {
            UnavailableBehavior::Stop => FallbackMode::Stop,
            UnavailableBehavior::Ignore => FallbackMode::Ignore,
            UnavailableBehavior::SetCurrent => {
                FallbackMode::SetCurrent(self.unavailable_fallback_current)
            }
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        let default_paths = [
            "ampshare.yaml",
            "/data/ampshare.yaml",
            "/etc/ampshare/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.service_id.trim().is_empty() {
            return Err(AmpshareError::validation(
                "service_id",
                "Service id cannot be empty",
            ));
        }

        if !(self.service.voltage > 0.0) {
            return Err(AmpshareError::validation(
                "service.voltage",
                "Must be positive",
            ));
        }

        if !(self.service.max_service_current > 0.0) {
            return Err(AmpshareError::validation(
                "service.max_service_current",
                "Must be positive",
            ));
        }

        if self.chargers.is_empty() {
            return Err(AmpshareError::validation(
                "chargers",
                "At least one charger is required",
            ));
        }

        let mut seen = HashSet::new();
        for (i, charger) in self.chargers.iter().enumerate() {
            let field = |name: &str| format!("chargers[{}].{}", i, name);
            if charger.id.trim().is_empty() {
                return Err(AmpshareError::validation(field("id"), "Cannot be empty"));
            }
            if !seen.insert(charger.id.as_str()) {
                return Err(AmpshareError::validation(
                    field("id"),
                    format!("Duplicate charger id '{}'", charger.id),
                ));
            }
            if !(charger.min_current > 0.0) {
                return Err(AmpshareError::validation(
                    field("min_current"),
                    "Must be positive",
                ));
            }
            if charger.max_current < charger.min_current {
                return Err(AmpshareError::validation(
                    field("max_current"),
                    "Must not be below min_current",
                ));
            }
            if !(charger.step > 0.0) {
                return Err(AmpshareError::validation(field("step"), "Must be positive"));
            }
        }

        if !(self.balancing.ramp_up_time_s >= 0.0) {
            return Err(AmpshareError::validation(
                "balancing.ramp_up_time_s",
                "Must not be negative",
            ));
        }

        if !(self.balancing.unavailable_fallback_current >= 0.0) {
            return Err(AmpshareError::validation(
                "balancing.unavailable_fallback_current",
                "Must not be negative",
            ));
        }

        if self.actuator.command_timeout_ms == 0 {
            return Err(AmpshareError::validation(
                "actuator.command_timeout_ms",
                "Must be greater than 0",
            ));
        }

        crate::logging::parse_log_level(&self.logging.level)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.voltage, 230.0);
        assert_eq!(config.service.max_service_current, 32.0);
        assert_eq!(config.chargers.len(), 1);
        assert_eq!(config.chargers[0].min_current, 6.0);
        assert_eq!(config.balancing.ramp_up_time_s, 30.0);
        assert_eq!(config.balancing.unavailable_behavior, UnavailableBehavior::Stop);
        assert!(config.balancing.enabled);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.service.voltage = 0.0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.chargers[0].min_current = 20.0;
        config.chargers[0].max_current = 16.0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.chargers.push(config.chargers[0].clone());
        assert!(config.validate().is_err());

        config = Config::default();
        config.chargers.clear();
        assert!(config.validate().is_err());

        config = Config::default();
        config.logging.level = "chatty".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fallback_mode_mapping() {
        let mut balancing = BalancingConfig::default();
        assert_eq!(balancing.fallback_mode(), FallbackMode::Stop);

        balancing.unavailable_behavior = UnavailableBehavior::SetCurrent;
        balancing.unavailable_fallback_current = 10.0;
        assert_eq!(balancing.fallback_mode(), FallbackMode::SetCurrent(10.0));

        balancing.unavailable_behavior = UnavailableBehavior::Ignore;
        assert_eq!(balancing.fallback_mode(), FallbackMode::Ignore);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let deserialized: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.chargers[0].id, deserialized.chargers[0].id);
        assert_eq!(config.actuator.kind, deserialized.actuator.kind);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
service_id: garage
service:
  voltage: 240
  max_service_current: 40
chargers:
  - id: left
    min_current: 6
    max_current: 16
  - id: right
    min_current: 6
    max_current: 32
    step: 0.5
balancing:
  unavailable_behavior: set_current
  unavailable_fallback_current: 8
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.chargers[0].step, 1.0);
        assert_eq!(config.chargers[1].step, 0.5);
        assert_eq!(config.balancing.ramp_up_time_s, 30.0);
        assert_eq!(config.balancing.fallback_mode(), FallbackMode::SetCurrent(8.0));
        assert_eq!(config.actuator.kind, ActuatorKind::Log);
    }
}
