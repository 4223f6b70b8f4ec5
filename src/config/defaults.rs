use super::*;
use crate::balancer::{MIN_CURRENT_DEFAULT, RAMP_UP_TIME_DEFAULT, STEP_DEFAULT, VOLTAGE_DEFAULT};

pub(super) const fn default_step() -> f64 {
    STEP_DEFAULT
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            voltage: VOLTAGE_DEFAULT,
            max_service_current: 32.0,
        }
    }
}

impl Default for ChargerConfig {
    fn default() -> Self {
        Self {
            id: "charger_1".to_string(),
            min_current: MIN_CURRENT_DEFAULT,
            max_current: 32.0,
            step: STEP_DEFAULT,
        }
    }
}

impl Default for BalancingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ramp_up_time_s: RAMP_UP_TIME_DEFAULT,
            unavailable_behavior: UnavailableBehavior::Stop,
            unavailable_fallback_current: 6.0,
        }
    }
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            kind: ActuatorKind::Log,
            command_timeout_ms: 5000,
            set_current_command: None,
            start_command: None,
            stop_command: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/ampshare.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_id: "main".to_string(),
            service: ServiceConfig::default(),
            chargers: vec![ChargerConfig::default()],
            balancing: BalancingConfig::default(),
            actuator: ActuatorConfig::default(),
            logging: LoggingConfig::default(),
            persistence_file: "/data/ampshare_state.json".to_string(),
        }
    }
}
