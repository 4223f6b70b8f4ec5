use crate::meter::MeterReading;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Immutable per-deployment service limit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceLimit {
    /// Nominal supply voltage, always > 0
    pub voltage_v: f64,
    /// Breaker / service rating in Amps
    pub max_service_a: f64,
}

/// One charger's operating band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargerSpec {
    pub id: String,
    pub min_a: f64,
    pub max_a: f64,
    pub step_a: f64,
}

/// Mutable per-charger state owned by the coordinator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChargerRuntimeState {
    /// Last committed current; 0 means stopped
    pub current_a: f64,
    /// Monotonic seconds of the last ramp-tracked reduction
    pub last_reduction_s: Option<f64>,
    /// Whether the committed current is above zero
    pub active: bool,
}

/// Policy applied while the power meter is unavailable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "current_a", rename_all = "snake_case")]
pub enum FallbackMode {
    Stop,
    Ignore,
    SetCurrent(f64),
}

impl FallbackMode {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Ignore => "ignore",
            Self::SetCurrent(_) => "set_current",
        }
    }
}

/// Runtime-mutable coordinator settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSettings {
    pub enabled: bool,
    pub fallback: FallbackMode,
    pub ramp_up_time_s: f64,
}

/// Why the last committed current was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionReason {
    PowerMeterUpdate,
    ParameterChange,
    ManualOverride,
    FallbackUnavailable,
}

impl ActionReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PowerMeterUpdate => "power_meter_update",
            Self::ParameterChange => "parameter_change",
            Self::ManualOverride => "manual_override",
            Self::FallbackUnavailable => "fallback_unavailable",
        }
    }
}

/// Operational state label, derived after every cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalancerState {
    Stopped,
    Charging,
    Adjusting,
    RampUpHold,
    MeterUnavailable,
    Disabled,
}

impl BalancerState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Charging => "charging",
            Self::Adjusting => "adjusting",
            Self::RampUpHold => "ramp_up_hold",
            Self::MeterUnavailable => "meter_unavailable",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for BalancerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Abstract charger operation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "current_a", rename_all = "snake_case")]
pub enum ChargerAction {
    Start,
    Stop,
    SetCurrent(f64),
}

impl ChargerAction {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start_charging",
            Self::Stop => "stop_charging",
            Self::SetCurrent(_) => "set_current",
        }
    }
}

/// A command addressed to one charger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargerCommand {
    pub charger_id: String,
    pub action: ChargerAction,
}

/// Discrete notification emitted for hosts and automations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancerEvent {
    pub service_id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: BalancerEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BalancerEventKind {
    /// Meter went unavailable and charging was stopped
    MeterUnavailable,
    /// Meter went unavailable and a fallback current is in force
    FallbackActivated {
        charger_id: String,
        fallback_current_a: f64,
    },
    /// Household load forced a charger to stop
    OverloadStop {
        charger_id: String,
        previous_current_a: f64,
        available_current_a: f64,
    },
    /// A stopped charger was given a current again
    ChargingResumed { charger_id: String, current_a: f64 },
    /// A valid reading arrived after an unavailable period
    MeterRecovered,
    /// An actuator call failed
    ActionFailed {
        charger_id: String,
        action: String,
        error: String,
    },
}

/// What one coordinator cycle asks of the outside world
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleOutcome {
    pub commands: Vec<ChargerCommand>,
    pub events: Vec<BalancerEvent>,
}

impl CycleOutcome {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.events.is_empty()
    }
}

/// State restored from a previous run, applied before the first recompute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitialState {
    pub enabled: Option<bool>,
    pub currents: HashMap<String, f64>,
}

/// A runtime parameter change from the settings source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "parameter", content = "value", rename_all = "snake_case")]
pub enum ParameterChange {
    MaxCurrent { charger_id: String, current_a: f64 },
    MinCurrent { charger_id: String, current_a: f64 },
    Enabled(bool),
    RampUpTime(f64),
    Fallback(FallbackMode),
    ServiceLimit(ServiceLimit),
}

/// Messages consumed by the coordinator's event queue
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    Meter(MeterReading),
    Parameter(ParameterChange),
    ManualOverride {
        charger_id: Option<String>,
        current_a: f64,
    },
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargerSnapshot {
    pub id: String,
    pub current_a: f64,
    pub active: bool,
    pub min_current_a: f64,
    pub max_current_a: f64,
}

/// Observable coordinator state, published after every cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancerSnapshot {
    pub service_id: String,
    pub timestamp: String,
    pub state: BalancerState,
    pub last_action_reason: Option<ActionReason>,
    pub available_current_a: f64,
    pub enabled: bool,
    pub meter_healthy: bool,
    pub fallback_active: bool,
    pub configured_fallback: String,
    pub ramp_up_time_s: f64,
    pub chargers: Vec<ChargerSnapshot>,
}

impl BalancerSnapshot {
    /// Sum of committed currents across chargers
    pub fn total_current_a(&self) -> f64 {
        self.chargers.iter().map(|c| c.current_a).sum()
    }
}
