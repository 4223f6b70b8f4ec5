//! Balancing coordinator for Ampshare
//!
//! `BalancingCoordinator` is the single owner of all runtime state for one
//! managed service. Each call (meter update, parameter change, manual
//! override) runs one complete cycle synchronously and returns the commands
//! and events it produced; nothing here performs I/O. The async
//! [`CoordinatorService`] wraps it in an event queue and dispatches the
//! commands.
//!
//! Two headroom models are used, one per topology:
//!
//! - a single charger follows the incremental model: the meter already
//!   includes the charger's own draw, so the new target is the committed
//!   current plus the headroom;
//! - several chargers share the EV-draw-subtracted model: the committed
//!   currents are removed from the reading and the resulting pool is
//!   water-filled across the chargers.

use crate::balancer::{
    apply_ramp_up_limit, available_current, available_current_for_ev, clamp_current,
    distribute_current,
};
use crate::config::Config;
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::meter::{MeterReading, MeterValue};
use chrono::Utc;

mod commit;
mod events;
mod fallback;
mod service;
mod types;

pub use service::{CoordinatorHandle, CoordinatorService};
pub use types::*;

/// A charger's band together with its runtime state
#[derive(Debug, Clone)]
struct ManagedCharger {
    spec: ChargerSpec,
    runtime: ChargerRuntimeState,
}

/// Stateful balancing engine for one managed service
#[derive(Debug)]
pub struct BalancingCoordinator {
    service_id: String,
    limit: ServiceLimit,
    chargers: Vec<ManagedCharger>,
    settings: RuntimeSettings,

    /// Last computed headroom in Amps (rounded to 2 decimals)
    available_a: f64,
    last_reason: Option<ActionReason>,
    state: BalancerState,

    meter_healthy: bool,
    fallback_active: bool,
    /// Meter came back while disabled; reported on the next enabled cycle
    recovery_pending: bool,
    last_power_w: Option<f64>,

    logger: StructuredLogger,
}

impl BalancingCoordinator {
    /// Create a coordinator, optionally seeded with a restored state
    pub fn new(
        service_id: &str,
        limit: ServiceLimit,
        chargers: Vec<ChargerSpec>,
        mut settings: RuntimeSettings,
        initial: Option<InitialState>,
    ) -> Self {
        let topology = if chargers.len() == 1 { "single" } else { "multi" };
        let logger = get_logger_with_context(
            LogContext::new("coordinator")
                .with_service_id(service_id)
                .with_field("topology", topology.to_string()),
        );

        let mut managed: Vec<ManagedCharger> = chargers
            .into_iter()
            .map(|spec| ManagedCharger {
                spec,
                runtime: ChargerRuntimeState::default(),
            })
            .collect();

        if let Some(initial) = initial {
            if let Some(enabled) = initial.enabled {
                settings.enabled = enabled;
            }
            for charger in &mut managed {
                if let Some(&current) = initial.currents.get(&charger.spec.id)
                    && current.is_finite()
                {
                    charger.runtime.current_a = current.clamp(0.0, charger.spec.max_a);
                    charger.runtime.active = charger.runtime.current_a > 0.0;
                }
            }
            logger.info("Restored coordinator state from previous run");
        }

        let mut coordinator = Self {
            service_id: service_id.to_string(),
            limit,
            chargers: managed,
            settings,
            available_a: 0.0,
            last_reason: None,
            state: BalancerState::Stopped,
            meter_healthy: true,
            fallback_active: false,
            recovery_pending: false,
            last_power_w: None,
            logger,
        };
        coordinator.state = coordinator.derive_state(false, false);
        coordinator
    }

    /// Build a coordinator from the loaded configuration
    pub fn from_config(config: &Config, initial: Option<InitialState>) -> Self {
        let limit = ServiceLimit {
            voltage_v: config.service.voltage,
            max_service_a: config.service.max_service_current,
        };
        let chargers = config
            .chargers
            .iter()
            .map(|c| ChargerSpec {
                id: c.id.clone(),
                min_a: c.min_current,
                max_a: c.max_current,
                step_a: c.step,
            })
            .collect();
        let settings = RuntimeSettings {
            enabled: config.balancing.enabled,
            fallback: config.balancing.fallback_mode(),
            ramp_up_time_s: config.balancing.ramp_up_time_s,
        };
        Self::new(&config.service_id, limit, chargers, settings, initial)
    }

    // ------------------------------------------------------------------
    // Event entry points
    // ------------------------------------------------------------------

    /// React to a meter update. `now` is monotonic seconds.
    pub fn handle_meter(&mut self, reading: &MeterReading, now: f64) -> CycleOutcome {
        let power_w = match &reading.value {
            MeterValue::Power(w) if w.is_finite() => *w,
            MeterValue::Power(w) => {
                self.logger
                    .debug(&format!("Discarding non-finite power meter value: {}", w));
                return CycleOutcome::default();
            }
            MeterValue::Invalid(raw) => {
                self.logger
                    .debug(&format!("Could not parse power meter value: {}", raw));
                return CycleOutcome::default();
            }
            MeterValue::Unavailable | MeterValue::Unknown => {
                if !self.settings.enabled {
                    self.meter_healthy = false;
                    return CycleOutcome::default();
                }
                return self.apply_fallback();
            }
        };

        let recovered = !self.meter_healthy;
        self.meter_healthy = true;
        self.fallback_active = false;
        self.last_power_w = Some(power_w);

        if !self.settings.enabled {
            self.recovery_pending |= recovered;
            self.state = BalancerState::Disabled;
            return CycleOutcome::default();
        }

        let mut outcome = self.take_recovery(recovered);
        let cycle = self.recompute(power_w, ActionReason::PowerMeterUpdate, now);
        outcome.commands.extend(cycle.commands);
        outcome.events.extend(cycle.events);
        outcome
    }

    /// Apply a runtime parameter change and recompute immediately
    pub fn apply_parameter(&mut self, change: ParameterChange, now: f64) -> CycleOutcome {
        match change {
            ParameterChange::MaxCurrent {
                charger_id,
                current_a,
            } => self.set_max_current(&charger_id, current_a, now),
            ParameterChange::MinCurrent {
                charger_id,
                current_a,
            } => self.set_min_current(&charger_id, current_a, now),
            ParameterChange::Enabled(enabled) => self.set_enabled(enabled, now),
            ParameterChange::RampUpTime(seconds) => self.set_ramp_up_time(seconds, now),
            ParameterChange::Fallback(mode) => self.set_fallback(mode, now),
            ParameterChange::ServiceLimit(limit) => self.set_service_limit(limit, now),
        }
    }

    pub fn set_max_current(&mut self, charger_id: &str, current_a: f64, now: f64) -> CycleOutcome {
        if !Self::valid_current(current_a) {
            self.logger
                .warn(&format!("Ignoring invalid max current {} A", current_a));
            return CycleOutcome::default();
        }
        let Some(charger) = self.charger_mut(charger_id) else {
            return CycleOutcome::default();
        };
        charger.spec.max_a = current_a;
        self.recompute_from_last_reading(now)
    }

    pub fn set_min_current(&mut self, charger_id: &str, current_a: f64, now: f64) -> CycleOutcome {
        if !Self::valid_current(current_a) {
            self.logger
                .warn(&format!("Ignoring invalid min current {} A", current_a));
            return CycleOutcome::default();
        }
        let Some(charger) = self.charger_mut(charger_id) else {
            return CycleOutcome::default();
        };
        charger.spec.min_a = current_a;
        self.recompute_from_last_reading(now)
    }

    /// Toggle balancing. Disabling leaves the chargers at their committed
    /// current; enabling recomputes from the last valid reading.
    pub fn set_enabled(&mut self, enabled: bool, now: f64) -> CycleOutcome {
        self.settings.enabled = enabled;
        if !enabled {
            self.logger.info("Load balancing disabled");
            self.state = BalancerState::Disabled;
            return CycleOutcome::default();
        }
        self.logger.info("Load balancing enabled");
        self.state = self.derive_state(false, false);
        if !self.meter_healthy {
            return CycleOutcome::default();
        }
        let mut outcome = self.take_recovery(false);
        let cycle = self.recompute_from_last_reading(now);
        outcome.commands.extend(cycle.commands);
        outcome.events.extend(cycle.events);
        outcome
    }

    pub fn set_ramp_up_time(&mut self, seconds: f64, now: f64) -> CycleOutcome {
        if !seconds.is_finite() || seconds < 0.0 {
            self.logger
                .warn(&format!("Ignoring invalid ramp-up time {} s", seconds));
            return CycleOutcome::default();
        }
        self.settings.ramp_up_time_s = seconds;
        self.recompute_from_last_reading(now)
    }

    pub fn set_fallback(&mut self, mode: FallbackMode, now: f64) -> CycleOutcome {
        if let FallbackMode::SetCurrent(current) = mode
            && (!current.is_finite() || current < 0.0)
        {
            self.logger
                .warn(&format!("Ignoring invalid fallback current {} A", current));
            return CycleOutcome::default();
        }
        self.settings.fallback = mode;
        self.recompute_from_last_reading(now)
    }

    pub fn set_service_limit(&mut self, limit: ServiceLimit, now: f64) -> CycleOutcome {
        if !limit.voltage_v.is_finite()
            || limit.voltage_v <= 0.0
            || !limit.max_service_a.is_finite()
        {
            self.logger.warn(&format!(
                "Ignoring invalid service limit {} V / {} A",
                limit.voltage_v, limit.max_service_a
            ));
            return CycleOutcome::default();
        }
        self.limit = limit;
        self.recompute_from_last_reading(now)
    }

    /// One-shot operator override, bypassing headroom and ramp-up.
    ///
    /// `charger_id` of `None` applies the request to every charger. The
    /// requested current is clamped into each charger's band; below the
    /// minimum the charger is stopped. The next meter update resumes
    /// automatic control.
    pub fn manual_override(&mut self, charger_id: Option<&str>, current_a: f64) -> CycleOutcome {
        if !current_a.is_finite() {
            self.logger
                .warn(&format!("Ignoring invalid override current {}", current_a));
            return CycleOutcome::default();
        }
        if let Some(id) = charger_id
            && self.charger_index(id).is_none()
        {
            self.logger
                .warn(&format!("Manual override for unknown charger '{}'", id));
            return CycleOutcome::default();
        }

        let targets: Vec<f64> = self
            .chargers
            .iter()
            .map(|c| {
                if charger_id.is_some_and(|id| id != c.spec.id) {
                    c.runtime.current_a
                } else {
                    clamp_current(current_a, c.spec.max_a, c.spec.min_a, c.spec.step_a)
                        .unwrap_or(0.0)
                }
            })
            .collect();

        self.logger.info(&format!(
            "Manual override requested: {} A for {}",
            current_a,
            charger_id.unwrap_or("all chargers")
        ));
        let committed = self.commit(self.available_a, &targets, ActionReason::ManualOverride);
        self.state = self.derive_state(false, committed.changed);
        committed.outcome
    }

    // ------------------------------------------------------------------
    // Core computation
    // ------------------------------------------------------------------

    /// Report a meter recovery, including one seen while disabled
    fn take_recovery(&mut self, recovered: bool) -> CycleOutcome {
        let mut outcome = CycleOutcome::default();
        if recovered || std::mem::take(&mut self.recovery_pending) {
            self.logger.info("Power meter recovered, resuming balancing");
            outcome.events.push(self.event(BalancerEventKind::MeterRecovered));
        }
        outcome
    }

    /// Recompute after a setting change, reusing the last valid reading.
    ///
    /// With a single charger the reading predates the commit it caused, so
    /// the incremental model adds that reading's headroom on top of the
    /// current it already produced. The next meter update corrects it; until
    /// then the committed current can sit above the true headroom.
    fn recompute_from_last_reading(&mut self, now: f64) -> CycleOutcome {
        if !self.settings.enabled || !self.meter_healthy {
            return CycleOutcome::default();
        }
        match self.last_power_w {
            Some(power_w) => self.recompute(power_w, ActionReason::ParameterChange, now),
            None => CycleOutcome::default(),
        }
    }

    fn recompute(&mut self, house_power_w: f64, reason: ActionReason, now: f64) -> CycleOutcome {
        let (available_a, targets) = if self.chargers.len() == 1 {
            self.single_charger_targets(house_power_w)
        } else {
            self.multi_charger_targets(house_power_w)
        };

        let ramp_up_time_s = self.settings.ramp_up_time_s;
        let mut held = false;
        let finals: Vec<f64> = self
            .chargers
            .iter_mut()
            .zip(&targets)
            .map(|(charger, &target)| {
                let prev = charger.runtime.current_a;
                let final_a = apply_ramp_up_limit(
                    prev,
                    target,
                    charger.runtime.last_reduction_s,
                    now,
                    ramp_up_time_s,
                );
                if final_a < target {
                    held = true;
                }
                if final_a < prev {
                    charger.runtime.last_reduction_s = Some(now);
                }
                final_a
            })
            .collect();

        let rounded = (available_a * 100.0).round() / 100.0;
        let committed = self.commit(rounded, &finals, reason);
        self.state = self.derive_state(held, committed.changed);
        self.logger.debug(&format!(
            "Cycle complete: power={} W available={} A targets={:?} state={}",
            house_power_w, rounded, finals, self.state
        ));
        committed.outcome
    }

    fn single_charger_targets(&self, house_power_w: f64) -> (f64, Vec<f64>) {
        let available_a =
            available_current(house_power_w, self.limit.max_service_a, self.limit.voltage_v);
        let charger = &self.chargers[0];
        let raw_target = charger.runtime.current_a + available_a;
        let target = clamp_current(
            raw_target,
            charger.spec.max_a,
            charger.spec.min_a,
            charger.spec.step_a,
        )
        .unwrap_or(0.0);
        (available_a, vec![target])
    }

    fn multi_charger_targets(&self, house_power_w: f64) -> (f64, Vec<f64>) {
        let active_ev_a: f64 = self.chargers.iter().map(|c| c.runtime.current_a).sum();
        let available_a = available_current_for_ev(
            house_power_w,
            active_ev_a,
            self.limit.max_service_a,
            self.limit.voltage_v,
        );
        let bands: Vec<(f64, f64)> = self
            .chargers
            .iter()
            .map(|c| (c.spec.min_a, c.spec.max_a))
            .collect();
        // Chargers may differ in resolution; water-fill on the coarsest step
        // and let every result still land on each charger's own grid.
        let step_a = self
            .chargers
            .iter()
            .map(|c| c.spec.step_a)
            .fold(0.0_f64, f64::max);
        let targets = distribute_current(available_a, &bands, step_a)
            .into_iter()
            .zip(&self.chargers)
            .map(|(alloc, c)| {
                alloc
                    .and_then(|a| clamp_current(a, c.spec.max_a, c.spec.min_a, c.spec.step_a))
                    .unwrap_or(0.0)
            })
            .collect();
        (available_a, targets)
    }

    /// Derive the operational label from the current flags
    fn derive_state(&self, ramp_held: bool, changed: bool) -> BalancerState {
        if !self.settings.enabled {
            BalancerState::Disabled
        } else if self.fallback_active {
            BalancerState::MeterUnavailable
        } else if ramp_held {
            BalancerState::RampUpHold
        } else if !self.chargers.iter().any(|c| c.runtime.active) {
            BalancerState::Stopped
        } else if changed {
            BalancerState::Adjusting
        } else {
            BalancerState::Charging
        }
    }

    // ------------------------------------------------------------------
    // Helpers and accessors
    // ------------------------------------------------------------------

    fn valid_current(current_a: f64) -> bool {
        current_a.is_finite() && current_a > 0.0
    }

    fn charger_index(&self, charger_id: &str) -> Option<usize> {
        self.chargers.iter().position(|c| c.spec.id == charger_id)
    }

    fn charger_mut(&mut self, charger_id: &str) -> Option<&mut ManagedCharger> {
        let found = self.charger_index(charger_id);
        if found.is_none() {
            self.logger
                .warn(&format!("Parameter change for unknown charger '{}'", charger_id));
        }
        found.map(|i| &mut self.chargers[i])
    }

    fn event(&self, kind: BalancerEventKind) -> BalancerEvent {
        BalancerEvent {
            service_id: self.service_id.clone(),
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub const fn state(&self) -> BalancerState {
        self.state
    }

    pub const fn available_current(&self) -> f64 {
        self.available_a
    }

    pub const fn last_reason(&self) -> Option<ActionReason> {
        self.last_reason
    }

    pub const fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    pub const fn service_limit(&self) -> ServiceLimit {
        self.limit
    }

    pub const fn meter_healthy(&self) -> bool {
        self.meter_healthy
    }

    pub const fn fallback_active(&self) -> bool {
        self.fallback_active
    }

    /// Runtime state of one charger
    pub fn charger(&self, charger_id: &str) -> Option<&ChargerRuntimeState> {
        self.chargers
            .iter()
            .find(|c| c.spec.id == charger_id)
            .map(|c| &c.runtime)
    }

    /// Committed current of one charger, 0 when unknown
    pub fn current_of(&self, charger_id: &str) -> f64 {
        self.charger(charger_id).map_or(0.0, |c| c.current_a)
    }

    pub fn snapshot(&self) -> BalancerSnapshot {
        BalancerSnapshot {
            service_id: self.service_id.clone(),
            timestamp: Utc::now().to_rfc3339(),
            state: self.state,
            last_action_reason: self.last_reason,
            available_current_a: self.available_a,
            enabled: self.settings.enabled,
            meter_healthy: self.meter_healthy,
            fallback_active: self.fallback_active,
            configured_fallback: self.settings.fallback.name().to_string(),
            ramp_up_time_s: self.settings.ramp_up_time_s,
            chargers: self
                .chargers
                .iter()
                .map(|c| ChargerSnapshot {
                    id: c.spec.id.clone(),
                    current_a: c.runtime.current_a,
                    active: c.runtime.active,
                    min_current_a: c.spec.min_a,
                    max_current_a: c.spec.max_a,
                })
                .collect(),
        }
    }
}
