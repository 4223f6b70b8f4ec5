use super::{ActionReason, BalancingCoordinator, CycleOutcome, FallbackMode};

impl BalancingCoordinator {
    /// Resolve the configured fallback while the meter is unavailable.
    ///
    /// `stop` commits 0 everywhere, `set_current` commits the fallback
    /// current capped at each charger's maximum, and `ignore` leaves every
    /// charger at its committed current without a commit. Fallback commits
    /// report zero headroom and do not start a ramp-up hold.
    pub(super) fn apply_fallback(&mut self) -> CycleOutcome {
        self.meter_healthy = false;

        let targets: Vec<f64> = match self.settings.fallback {
            FallbackMode::Ignore => {
                self.logger
                    .info("Power meter unavailable, keeping last charger currents");
                return CycleOutcome::default();
            }
            FallbackMode::Stop => vec![0.0; self.chargers.len()],
            FallbackMode::SetCurrent(fallback_a) => self
                .chargers
                .iter()
                .map(|c| fallback_a.min(c.spec.max_a))
                .collect(),
        };

        self.fallback_active = true;
        let committed = self.commit(0.0, &targets, ActionReason::FallbackUnavailable);
        self.state = self.derive_state(false, committed.changed);
        committed.outcome
    }
}
