use super::commit::Transition;
use super::{ActionReason, BalancerEvent, BalancerEventKind, BalancingCoordinator};

impl BalancingCoordinator {
    /// Derive the discrete events for one commit.
    ///
    /// Fault events come first, then resolutions. `MeterUnavailable` is a
    /// service-level event and fires at most once per commit.
    pub(super) fn events_for(
        &self,
        transitions: &[Transition],
        reason: ActionReason,
    ) -> Vec<BalancerEvent> {
        let mut events = Vec::new();

        if reason == ActionReason::FallbackUnavailable {
            if transitions.iter().all(|t| t.current_a == 0.0) {
                self.logger
                    .warn("Power meter unavailable, charging stopped");
                events.push(self.event(BalancerEventKind::MeterUnavailable));
            }
            for t in transitions.iter().filter(|t| t.current_a > 0.0) {
                self.logger.warn(&format!(
                    "Power meter unavailable, {} held at fallback {} A",
                    t.charger_id, t.current_a
                ));
                events.push(self.event(BalancerEventKind::FallbackActivated {
                    charger_id: t.charger_id.clone(),
                    fallback_current_a: t.current_a,
                }));
            }
        }

        if reason == ActionReason::PowerMeterUpdate {
            for t in transitions.iter().filter(|t| t.prev_active && !t.active) {
                self.logger.warn(&format!(
                    "Overload stopped {} (was {} A, headroom {} A)",
                    t.charger_id, t.prev_current_a, self.available_a
                ));
                events.push(self.event(BalancerEventKind::OverloadStop {
                    charger_id: t.charger_id.clone(),
                    previous_current_a: t.prev_current_a,
                    available_current_a: self.available_a,
                }));
            }
        }

        for t in transitions.iter().filter(|t| !t.prev_active && t.active) {
            self.logger.info(&format!(
                "Charging resumed on {} at {} A",
                t.charger_id, t.current_a
            ));
            events.push(self.event(BalancerEventKind::ChargingResumed {
                charger_id: t.charger_id.clone(),
                current_a: t.current_a,
            }));
        }

        events
    }
}
