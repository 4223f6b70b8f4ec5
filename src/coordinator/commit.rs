use super::{ActionReason, BalancingCoordinator, ChargerAction, ChargerCommand, CycleOutcome};

/// Result of committing one set of targets
pub(super) struct Committed {
    pub outcome: CycleOutcome,
    /// Whether any charger's committed current changed
    pub changed: bool,
}

/// Per-charger transition captured during a commit
#[derive(Debug, Clone)]
pub(super) struct Transition {
    pub charger_id: String,
    pub prev_current_a: f64,
    pub prev_active: bool,
    pub current_a: f64,
    pub active: bool,
}

impl Transition {
    /// Commands needed to move a charger across this transition
    fn commands(&self) -> Vec<ChargerCommand> {
        let cmd = |action| ChargerCommand {
            charger_id: self.charger_id.clone(),
            action,
        };
        match (self.prev_active, self.active) {
            (false, true) => vec![
                cmd(ChargerAction::Start),
                cmd(ChargerAction::SetCurrent(self.current_a)),
            ],
            (true, false) => vec![cmd(ChargerAction::Stop)],
            (true, true) if self.current_a != self.prev_current_a => {
                vec![cmd(ChargerAction::SetCurrent(self.current_a))]
            }
            _ => Vec::new(),
        }
    }
}

impl BalancingCoordinator {
    /// Store new targets, plan the charger commands and fire events.
    ///
    /// `targets` is index-aligned with the managed chargers. Commands are
    /// planned in charger order and never roll back state on failure.
    pub(super) fn commit(
        &mut self,
        available_a: f64,
        targets: &[f64],
        reason: ActionReason,
    ) -> Committed {
        let transitions: Vec<Transition> = self
            .chargers
            .iter_mut()
            .zip(targets)
            .map(|(charger, &target)| {
                let current_a = target.max(0.0);
                let transition = Transition {
                    charger_id: charger.spec.id.clone(),
                    prev_current_a: charger.runtime.current_a,
                    prev_active: charger.runtime.active,
                    current_a,
                    active: current_a > 0.0,
                };
                charger.runtime.current_a = transition.current_a;
                charger.runtime.active = transition.active;
                transition
            })
            .collect();

        self.available_a = available_a;
        self.last_reason = Some(reason);

        let changed = transitions
            .iter()
            .any(|t| t.current_a != t.prev_current_a);
        let commands: Vec<ChargerCommand> =
            transitions.iter().flat_map(Transition::commands).collect();

        for command in &commands {
            self.logger.info(&format!(
                "Planned {} for {} ({})",
                command.action.name(),
                command.charger_id,
                reason.as_str()
            ));
        }

        let events = self.events_for(&transitions, reason);
        Committed {
            outcome: CycleOutcome { commands, events },
            changed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(prev: f64, now: f64) -> Transition {
        Transition {
            charger_id: "c1".to_string(),
            prev_current_a: prev,
            prev_active: prev > 0.0,
            current_a: now,
            active: now > 0.0,
        }
    }

    #[test]
    fn resume_plans_start_then_set() {
        let actions: Vec<_> = transition(0.0, 10.0)
            .commands()
            .into_iter()
            .map(|c| c.action)
            .collect();
        assert_eq!(
            actions,
            vec![ChargerAction::Start, ChargerAction::SetCurrent(10.0)]
        );
    }

    #[test]
    fn stop_and_adjust_plans() {
        let stop = transition(12.0, 0.0).commands();
        assert_eq!(stop.len(), 1);
        assert_eq!(stop[0].action, ChargerAction::Stop);

        let adjust = transition(12.0, 9.0).commands();
        assert_eq!(adjust[0].action, ChargerAction::SetCurrent(9.0));

        assert!(transition(12.0, 12.0).commands().is_empty());
        assert!(transition(0.0, 0.0).commands().is_empty());
    }
}
