use super::ChargerActuator;
use crate::coordinator::{BalancerEvent, BalancerEventKind, ChargerCommand};
use crate::error::AmpshareError;
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Executes planned command batches in order against an actuator.
///
/// Each call is bounded by `timeout`. A failure is logged and reported as an
/// `ActionFailed` event; the remaining commands of the batch still run.
pub struct ActionDispatcher {
    service_id: String,
    actuator: Arc<dyn ChargerActuator>,
    timeout: Duration,
    logger: StructuredLogger,
}

impl ActionDispatcher {
    pub fn new(service_id: &str, actuator: Arc<dyn ChargerActuator>, timeout: Duration) -> Self {
        Self {
            service_id: service_id.to_string(),
            actuator,
            timeout,
            logger: get_logger_with_context(
                LogContext::new("dispatcher").with_service_id(service_id),
            ),
        }
    }

    /// Run one batch and return the failure events it produced
    pub async fn execute(&self, batch: &[ChargerCommand]) -> Vec<BalancerEvent> {
        let mut failures = Vec::new();
        for command in batch {
            let action = command.action.name();
            let result = match tokio::time::timeout(self.timeout, self.actuator.apply(command)).await
            {
                Ok(result) => result,
                Err(_) => Err(AmpshareError::timeout(format!(
                    "{} on {} exceeded {} ms",
                    action,
                    command.charger_id,
                    self.timeout.as_millis()
                ))),
            };

            match result {
                Ok(()) => self.logger.debug(&format!(
                    "Action {} executed for {}",
                    action, command.charger_id
                )),
                Err(e) => {
                    self.logger
                        .for_charger(&command.charger_id)
                        .warn(&format!("Action {} failed: {}", action, e));
                    failures.push(BalancerEvent {
                        service_id: self.service_id.clone(),
                        timestamp: Utc::now(),
                        kind: BalancerEventKind::ActionFailed {
                            charger_id: command.charger_id.clone(),
                            action: action.to_string(),
                            error: e.to_string(),
                        },
                    });
                }
            }
        }
        failures
    }

    /// Worker loop: drain batches until the sending side is dropped
    pub async fn run(
        self,
        mut batches: mpsc::UnboundedReceiver<Vec<ChargerCommand>>,
        events: broadcast::Sender<BalancerEvent>,
    ) {
        self.logger.debug("Action dispatcher started");
        while let Some(batch) = batches.recv().await {
            for event in self.execute(&batch).await {
                // No subscribers is fine
                let _ = events.send(event);
            }
        }
        self.logger.debug("Action dispatcher stopped");
    }
}
