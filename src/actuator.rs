//! Charger actuators
//!
//! The coordinator never talks to hardware. It plans abstract
//! [`ChargerCommand`]s which an [`ActionDispatcher`] executes, in order,
//! against a [`ChargerActuator`] implementation.

use crate::config::{ActuatorConfig, ActuatorKind};
use crate::coordinator::{ChargerAction, ChargerCommand};
use crate::error::Result;
use crate::logging::{StructuredLogger, get_logger};
use std::sync::Arc;

mod command;
mod dispatch;

pub use command::CommandActuator;
pub use dispatch::ActionDispatcher;

/// Sink for charger commands.
///
/// Every call is fallible; the dispatcher reports failures and moves on.
#[async_trait::async_trait]
pub trait ChargerActuator: Send + Sync {
    async fn set_current(&self, charger_id: &str, current_a: f64) -> Result<()>;

    async fn start(&self, charger_id: &str) -> Result<()>;

    async fn stop(&self, charger_id: &str) -> Result<()>;

    /// Route an abstract command to the matching call
    async fn apply(&self, command: &ChargerCommand) -> Result<()> {
        match command.action {
            ChargerAction::Start => self.start(&command.charger_id).await,
            ChargerAction::Stop => self.stop(&command.charger_id).await,
            ChargerAction::SetCurrent(current_a) => {
                self.set_current(&command.charger_id, current_a).await
            }
        }
    }
}

/// Dry-run actuator that only logs what it would do
pub struct LoggingActuator {
    logger: StructuredLogger,
}

impl LoggingActuator {
    pub fn new() -> Self {
        Self {
            logger: get_logger("actuator"),
        }
    }
}

impl Default for LoggingActuator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ChargerActuator for LoggingActuator {
    async fn set_current(&self, charger_id: &str, current_a: f64) -> Result<()> {
        self.logger
            .info(&format!("[dry-run] {} set_current {} A", charger_id, current_a));
        Ok(())
    }

    async fn start(&self, charger_id: &str) -> Result<()> {
        self.logger
            .info(&format!("[dry-run] {} start_charging", charger_id));
        Ok(())
    }

    async fn stop(&self, charger_id: &str) -> Result<()> {
        self.logger
            .info(&format!("[dry-run] {} stop_charging", charger_id));
        Ok(())
    }
}

/// Build the actuator selected in the configuration
pub fn build_actuator(config: &ActuatorConfig) -> Arc<dyn ChargerActuator> {
    match config.kind {
        ActuatorKind::Log => Arc::new(LoggingActuator::new()),
        ActuatorKind::Command => Arc::new(CommandActuator::from_config(config)),
    }
}
