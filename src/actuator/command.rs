use super::ChargerActuator;
use crate::config::ActuatorConfig;
use crate::error::{AmpshareError, Result};
use crate::logging::{StructuredLogger, get_logger};
use tokio::process::Command;

/// Actuator running one configured shell command per action.
///
/// The charger id and requested current are passed as the `CHARGER_ID` and
/// `CURRENT_A` environment variables. An action without a configured
/// command is skipped.
pub struct CommandActuator {
    set_current_command: Option<String>,
    start_command: Option<String>,
    stop_command: Option<String>,
    logger: StructuredLogger,
}

impl CommandActuator {
    pub fn from_config(config: &ActuatorConfig) -> Self {
        Self {
            set_current_command: config.set_current_command.clone(),
            start_command: config.start_command.clone(),
            stop_command: config.stop_command.clone(),
            logger: get_logger("actuator"),
        }
    }

    async fn run(
        &self,
        template: Option<&str>,
        action: &str,
        charger_id: &str,
        current_a: Option<f64>,
    ) -> Result<()> {
        let Some(script) = template.filter(|s| !s.trim().is_empty()) else {
            self.logger
                .debug(&format!("No {} command configured, skipping", action));
            return Ok(());
        };

        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(script)
            .env("CHARGER_ID", charger_id)
            .kill_on_drop(true);
        if let Some(current) = current_a {
            command.env("CURRENT_A", format!("{}", current));
        }

        let output = command
            .output()
            .await
            .map_err(|e| AmpshareError::actuator(charger_id, format!("{}: {}", action, e)))?;

        if output.status.success() {
            self.logger
                .debug(&format!("Action {} executed for {}", action, charger_id));
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(AmpshareError::actuator(
                charger_id,
                format!("{} exited with {}: {}", action, output.status, stderr.trim()),
            ))
        }
    }
}

#[async_trait::async_trait]
impl ChargerActuator for CommandActuator {
    async fn set_current(&self, charger_id: &str, current_a: f64) -> Result<()> {
        self.run(
            self.set_current_command.as_deref(),
            "set_current",
            charger_id,
            Some(current_a),
        )
        .await
    }

    async fn start(&self, charger_id: &str) -> Result<()> {
        self.run(
            self.start_command.as_deref(),
            "start_charging",
            charger_id,
            None,
        )
        .await
    }

    async fn stop(&self, charger_id: &str) -> Result<()> {
        self.run(self.stop_command.as_deref(), "stop_charging", charger_id, None)
            .await
    }
}
