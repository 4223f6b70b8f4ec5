//! Error types and handling for Ampshare
//!
//! The balancing core itself has no fatal error path: every degraded input
//! maps to a committed current or a STOP. These errors cover the edges
//! around it (configuration, persistence, actuators and channels).

use thiserror::Error;

/// Result type alias for Ampshare operations
pub type Result<T> = std::result::Result<T, AmpshareError>;

/// Main error type for Ampshare
#[derive(Debug, Error)]
pub enum AmpshareError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// A charger actuator call failed
    #[error("Actuator error on {charger_id}: {message}")]
    Actuator { charger_id: String, message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// The coordinator event queue is gone
    #[error("Channel error: {message}")]
    Channel { message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl AmpshareError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new actuator error for one charger
    pub fn actuator<C: Into<String>, S: Into<String>>(charger_id: C, message: S) -> Self {
        Self::Actuator {
            charger_id: charger_id.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a new channel error
    pub fn channel<S: Into<String>>(message: S) -> Self {
        Self::Channel {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for AmpshareError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for AmpshareError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AmpshareError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = AmpshareError::config("test config error");
        assert!(matches!(err, AmpshareError::Config { .. }));

        let err = AmpshareError::actuator("charger_1", "refused");
        assert!(matches!(err, AmpshareError::Actuator { .. }));

        let err = AmpshareError::validation("field", "test validation error");
        assert!(matches!(err, AmpshareError::Validation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = AmpshareError::config("test error");
        assert_eq!(format!("{}", err), "Configuration error: test error");

        let err = AmpshareError::validation("test_field", "invalid value");
        assert_eq!(
            format!("{}", err),
            "Validation error: test_field - invalid value"
        );

        let err = AmpshareError::actuator("wallbox", "HTTP 500");
        assert_eq!(format!("{}", err), "Actuator error on wallbox: HTTP 500");
    }
}
