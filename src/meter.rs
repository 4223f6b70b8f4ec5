//! Power meter readings
//!
//! The meter source reports either a numeric total household power in Watts
//! or one of the host's degraded states. Raw string states are parsed here so
//! the coordinator only ever sees a typed value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One state reported by the power meter source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MeterValue {
    /// Total household power draw in Watts, EV charging included
    Power(f64),
    /// The meter entity exists but is not reporting
    Unavailable,
    /// The meter has not reported a value yet
    Unknown,
    /// Reported as available, but not a usable number
    Invalid(String),
}

impl MeterValue {
    /// Parse a raw sensor state as reported by a home-automation host
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "unavailable" => return Self::Unavailable,
            "unknown" | "" => return Self::Unknown,
            _ => {}
        }
        match trimmed.parse::<f64>() {
            Ok(w) if w.is_finite() => Self::Power(w),
            _ => Self::Invalid(trimmed.to_string()),
        }
    }

    /// Whether the reading puts the meter into its degraded state
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable | Self::Unknown)
    }
}

/// A meter state together with the time it was observed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    pub value: MeterValue,
    pub timestamp: DateTime<Utc>,
}

impl MeterReading {
    pub fn new(value: MeterValue) -> Self {
        Self {
            value,
            timestamp: Utc::now(),
        }
    }

    pub fn power(watts: f64) -> Self {
        Self::new(MeterValue::Power(watts))
    }

    pub fn unavailable() -> Self {
        Self::new(MeterValue::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_power() {
        assert_eq!(MeterValue::parse("5000"), MeterValue::Power(5000.0));
        assert_eq!(MeterValue::parse(" -120.5 "), MeterValue::Power(-120.5));
    }

    #[test]
    fn parses_degraded_states() {
        assert_eq!(MeterValue::parse("unavailable"), MeterValue::Unavailable);
        assert_eq!(MeterValue::parse("UNKNOWN"), MeterValue::Unknown);
        assert_eq!(MeterValue::parse(""), MeterValue::Unknown);
        assert!(MeterValue::parse("unavailable").is_unavailable());
        assert!(!MeterValue::parse("12").is_unavailable());
    }

    #[test]
    fn garbage_is_invalid_not_unavailable() {
        assert_eq!(
            MeterValue::parse("not_a_number"),
            MeterValue::Invalid("not_a_number".to_string())
        );
        assert!(matches!(MeterValue::parse("NaN"), MeterValue::Invalid(_)));
        assert!(!MeterValue::parse("abc").is_unavailable());
    }
}
