//! # Ampshare - dynamic EV charger load balancing
//!
//! Ampshare keeps one or more EV chargers on a shared electrical service
//! below the service's current rating. Every household power reading is
//! turned into a new charging current per charger, with hysteresis against
//! oscillation and a configurable policy for when the meter goes dark.
//!
//! ## Architecture
//!
//! - `balancer`: pure headroom, clamp, fair-share and ramp-up functions
//! - `meter`: meter reading values and parsing of raw sensor states
//! - `coordinator`: the stateful balancing engine and its async event loop
//! - `actuator`: charger command sinks and the ordered dispatcher
//! - `config`: YAML configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `persistence`: restart state (committed currents, enabled flag)
//! - `error`: error type and result alias

pub mod actuator;
pub mod balancer;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod meter;
pub mod persistence;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::{BalancingCoordinator, CoordinatorHandle, CoordinatorService};
pub use error::{AmpshareError, Result};
