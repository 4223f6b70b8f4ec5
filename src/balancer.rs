//! Pure balancing arithmetic for Ampshare
//!
//! Everything in this module is side-effect free: headroom computation,
//! per-charger clamping, water-filling across several chargers and the
//! ramp-up cooldown. The coordinator strings these together per cycle.
//!
//! A charger target is expressed as `Option<f64>`, where `None` is the STOP
//! sentinel: charging must not continue at any current. This is distinct from
//! a deliberate `Some(0.0)`.

mod clamp;
mod distribute;
mod headroom;
mod ramp;

pub use clamp::clamp_current;
pub use distribute::distribute_current;
pub use headroom::{available_current, available_current_for_ev};
pub use ramp::apply_ramp_up_limit;

/// Nominal supply voltage in Volts
pub const VOLTAGE_DEFAULT: f64 = 230.0;

/// IEC 61851 minimum for AC charging, in Amps
pub const MIN_CURRENT_DEFAULT: f64 = 6.0;

/// Resolution of current adjustments, in Amps
pub const STEP_DEFAULT: f64 = 1.0;

/// Cooldown before increasing current after a reduction, in seconds
pub const RAMP_UP_TIME_DEFAULT: f64 = 30.0;

/// Floor `value` down to the nearest multiple of `step_a`.
///
/// Flooring goes toward negative infinity so a fractional or negative
/// headroom never rounds up past what is actually available. A non-positive
/// step leaves the value untouched.
pub fn floor_to_step(value: f64, step_a: f64) -> f64 {
    if step_a > 0.0 {
        (value / step_a).floor() * step_a
    } else {
        value
    }
}
