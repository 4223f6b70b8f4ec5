/// Headroom in Amps left on the service above the current total draw.
///
/// `house_power_w` is the total metered household power, including any EV
/// charging already in progress. A negative result means the service limit
/// is already exceeded and charging must come down immediately.
///
/// Callers guarantee `voltage_v > 0` (enforced by configuration validation).
pub fn available_current(house_power_w: f64, max_service_a: f64, voltage_v: f64) -> f64 {
    max_service_a - house_power_w / voltage_v
}

/// Current available for all managed chargers together.
///
/// The meter reads the whole house, EV charging included, so the draw of the
/// chargers we already commanded (`active_ev_a`, the sum of their currents)
/// is removed first to estimate the non-EV load. Headroom is then re-derived
/// against the service limit.
pub fn available_current_for_ev(
    house_power_w: f64,
    active_ev_a: f64,
    max_service_a: f64,
    voltage_v: f64,
) -> f64 {
    let non_ev_power_w = house_power_w - active_ev_a * voltage_v;
    max_service_a - non_ev_power_w / voltage_v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headroom_matches_formula() {
        let a = available_current(5000.0, 32.0, 230.0);
        assert!((a - (32.0 - 5000.0 / 230.0)).abs() < 1e-9);
        assert!((a - 10.26).abs() < 0.01);
    }

    #[test]
    fn headroom_goes_negative_when_over_limit() {
        let a = available_current(9000.0, 32.0, 230.0);
        assert!(a < 0.0);
        assert!((a + 7.13).abs() < 0.01);
    }

    #[test]
    fn zero_load_gives_full_service() {
        assert_eq!(available_current(0.0, 40.0, 230.0), 40.0);
    }

    #[test]
    fn ev_variant_adds_back_own_draw() {
        // 7360 W total with 8 A of EV charging at 230 V is 5520 W of house load.
        let a = available_current_for_ev(7360.0, 8.0, 32.0, 230.0);
        assert!((a - 8.0).abs() < 1e-9);
    }

    #[test]
    fn ev_variant_without_ev_draw_equals_plain_headroom() {
        let plain = available_current(4600.0, 25.0, 230.0);
        let ev = available_current_for_ev(4600.0, 0.0, 25.0, 230.0);
        assert!((plain - ev).abs() < 1e-12);
    }
}
