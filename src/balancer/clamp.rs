use super::floor_to_step;

/// Clamp `available_a` into one charger's operating band.
///
/// The target is capped at `max_charger_a` and floored to `step_a`. Returns
/// `None` (STOP) when the result is below `min_charger_a`: a charger must not
/// trickle under its manufacturer minimum. Non-finite headroom also stops.
pub fn clamp_current(
    available_a: f64,
    max_charger_a: f64,
    min_charger_a: f64,
    step_a: f64,
) -> Option<f64> {
    if !available_a.is_finite() {
        return None;
    }
    let target = floor_to_step(available_a.min(max_charger_a), step_a);
    if target < min_charger_a {
        return None;
    }
    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_headroom_to_whole_amps() {
        assert_eq!(clamp_current(10.3, 32.0, 6.0, 1.0), Some(10.0));
    }

    #[test]
    fn caps_at_charger_maximum() {
        assert_eq!(clamp_current(40.0, 16.0, 6.0, 1.0), Some(16.0));
    }

    #[test]
    fn stops_below_minimum() {
        assert_eq!(clamp_current(5.9, 32.0, 6.0, 1.0), None);
        assert_eq!(clamp_current(-7.1, 32.0, 6.0, 1.0), None);
    }

    #[test]
    fn non_finite_headroom_stops() {
        assert_eq!(clamp_current(f64::NAN, 32.0, 6.0, 1.0), None);
        assert_eq!(clamp_current(f64::INFINITY, 32.0, 6.0, 1.0), None);
        assert_eq!(clamp_current(f64::NEG_INFINITY, 32.0, 6.0, 1.0), None);
    }

    #[test]
    fn exact_minimum_is_allowed() {
        assert_eq!(clamp_current(6.0, 32.0, 6.0, 1.0), Some(6.0));
    }

    #[test]
    fn coarse_step_never_rounds_up() {
        assert_eq!(clamp_current(13.9, 32.0, 6.0, 2.0), Some(12.0));
        assert_eq!(clamp_current(7.9, 32.0, 6.0, 2.0), Some(6.0));
    }

    #[test]
    fn degenerate_band_stops() {
        // Floored maximum (5 A) sits below the minimum (6 A).
        assert_eq!(clamp_current(30.0, 5.5, 6.0, 1.0), None);
    }

    #[test]
    fn clamping_is_idempotent() {
        let cases = [
            (10.3, 32.0, 6.0, 1.0),
            (40.0, 16.0, 6.0, 1.0),
            (13.9, 32.0, 6.0, 2.0),
            (6.75, 10.0, 6.0, 0.5),
        ];
        for (available, max, min, step) in cases {
            let once = clamp_current(available, max, min, step);
            let Some(value) = once else {
                panic!("expected a current for {available}");
            };
            assert_eq!(clamp_current(value, max, min, step), once);
        }
    }
}
