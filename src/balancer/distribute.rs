use super::floor_to_step;

/// Split `available_a` fairly across chargers by water-filling.
///
/// `chargers` holds one `(min_a, max_a)` pair per charger; the result is
/// aligned with it and `None` means STOP.
///
/// Each round computes an equal fair share of the remaining pool for the
/// chargers still in play:
///
/// 1. A charger whose floored share reaches its floored maximum is capped
///    there and its allocation leaves the pool (STOP instead when that
///    floored maximum is already below its minimum).
/// 2. A charger whose floored share is below its minimum is stopped and
///    draws nothing from the pool.
/// 3. When a round caps or stops nobody, everyone left gets the floored fair
///    share, demoted to STOP individually if it is still under their minimum.
///
/// All chargers capped or stopped in a round are resolved before the share
/// is recomputed, so the result does not depend on charger order.
///
/// A non-finite `available_a` stops every charger.
pub fn distribute_current(
    available_a: f64,
    chargers: &[(f64, f64)],
    step_a: f64,
) -> Vec<Option<f64>> {
    if chargers.is_empty() {
        return Vec::new();
    }
    if !available_a.is_finite() {
        return vec![None; chargers.len()];
    }

    let mut allocations: Vec<Option<f64>> = vec![None; chargers.len()];
    let mut active: Vec<usize> = (0..chargers.len()).collect();
    let mut remaining = available_a;

    while !active.is_empty() {
        let fair_share = remaining / active.len() as f64;
        let mut capped = Vec::new();
        let mut below_min = Vec::new();

        for &i in &active {
            let (min_a, max_a) = chargers[i];
            let max_floored = floor_to_step(max_a, step_a);
            let candidate = floor_to_step(fair_share.min(max_a), step_a);

            if candidate >= max_floored {
                capped.push(i);
            } else if candidate < min_a {
                below_min.push(i);
            }
        }

        if capped.is_empty() && below_min.is_empty() {
            let share = floor_to_step(fair_share, step_a);
            for &i in &active {
                let (min_a, _) = chargers[i];
                allocations[i] = (share >= min_a).then_some(share);
            }
            break;
        }

        for &i in &capped {
            let (min_a, max_a) = chargers[i];
            let max_floored = floor_to_step(max_a, step_a);
            if max_floored >= min_a {
                allocations[i] = Some(max_floored);
                remaining -= max_floored;
            } else {
                allocations[i] = None;
            }
        }
        // below_min chargers keep their None allocation
        active.retain(|i| !capped.contains(i) && !below_min.contains(i));
    }

    allocations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariants(available: f64, chargers: &[(f64, f64)], step: f64) {
        let result = distribute_current(available, chargers, step);
        assert_eq!(result.len(), chargers.len());
        let total: f64 = result.iter().flatten().sum();
        assert!(
            total <= available.max(0.0) + 1e-9,
            "allocated {total} from {available}"
        );
        for (alloc, &(min_a, max_a)) in result.iter().zip(chargers) {
            if let Some(a) = alloc {
                assert!(*a >= min_a && *a <= max_a, "{a} outside [{min_a}, {max_a}]");
                let steps = a / step;
                assert!((steps - steps.round()).abs() < 1e-9, "{a} not a multiple of {step}");
            }
        }
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(distribute_current(40.0, &[], 1.0).is_empty());
    }

    #[test]
    fn equal_chargers_split_evenly() {
        let result = distribute_current(24.0, &[(6.0, 16.0), (6.0, 16.0)], 1.0);
        assert_eq!(result, vec![Some(12.0), Some(12.0)]);
    }

    #[test]
    fn capped_charger_returns_surplus_to_pool() {
        let result = distribute_current(28.0, &[(6.0, 10.0), (6.0, 32.0)], 1.0);
        assert_eq!(result, vec![Some(10.0), Some(18.0)]);
    }

    #[test]
    fn all_capped_when_pool_is_large() {
        let result = distribute_current(100.0, &[(6.0, 16.0), (6.0, 32.0)], 1.0);
        assert_eq!(result, vec![Some(16.0), Some(32.0)]);
    }

    #[test]
    fn insufficient_pool_stops_everyone() {
        let result = distribute_current(10.0, &[(6.0, 16.0), (6.0, 16.0)], 1.0);
        assert_eq!(result, vec![None, None]);
    }

    #[test]
    fn negative_pool_stops_everyone() {
        let result = distribute_current(-4.0, &[(6.0, 16.0), (6.0, 16.0), (6.0, 32.0)], 1.0);
        assert_eq!(result, vec![None, None, None]);
    }

    #[test]
    fn non_finite_pool_stops_everyone() {
        let fleet = [(6.0, 16.0), (6.0, 32.0)];
        for available in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(distribute_current(available, &fleet, 1.0), vec![None, None]);
        }
    }

    #[test]
    fn higher_minimum_charger_drops_out_first() {
        // Share of 7 A: the 8 A-minimum charger stops, the other takes 14 A.
        let result = distribute_current(14.0, &[(6.0, 32.0), (8.0, 32.0)], 1.0);
        assert_eq!(result, vec![Some(14.0), None]);
    }

    #[test]
    fn degenerate_charger_is_stopped() {
        let result = distribute_current(40.0, &[(6.0, 5.0), (6.0, 16.0)], 1.0);
        assert_eq!(result, vec![None, Some(16.0)]);
    }

    #[test]
    fn order_does_not_matter() {
        let a = distribute_current(30.0, &[(6.0, 10.0), (6.0, 32.0), (6.0, 32.0)], 1.0);
        let b = distribute_current(30.0, &[(6.0, 32.0), (6.0, 32.0), (6.0, 10.0)], 1.0);
        assert_eq!(a, vec![Some(10.0), Some(10.0), Some(10.0)]);
        assert_eq!(b, vec![Some(10.0), Some(10.0), Some(10.0)]);
    }

    #[test]
    fn fractional_share_is_floored() {
        let result = distribute_current(25.0, &[(6.0, 32.0), (6.0, 32.0)], 1.0);
        assert_eq!(result, vec![Some(12.0), Some(12.0)]);
    }

    #[test]
    fn invariants_hold_across_mixed_inputs() {
        let fleets: [&[(f64, f64)]; 4] = [
            &[(6.0, 16.0), (6.0, 32.0), (10.0, 20.0)],
            &[(6.0, 6.0), (6.0, 7.5), (6.0, 40.0), (8.0, 12.0)],
            &[(1.0, 2.0)],
            &[(6.0, 32.0); 5],
        ];
        for chargers in fleets {
            for available in [-10.0, 0.0, 5.5, 13.0, 27.7, 48.0, 95.0, 400.0] {
                for step in [0.5, 1.0, 2.0] {
                    assert_invariants(available, chargers, step);
                }
            }
        }
    }
}
