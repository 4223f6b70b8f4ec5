use ampshare::balancer::{available_current, clamp_current, distribute_current};
use ampshare::coordinator::{
    BalancerState, BalancingCoordinator, ChargerSpec, FallbackMode, RuntimeSettings, ServiceLimit,
};
use ampshare::meter::MeterReading;

fn coordinator(chargers: &[(&str, f64, f64)], fallback: FallbackMode) -> BalancingCoordinator {
    BalancingCoordinator::new(
        "main",
        ServiceLimit {
            voltage_v: 230.0,
            max_service_a: 32.0,
        },
        chargers
            .iter()
            .map(|&(id, min_a, max_a)| ChargerSpec {
                id: id.to_string(),
                min_a,
                max_a,
                step_a: 1.0,
            })
            .collect(),
        RuntimeSettings {
            enabled: true,
            fallback,
            ramp_up_time_s: 30.0,
        },
        None,
    )
}

#[test]
fn scenario_a_moderate_load() {
    let mut c = coordinator(&[("c1", 6.0, 32.0)], FallbackMode::Stop);
    c.handle_meter(&MeterReading::power(5000.0), 0.0);
    assert_eq!(c.current_of("c1"), 10.0);
    assert!(c.charger("c1").is_some_and(|r| r.active));
}

#[test]
fn scenario_b_heavy_load_stops() {
    let mut c = coordinator(&[("c1", 6.0, 32.0)], FallbackMode::Stop);
    c.handle_meter(&MeterReading::power(9000.0), 0.0);
    assert_eq!(c.current_of("c1"), 0.0);
    assert!(c.charger("c1").is_some_and(|r| !r.active));
    assert_eq!(c.state(), BalancerState::Stopped);
}

#[test]
fn scenario_c_ramp_up_cooldown() {
    let mut c = coordinator(&[("c1", 6.0, 18.0)], FallbackMode::Stop);
    c.handle_meter(&MeterReading::power(3000.0), 1000.0);
    assert_eq!(c.current_of("c1"), 18.0);

    c.handle_meter(&MeterReading::power(8000.0), 1001.0);
    assert_eq!(c.current_of("c1"), 15.0);

    c.handle_meter(&MeterReading::power(3001.0), 1010.0);
    assert_eq!(c.current_of("c1"), 15.0);
    assert_eq!(c.state(), BalancerState::RampUpHold);

    c.handle_meter(&MeterReading::power(3001.0), 1032.0);
    assert_eq!(c.current_of("c1"), 18.0);
}

#[test]
fn scenario_d_fair_share() {
    assert_eq!(
        distribute_current(24.0, &[(6.0, 16.0), (6.0, 16.0)], 1.0),
        vec![Some(12.0), Some(12.0)]
    );
    assert_eq!(
        distribute_current(28.0, &[(6.0, 10.0), (6.0, 32.0)], 1.0),
        vec![Some(10.0), Some(18.0)]
    );

    // Same split driven through the coordinator: 32 - 1840/230 = 24 A
    let mut c = coordinator(&[("a", 6.0, 16.0), ("b", 6.0, 16.0)], FallbackMode::Stop);
    c.handle_meter(&MeterReading::power(1840.0), 0.0);
    assert_eq!(c.current_of("a"), 12.0);
    assert_eq!(c.current_of("b"), 12.0);
}

#[test]
fn scenario_e_fallback_capped_at_max() {
    let mut c = coordinator(&[("c1", 6.0, 32.0)], FallbackMode::SetCurrent(50.0));
    c.handle_meter(&MeterReading::unavailable(), 0.0);
    assert_eq!(c.current_of("c1"), 32.0);
    assert_eq!(c.state(), BalancerState::MeterUnavailable);
}

#[test]
fn headroom_and_clamp_properties() {
    for &(power, max, volts) in &[(0.0, 32.0, 230.0), (9000.0, 32.0, 230.0), (-2000.0, 25.0, 240.0)] {
        let expected = max - power / volts;
        assert!((available_current(power, max, volts) - expected).abs() < 1e-9);
    }

    for available in [-5.0, 0.0, 5.9, 6.0, 10.7, 31.99, 50.0] {
        if let Some(out) = clamp_current(available, 32.0, 6.0, 1.0) {
            assert_eq!(clamp_current(out, 32.0, 6.0, 1.0), Some(out));
        }
    }
}

#[test]
fn distribution_never_exceeds_available() {
    let bands = [(6.0, 16.0), (8.0, 32.0), (6.0, 10.0), (10.0, 12.0)];
    for tenths in 0..500 {
        let available = f64::from(tenths) / 10.0;
        let result = distribute_current(available, &bands, 0.5);
        let total: f64 = result.iter().flatten().sum();
        assert!(total <= available + 1e-9);
        for (alloc, &(min_a, max_a)) in result.iter().zip(&bands) {
            if let Some(a) = alloc {
                assert!(*a >= min_a && *a <= max_a);
                assert!(((a / 0.5).round() * 0.5 - a).abs() < 1e-9);
            }
        }
    }
}
