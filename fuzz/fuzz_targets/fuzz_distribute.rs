#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte: available current, then (min, max) byte pairs per charger
    let Some((&first, rest)) = data.split_first() else {
        return;
    };
    let available = f64::from(first) / 2.0 - 16.0;
    let chargers: Vec<(f64, f64)> = rest
        .chunks_exact(2)
        .take(8)
        .map(|b| {
            let min = f64::from(b[0] % 32) + 1.0;
            (min, min + f64::from(b[1] % 48))
        })
        .collect();

    let result = ampshare::balancer::distribute_current(available, &chargers, 1.0);
    assert_eq!(result.len(), chargers.len());

    let total: f64 = result.iter().flatten().sum();
    assert!(total <= available.max(0.0) + 1e-9);
    for (alloc, &(min, max)) in result.iter().zip(&chargers) {
        if let Some(a) = alloc {
            assert!(*a >= min && *a <= max);
            assert_eq!(a.fract(), 0.0);
        }
    }
});
