#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        // Any sensor state must map to a typed value without panicking
        if let ampshare::meter::MeterValue::Power(w) = ampshare::meter::MeterValue::parse(raw) {
            assert!(w.is_finite());
        }
    }
});
