use ampshare::coordinator::{
    BalancingCoordinator, ChargerSpec, FallbackMode, RuntimeSettings, ServiceLimit,
};
use ampshare::meter::MeterReading;
use ampshare::persistence::{PersistenceManager, PersistentState};

fn coordinator(initial: Option<ampshare::coordinator::InitialState>) -> BalancingCoordinator {
    BalancingCoordinator::new(
        "main",
        ServiceLimit {
            voltage_v: 230.0,
            max_service_a: 32.0,
        },
        vec![ChargerSpec {
            id: "c1".to_string(),
            min_a: 6.0,
            max_a: 32.0,
            step_a: 1.0,
        }],
        RuntimeSettings {
            enabled: true,
            fallback: FallbackMode::Stop,
            ramp_up_time_s: 30.0,
        },
        initial,
    )
}

#[test]
fn default_state_is_empty() {
    let s = PersistentState::default();
    assert_eq!(s.enabled, None);
    assert!(s.chargers.is_empty());
    assert!(PersistenceManager::new("/nonexistent/state.json").initial_state().is_none());
}

#[test]
fn missing_file_keeps_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("state.json");
    let mut mgr = PersistenceManager::new(&path.to_string_lossy());
    mgr.load().unwrap();
    assert_eq!(mgr.state(), &PersistentState::default());
}

#[test]
fn snapshot_roundtrip_restores_coordinator() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("nested").join("state.json");
    let path = path.to_string_lossy().to_string();

    let mut running = coordinator(None);
    running.handle_meter(&MeterReading::power(5000.0), 0.0);

    let mut mgr = PersistenceManager::new(&path);
    assert!(mgr.update_from_snapshot(&running.snapshot()));
    assert!(!mgr.update_from_snapshot(&running.snapshot()));
    mgr.save().unwrap();

    let mut mgr2 = PersistenceManager::new(&path);
    mgr2.load().unwrap();
    assert_eq!(mgr2.state().enabled, Some(true));
    assert_eq!(mgr2.state().chargers.get("c1"), Some(&10.0));

    let restored = coordinator(mgr2.initial_state());
    assert_eq!(restored.current_of("c1"), 10.0);
    assert!(restored.charger("c1").is_some_and(|r| r.active));
}

#[test]
fn corrupt_file_is_an_error() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(tmp.path(), "{not json").unwrap();
    let mut mgr = PersistenceManager::new(&tmp.path().to_string_lossy());
    assert!(mgr.load().is_err());
}
