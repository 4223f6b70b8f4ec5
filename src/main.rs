use ampshare::actuator::build_actuator;
use ampshare::coordinator::{
    BalancerEvent, BalancerSnapshot, BalancingCoordinator, CoordinatorHandle, CoordinatorService,
};
use ampshare::logging::init_logging;
use ampshare::meter::{MeterReading, MeterValue};
use ampshare::persistence::PersistenceManager;
use ampshare::Config;
use anyhow::Result;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, watch};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Optional explicit config path, otherwise the default search paths
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e))?,
        None => Config::load().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?,
    };
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    init_logging(&config.logging).map_err(|e| anyhow::anyhow!("Logging init failed: {}", e))?;

    info!(
        "Ampshare starting for service '{}' with {} charger(s)",
        config.service_id,
        config.chargers.len()
    );

    let mut persistence = PersistenceManager::new(&config.persistence_file);
    if let Err(e) = persistence.load() {
        warn!("Ignoring unreadable persistent state: {}", e);
    }

    let coordinator = BalancingCoordinator::from_config(&config, persistence.initial_state());
    let actuator = build_actuator(&config.actuator);
    let (service, handle) = CoordinatorService::new(
        coordinator,
        actuator,
        Duration::from_millis(config.actuator.command_timeout_ms),
    );

    let events_task = tokio::spawn(log_events(handle.subscribe_events()));
    let persist_task = tokio::spawn(persist_snapshots(handle.watch_snapshot(), persistence));
    let input_task = tokio::spawn(read_meter_states(handle));

    let result = service.run().await;

    input_task.abort();
    events_task.abort();
    // The snapshot watch closes with the service; let the last write land
    let _ = persist_task.await;

    match result {
        Ok(()) => {
            info!("Ampshare shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Coordinator failed with error: {}", e);
            Err(anyhow::anyhow!("Coordinator error: {}", e))
        }
    }
}

/// Feed meter states from stdin, one per line, until EOF
async fn read_meter_states(handle: CoordinatorHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().starts_with('#') {
                    continue;
                }
                let reading = MeterReading::new(MeterValue::parse(&line));
                if handle.submit_reading(reading).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read meter input: {}", e);
                break;
            }
        }
    }
    info!("Meter input closed");
    let _ = handle.shutdown();
}

async fn log_events(mut events: broadcast::Receiver<BalancerEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => info!("event {}", json),
                Err(e) => warn!("Unserialisable event: {}", e),
            },
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Event log lagged, {} events skipped", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn persist_snapshots(
    mut snapshots: watch::Receiver<BalancerSnapshot>,
    mut persistence: PersistenceManager,
) {
    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        if persistence.update_from_snapshot(&snapshot)
            && let Err(e) = persistence.save()
        {
            warn!("Failed to save persistent state: {}", e);
        }
    }
}
