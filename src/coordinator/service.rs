//! Async event loop around the balancing coordinator
//!
//! The service is the single writer of coordinator state. Meter readings,
//! parameter changes and override requests arrive on one queue and each is
//! processed to completion before the next is received. Planned commands
//! are handed to a dispatcher task so a cycle never waits on charger I/O.

use super::{
    BalancerEvent, BalancerSnapshot, BalancingCoordinator, ChargerCommand, CoordinatorEvent,
    CycleOutcome, ParameterChange,
};
use crate::actuator::{ActionDispatcher, ChargerActuator};
use crate::error::{AmpshareError, Result};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::meter::MeterReading;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc, watch};

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Owns a [`BalancingCoordinator`] and drives it from an event queue
pub struct CoordinatorService {
    coordinator: BalancingCoordinator,
    events_rx: mpsc::UnboundedReceiver<CoordinatorEvent>,
    snapshot_tx: watch::Sender<BalancerSnapshot>,
    notify_tx: broadcast::Sender<BalancerEvent>,
    dispatcher: ActionDispatcher,
    origin: Instant,
    logger: StructuredLogger,
}

/// Cloneable entry point for feeding and observing a running service
#[derive(Clone)]
pub struct CoordinatorHandle {
    events_tx: mpsc::UnboundedSender<CoordinatorEvent>,
    snapshot_rx: watch::Receiver<BalancerSnapshot>,
    notify_tx: broadcast::Sender<BalancerEvent>,
}

impl CoordinatorService {
    pub fn new(
        coordinator: BalancingCoordinator,
        actuator: Arc<dyn ChargerActuator>,
        action_timeout: Duration,
    ) -> (Self, CoordinatorHandle) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(coordinator.snapshot());
        let (notify_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let service_id = coordinator.service_id().to_string();
        let service = Self {
            dispatcher: ActionDispatcher::new(&service_id, actuator, action_timeout),
            coordinator,
            events_rx,
            snapshot_tx,
            notify_tx: notify_tx.clone(),
            origin: Instant::now(),
            logger: get_logger_with_context(
                LogContext::new("service").with_service_id(&service_id),
            ),
        };
        let handle = CoordinatorHandle {
            events_tx,
            snapshot_rx,
            notify_tx,
        };
        (service, handle)
    }

    /// Run until a `Shutdown` event arrives or every handle is dropped.
    ///
    /// Commands already handed to the dispatcher are drained before this
    /// returns.
    pub async fn run(mut self) -> Result<()> {
        self.logger.info("Starting balancing coordinator");

        let (batch_tx, batch_rx) = mpsc::unbounded_channel::<Vec<ChargerCommand>>();
        let notify_tx = self.notify_tx.clone();
        let dispatcher = self.dispatcher;
        let worker = tokio::spawn(async move { dispatcher.run(batch_rx, notify_tx).await });

        while let Some(event) = self.events_rx.recv().await {
            if matches!(event, CoordinatorEvent::Shutdown) {
                self.logger.info("Shutdown requested");
                break;
            }
            let now = self.origin.elapsed().as_secs_f64();
            let outcome = Self::process(&mut self.coordinator, event, now);
            if !outcome.commands.is_empty() && batch_tx.send(outcome.commands).is_err() {
                self.logger.error("Action dispatcher is gone, commands dropped");
            }
            for event in outcome.events {
                // No subscribers is fine
                let _ = self.notify_tx.send(event);
            }
            self.snapshot_tx.send_replace(self.coordinator.snapshot());
        }

        drop(batch_tx);
        worker
            .await
            .map_err(|e| AmpshareError::generic(format!("Dispatcher task failed: {}", e)))?;
        self.logger.info("Balancing coordinator stopped");
        Ok(())
    }

    fn process(
        coordinator: &mut BalancingCoordinator,
        event: CoordinatorEvent,
        now: f64,
    ) -> CycleOutcome {
        match event {
            CoordinatorEvent::Meter(reading) => coordinator.handle_meter(&reading, now),
            CoordinatorEvent::Parameter(change) => coordinator.apply_parameter(change, now),
            CoordinatorEvent::ManualOverride {
                charger_id,
                current_a,
            } => coordinator.manual_override(charger_id.as_deref(), current_a),
            CoordinatorEvent::Shutdown => CycleOutcome::default(),
        }
    }
}

impl CoordinatorHandle {
    fn send(&self, event: CoordinatorEvent) -> Result<()> {
        self.events_tx
            .send(event)
            .map_err(|_| AmpshareError::channel("coordinator is not running"))
    }

    pub fn submit_reading(&self, reading: MeterReading) -> Result<()> {
        self.send(CoordinatorEvent::Meter(reading))
    }

    pub fn set_parameter(&self, change: ParameterChange) -> Result<()> {
        self.send(CoordinatorEvent::Parameter(change))
    }

    pub fn manual_override(&self, charger_id: Option<&str>, current_a: f64) -> Result<()> {
        self.send(CoordinatorEvent::ManualOverride {
            charger_id: charger_id.map(str::to_string),
            current_a,
        })
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(CoordinatorEvent::Shutdown)
    }

    /// Receive every event published after this call
    pub fn subscribe_events(&self) -> broadcast::Receiver<BalancerEvent> {
        self.notify_tx.subscribe()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> BalancerSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn watch_snapshot(&self) -> watch::Receiver<BalancerSnapshot> {
        self.snapshot_rx.clone()
    }
}
