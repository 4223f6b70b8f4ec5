//! Persistence of restart state
//!
//! Stores the last committed current per charger and the enabled flag so a
//! restarted coordinator can be seeded before its first recompute.

use crate::coordinator::{BalancerSnapshot, InitialState};
use crate::error::Result;
use crate::logging::get_logger;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Persistent state structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistentState {
    /// Whether balancing was enabled
    pub enabled: Option<bool>,

    /// Last committed current per charger id
    #[serde(default)]
    pub chargers: HashMap<String, f64>,
}

impl PersistentState {
    /// Capture the restorable parts of a snapshot
    pub fn from_snapshot(snapshot: &BalancerSnapshot) -> Self {
        Self {
            enabled: Some(snapshot.enabled),
            chargers: snapshot
                .chargers
                .iter()
                .map(|c| (c.id.clone(), c.current_a))
                .collect(),
        }
    }

    pub fn to_initial_state(&self) -> InitialState {
        InitialState {
            enabled: self.enabled,
            currents: self.chargers.clone(),
        }
    }
}

/// Persistence manager
pub struct PersistenceManager {
    file_path: String,
    state: PersistentState,
    logger: crate::logging::StructuredLogger,
}

impl PersistenceManager {
    pub fn new(file_path: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
            state: PersistentState::default(),
            logger: get_logger("persistence"),
        }
    }

    /// Load state from disk; a missing file leaves the defaults in place
    pub fn load(&mut self) -> Result<()> {
        let path = Path::new(&self.file_path);

        if !path.exists() {
            self.logger
                .info("No persistent state file found, using defaults");
            return Ok(());
        }

        let contents = std::fs::read_to_string(path)?;
        self.state = serde_json::from_str(&contents)?;
        self.logger.info("Loaded persistent state from disk");

        Ok(())
    }

    /// Save state to disk
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = Path::new(&self.file_path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.state)?;
        std::fs::write(&self.file_path, contents)?;
        self.logger.debug("Saved persistent state to disk");

        Ok(())
    }

    pub const fn state(&self) -> &PersistentState {
        &self.state
    }

    /// Replace the stored state from a snapshot.
    ///
    /// Returns whether anything restorable changed, so callers can skip
    /// redundant writes.
    pub fn update_from_snapshot(&mut self, snapshot: &BalancerSnapshot) -> bool {
        let next = PersistentState::from_snapshot(snapshot);
        if next == self.state {
            return false;
        }
        self.state = next;
        true
    }

    /// State to seed the coordinator with, if anything was stored
    pub fn initial_state(&self) -> Option<InitialState> {
        if self.state.enabled.is_none() && self.state.chargers.is_empty() {
            None
        } else {
            Some(self.state.to_initial_state())
        }
    }
}
