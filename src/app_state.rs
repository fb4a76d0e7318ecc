// Application state shared by every HTTP handler

use std::fs;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::ledger::Ledger;

pub type SharedState = Arc<Mutex<AppState>>;

pub struct AppState {
    pub ledger: Ledger,
    pub config: Config,
}

impl AppState {
    /// Start from the persisted ledger if there is one
    pub fn new(config: Config) -> Self {
        let mut state = Self { ledger: Ledger::new(), config };

        if !state.config.persist {
            return state;
        }
        match state.load_from_disk() {
            Ok(true) => info!(
                path = %state.config.state_path.display(),
                slot = state.ledger.slot,
                "loaded persisted ledger"
            ),
            Ok(false) => info!(
                path = %state.config.state_path.display(),
                "no state file, starting with an empty ledger"
            ),
            Err(e) => {
                // Leave the unreadable file for the operator
                error!(
                    path = %state.config.state_path.display(),
                    "{}; persistence disabled for this run",
                    e
                );
                state.config.persist = false;
            }
        }
        state
    }

    pub fn shared(config: Config) -> SharedState {
        Arc::new(Mutex::new(Self::new(config)))
    }

    pub fn save_to_disk(&self) -> Result<(), String> {
        let path = &self.config.state_path;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
        }

        let json = serde_json::to_string_pretty(&self.ledger)
            .map_err(|e| format!("Failed to serialize ledger: {}", e))?;
        fs::write(path, json).map_err(|e| format!("Failed to write state file: {}", e))?;
        Ok(())
    }

    /// Ok(false) when there is no state file yet
    fn load_from_disk(&mut self) -> Result<bool, String> {
        let json = match fs::read_to_string(&self.config.state_path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(format!("Failed to read state file: {}", e)),
        };
        self.ledger =
            serde_json::from_str(&json).map_err(|e| format!("Failed to deserialize ledger: {}", e))?;
        Ok(true)
    }

    /// Save if persistence is on; failures are logged, not returned
    pub fn persist(&self) {
        if !self.config.persist {
            return;
        }
        if let Err(e) = self.save_to_disk() {
            warn!("{}", e);
        }
    }
}

/// Lock the shared state, recovering from a poisoned mutex. Ledger
/// operations are atomic, so a panicking holder can't leave it half-written.
pub fn lock(state: &SharedState) -> MutexGuard<'_, AppState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
