//! Resumable session state persisted in the run directory.

use std::fs;
use std::path::Path;

use ccp4_core::errors::Ccp4Error;
use ccp4_core::{from_json_slice, to_canonical_json_bytes};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

/// File holding [`SessionState`] inside the run directory.
pub const STATE_FILE: &str = "session.json";

/// Where an interactive session stands between host invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    Converting,
    AwaitingToolExit,
    Importing,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: Phase,
    /// Cleared once the session finishes.
    pub interactive: bool,
    /// Completed launches of the external tool.
    pub tool_runs: u32,
    /// RFC 3339 time of the last transition.
    pub updated_at: String,
}

impl SessionState {
    pub fn new(interactive: bool) -> Self {
        Self {
            phase: Phase::NotStarted,
            interactive,
            tool_runs: 0,
            updated_at: Utc::now().to_rfc3339(),
        }
    }

    /// Loads the state at `path`, or a fresh one if the file does not exist.
    pub fn load_or_new(path: &Path, interactive: bool) -> Result<Self, Ccp4Error> {
        if !path.exists() {
            return Ok(Self::new(interactive));
        }
        let bytes = fs::read(path).map_err(|err| Ccp4Error::io("ccp4_session.read_state", path, err))?;
        from_json_slice(&bytes)
    }

    pub fn save(&self, path: &Path) -> Result<(), Ccp4Error> {
        let bytes = to_canonical_json_bytes(self)?;
        fs::write(path, bytes).map_err(|err| Ccp4Error::io("ccp4_session.write_state", path, err))
    }

    /// Moves to `phase`, stamps the time and persists.
    pub fn transition(&mut self, phase: Phase, path: &Path) -> Result<(), Ccp4Error> {
        info!(from = ?self.phase, to = ?phase, "session transition");
        self.phase = phase;
        self.updated_at = Utc::now().to_rfc3339();
        self.save(path)
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }
}
