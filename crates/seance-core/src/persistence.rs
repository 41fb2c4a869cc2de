use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::phase::CurseMeter;
use crate::state::SessionState;
use crate::state::Theme;

/// Fixed storage key: one snapshot file per store directory.
pub const SNAPSHOT_FILE: &str = "session.json";

const SNAPSHOT_SCHEMA_V1: u8 = 1;

/// Wire form of the session, kept separate from the domain state so the
/// snapshot format can evolve without touching the engine types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub version: u8,
    pub curse: u8,
    pub session_count: u32,
    pub last_command: String,
    pub history: Vec<String>,
    pub command_counts: BTreeMap<String, u32>,
    pub user_name: String,
    pub awaiting_name: bool,
    pub notes: BTreeMap<String, serde_json::Value>,
    pub theme: String,
    pub autonomous_mode: bool,
    pub saved_at_ms: i64,
}

impl PersistedSession {
    pub fn capture(state: &SessionState) -> Self {
        Self {
            version: SNAPSHOT_SCHEMA_V1,
            curse: state.curse.value(),
            session_count: state.session_count,
            last_command: state.last_command.clone(),
            history: state.history.iter().map(str::to_string).collect(),
            command_counts: state.command_counts.clone(),
            user_name: state.user_name.clone(),
            awaiting_name: state.memory.awaiting_name,
            notes: state.memory.notes.clone(),
            theme: state.theme.label().to_string(),
            autonomous_mode: state.autonomous_mode,
            saved_at_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Rebuild a session from the wire form. Unknown theme names fall back
    /// to the default; the phase is recomputed from the restored curse. A
    /// session that was autonomous comes back locked.
    pub fn restore(self) -> SessionState {
        let mut state = SessionState::new();
        state.curse = CurseMeter::new(self.curse);
        state.session_count = self.session_count;
        state.last_command = self.last_command;
        for entry in self.history {
            state.history.push(entry);
        }
        state.command_counts = self.command_counts;
        state.user_name = self.user_name;
        state.memory.awaiting_name = self.awaiting_name;
        state.memory.notes = self.notes;
        state.theme = Theme::parse(&self.theme).unwrap_or(Theme::Green);
        state.autonomous_mode = self.autonomous_mode;
        state.terminal_locked = self.autonomous_mode;
        state.sync_phase();
        state
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn open(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(SNAPSHOT_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing, unreadable, malformed, or wrong-version snapshots all fall
    /// back to a fresh session; a broken store is never surfaced.
    pub fn load(&self) -> SessionState {
        let Ok(bytes) = std::fs::read(&self.path) else {
            return SessionState::new();
        };
        match serde_json::from_slice::<PersistedSession>(&bytes) {
            Ok(record) if record.version == SNAPSHOT_SCHEMA_V1 => record.restore(),
            _ => SessionState::new(),
        }
    }

    /// Best-effort write. Returns whether the snapshot landed; callers may
    /// log the outcome but must not treat failure as fatal.
    pub fn save(&self, state: &SessionState) -> bool {
        let record = PersistedSession::capture(state);
        let Ok(encoded) = serde_json::to_vec_pretty(&record) else {
            return false;
        };
        std::fs::write(&self.path, encoded).is_ok()
    }
}
