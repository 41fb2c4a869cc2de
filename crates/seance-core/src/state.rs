use std::collections::BTreeMap;
use std::collections::VecDeque;

use crate::phase::CurseMeter;
use crate::phase::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Green,
    Red,
    Blue,
    Amber,
}

impl Theme {
    pub fn label(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Amber => "amber",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "green" => Some(Self::Green),
            "red" => Some(Self::Red),
            "blue" => Some(Self::Blue),
            "amber" => Some(Self::Amber),
            _ => None,
        }
    }

    pub fn all() -> &'static [Theme] {
        &[Self::Green, Self::Red, Self::Blue, Self::Amber]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Echo of what the user typed.
    Command,
    /// Ordinary engine output.
    System,
    /// Output the presentation layer should render as corrupted.
    Corrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub text: String,
    pub kind: LineKind,
}

impl OutputLine {
    pub fn command(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: LineKind::Command,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: LineKind::System,
        }
    }

    pub fn corrupted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: LineKind::Corrupted,
        }
    }
}

/// Bounded FIFO of raw submitted commands. Oldest entries are evicted first
/// once the cap is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryBuffer {
    cap: usize,
    buf: VecDeque<String>,
}

impl HistoryBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            buf: VecDeque::with_capacity(cap),
        }
    }

    pub fn push(&mut self, entry: impl Into<String>) {
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(entry.into());
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.buf.iter().map(String::as_str)
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEventKind {
    Dispatch,
    PhaseShift,
    Locked,
    Unlocked,
    AutonomousEntered,
    Escape,
    Reset,
    SnapshotSaved,
    SnapshotFailed,
}

impl SessionEventKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Dispatch => "dispatch",
            Self::PhaseShift => "phase-shift",
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
            Self::AutonomousEntered => "autonomous",
            Self::Escape => "escape",
            Self::Reset => "reset",
            Self::SnapshotSaved => "snapshot-saved",
            Self::SnapshotFailed => "snapshot-failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub seq: u64,
    pub kind: SessionEventKind,
    pub detail: String,
}

/// Bounded structured diagnostics, appended by the reducer. The frontend may
/// surface it; nothing in the engine reads it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog {
    cap: usize,
    next_seq: u64,
    buf: VecDeque<SessionEvent>,
}

impl EventLog {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            next_seq: 1,
            buf: VecDeque::with_capacity(cap),
        }
    }

    pub fn record(&mut self, kind: SessionEventKind, detail: impl Into<String>) {
        let entry = SessionEvent {
            seq: self.next_seq,
            kind,
            detail: detail.into(),
        };
        self.next_seq += 1;
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionEvent> {
        self.buf.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserMemory {
    /// Set when the next unmatched input should be captured as the user's
    /// name instead of routed to unknown-command flavor text.
    pub awaiting_name: bool,
    pub notes: BTreeMap<String, serde_json::Value>,
}

pub const HISTORY_CAP: usize = 50;
const EVENT_LOG_CAP: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub curse: CurseMeter,
    /// Always recomputed from `curse`; only deserialization sets it
    /// transiently before the first recompute.
    pub phase: Phase,
    pub session_count: u32,
    pub last_command: String,
    pub history: HistoryBuffer,
    pub command_counts: BTreeMap<String, u32>,
    pub terminal_locked: bool,
    pub user_name: String,
    pub memory: UserMemory,
    pub theme: Theme,
    pub autonomous_mode: bool,
    /// Lines emitted by the current autonomous run; not persisted.
    pub autonomous_ticks: u32,
    pub event_log: EventLog,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            curse: CurseMeter::zero(),
            phase: Phase::Normal,
            session_count: 0,
            last_command: String::new(),
            history: HistoryBuffer::new(HISTORY_CAP),
            command_counts: BTreeMap::new(),
            terminal_locked: false,
            user_name: String::new(),
            memory: UserMemory::default(),
            theme: Theme::Green,
            autonomous_mode: false,
            autonomous_ticks: 0,
            event_log: EventLog::new(EVENT_LOG_CAP),
        }
    }

    pub fn sync_phase(&mut self) {
        self.phase = Phase::for_curse(self.curse);
    }

    /// Distinct command keys seen this session, for the status line.
    pub fn distinct_commands(&self) -> usize {
        self.command_counts.len()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn history_evicts_oldest_first() {
        let mut history = HistoryBuffer::new(3);
        for entry in ["a", "b", "c", "d"] {
            history.push(entry);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec!["b", "c", "d"]);
    }

    #[test]
    fn event_log_sequences_and_bounds() {
        let mut log = EventLog::new(2);
        log.record(SessionEventKind::Dispatch, "one");
        log.record(SessionEventKind::Dispatch, "two");
        log.record(SessionEventKind::Reset, "three");
        let entries: Vec<_> = log.iter().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].seq, 2);
        assert_eq!(entries[1].seq, 3);
        assert_eq!(entries[1].kind, SessionEventKind::Reset);
    }

    #[test]
    fn theme_parse_round_trips_labels() {
        for theme in Theme::all() {
            assert_eq!(Theme::parse(theme.label()), Some(*theme));
        }
        assert_eq!(Theme::parse("mauve"), None);
    }

    #[test]
    fn fresh_state_is_phase_one() {
        let state = SessionState::new();
        assert_eq!(state.phase, Phase::Normal);
        assert_eq!(state.curse.value(), 0);
        assert!(!state.terminal_locked);
        assert!(!state.autonomous_mode);
    }
}
