/// Timer purposes understood by the scheduler. At most one deadline is
/// outstanding per key; scheduling again re-arms it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    LockExpiry,
    AutonomousTick,
    Flicker,
    Glitch,
    SideMessage,
}

impl TimerKey {
    pub fn label(self) -> &'static str {
        match self {
            Self::LockExpiry => "lock-expiry",
            Self::AutonomousTick => "autonomous-tick",
            Self::Flicker => "flicker",
            Self::Glitch => "glitch",
            Self::SideMessage => "side-message",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Flicker,
    Glitch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// One submitted input line, raw (untrimmed, case preserved).
    Submit(String),
    /// The reserved escape gesture. Inert outside autonomous mode.
    Interrupt,
    /// Full reinitialization: defaults, cleared output, welcome banner.
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeAction {
    /// Applied once at boot, after the snapshot (or defaults) is in place.
    SessionStarted,
    /// The lock-expiry timer fired.
    LockElapsed,
    /// The autonomous-mode cadence timer fired.
    AutonomousTick,
    /// The delayed unsolicited-message timer fired.
    SideMessageDue,
    /// A manifestation cadence timer fired.
    ManifestTick(ManifestKind),
}
