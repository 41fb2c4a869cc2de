use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

/// Cosmetic and pacing tuning. Every field has the engine's shipped value
/// as its default, so a partial (or absent) config file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pause before each ordinary output line, in milliseconds.
    pub typing_pause_ms: u64,
    /// Pause range used while the unstable-typing flag is set.
    pub unstable_typing_min_ms: u64,
    pub unstable_typing_max_ms: u64,
    /// Thinking pause for the diagnostics readout.
    pub diagnostics_delay_ms: u64,
    /// Chance, per executed command, of scheduling an unsolicited message.
    pub side_message_chance: f64,
    /// Curse value the side-message roll requires to be exceeded.
    pub side_message_min_curse: u8,
    /// Delay window before the unsolicited message lands.
    pub side_message_min_delay_ms: u64,
    pub side_message_max_delay_ms: u64,
    /// Cadence of autonomous-mode line emission.
    pub autonomous_cadence_ms: u64,
    /// Autonomous lines emitted before the interrupt instruction.
    pub autonomous_line_limit: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            typing_pause_ms: 50,
            unstable_typing_min_ms: 20,
            unstable_typing_max_ms: 120,
            diagnostics_delay_ms: 2_000,
            side_message_chance: 0.05,
            side_message_min_curse: 25,
            side_message_min_delay_ms: 2_000,
            side_message_max_delay_ms: 5_000,
            autonomous_cadence_ms: 800,
            autonomous_line_limit: 21,
        }
    }
}

impl EngineConfig {
    /// Load from a YAML file, falling back to defaults when the file is
    /// missing or unreadable. A malformed file is an error; silently
    /// ignoring a typo'd config would be worse than refusing it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, serde_yaml::Error> {
        match std::fs::read_to_string(path) {
            Ok(text) => serde_yaml::from_str(&text),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Flicker cadence shortens as the curse rises; fires only above
    /// curse 10.
    pub fn flicker_interval_ms(&self, curse: u8) -> u64 {
        5_000u64.saturating_sub(u64::from(curse) * 30).max(500)
    }

    /// Glitch cadence, active above curse 25.
    pub fn glitch_interval_ms(&self, curse: u8) -> u64 {
        8_000u64.saturating_sub(u64::from(curse) * 40).max(1_000)
    }

    /// Probability that a manifestation tick actually fires a pulse.
    pub fn manifest_chance(&self, curse: u8) -> f64 {
        f64::from(curse) / 200.0
    }
}
