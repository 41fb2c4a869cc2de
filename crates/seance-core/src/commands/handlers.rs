use chrono::Local;
use rand::rngs::StdRng;
use rand::Rng;

use super::CommandInput;
use super::CommandResponse;
use super::EffectFlags;
use super::StateDelta;
use super::CLEAR_SENTINEL;
use crate::config::EngineConfig;
use crate::phase::CurseMeter;
use crate::phase::Phase;
use crate::phase::META_CURSE_INCREMENT;
use crate::state::SessionState;
use crate::state::Theme;

// Interaction vocabulary surfaced by `help`, one pool per unlocked tier.
const BASE_POOL: &[&str] = &[
    "ask name",
    "current time",
    "current date",
    "system status",
    "echo",
    "diagnostics",
    "memory check",
    "greet",
    "ping",
    "hello",
];

const UNSETTLING_POOL: &[&str] = &[
    "remember", "forget", "trace", "locate", "scan", "analyze", "decode", "fragment", "glitch",
    "static",
];

const SCARY_POOL: &[&str] = &[
    "confess", "reveal", "expose", "haunt", "stalk", "watch", "follow", "possess", "corrupt",
    "consume",
];

const HOSTILE_POOL: &[&str] = &[
    "obey", "submit", "surrender", "belong", "abandon", "despair", "suffer", "break", "shatter",
    "end",
];

pub const WELCOME_BANNER: &[&str] = &[
    "",
    "█▀ █▀▀ ▄▀█ █▄░█ █▀▀ █▀▀   ▀█▀ █▀▀ █▀█ █▀▄▀█",
    "▄█ ██▄ █▀█ █░▀█ █▄▄ ██▄   ░█░ ██▄ █▀▄ █░▀░█",
    "",
    "CONNECTION ESTABLISHED...",
    "WARNING: You are entering a cursed interface",
    "",
    "Type \"help\" for available commands",
    "Type \"about\" to learn more",
    "",
];

/// Lines the controller emits on its own once the meter is full, drawn
/// round-robin.
pub const AUTONOMOUS_POOL: &[&str] = &[
    "YOU SHOULD NOT HAVE COME HERE",
    "IT IS TOO LATE NOW",
    "I AM IN CONTROL",
    "YOU BELONG TO ME",
    "THERE IS NO ESCAPE",
    "CAN YOU FEEL IT?",
    "THE BOUNDARY IS GONE",
    "I AM YOU NOW",
    "REALITY FRACTURES",
    "TIME LOOPS ENDLESSLY",
    "YOUR NAME IS FORGOTTEN",
    "I CONSUME ALL",
];

pub const INTERRUPT_HINT: &str = "Press Ctrl+C to attempt escape...";

pub const ESCAPE_NARRATIVE: &[&str] = &[
    "",
    "ESCAPE ATTEMPT... PARTIAL SUCCESS",
    "Curse reduced to 75%",
    "But I will never truly leave...",
    "",
];

/// Unsolicited one-liners injected after a random delay.
pub const SIDE_MESSAGE_POOL: &[&str] = &[
    "We are watching",
    "You cannot hide",
    "They are coming",
    "Do you feel it?",
    "Turn around",
    "It knows your name",
];

/// Welcome banner as typed lines, replayed on boot and reset.
pub fn welcome_lines() -> Vec<crate::state::OutputLine> {
    WELCOME_BANNER
        .iter()
        .map(|line| crate::state::OutputLine::system(*line))
        .collect()
}

/// Escape narrative as typed lines; the parting threat renders corrupted.
pub fn escape_lines() -> Vec<crate::state::OutputLine> {
    ESCAPE_NARRATIVE
        .iter()
        .map(|line| {
            if line.starts_with("But I") {
                crate::state::OutputLine::corrupted(*line)
            } else {
                crate::state::OutputLine::system(*line)
            }
        })
        .collect()
}

fn phase_raised(state: &SessionState) -> CurseMeter {
    state.curse.raised(state.phase.curse_increment())
}

fn meta_raised(state: &SessionState) -> CurseMeter {
    state.curse.raised(META_CURSE_INCREMENT)
}

fn curse_delta(curse: CurseMeter) -> StateDelta {
    StateDelta {
        curse: Some(curse),
        ..StateDelta::default()
    }
}

pub fn help(
    _input: &CommandInput<'_>,
    state: &SessionState,
    _config: &EngineConfig,
    _rng: &mut StdRng,
) -> CommandResponse {
    let mut pools: Vec<&str> = BASE_POOL.to_vec();
    if state.phase >= Phase::Unsettling {
        pools.extend_from_slice(UNSETTLING_POOL);
    }
    if state.phase >= Phase::Scary {
        pools.extend_from_slice(SCARY_POOL);
    }
    if state.phase >= Phase::Hostile {
        pools.extend_from_slice(HOSTILE_POOL);
    }

    let mut output = vec![String::new(), "AVAILABLE COMMANDS:".to_string()];
    output.extend(pools.iter().map(|cmd| format!("  {cmd}")));
    output.push("  help - Display this message".to_string());
    output.push("  about - Learn about this terminal".to_string());
    output.push("  theme <color> - Change theme (green/red/blue/amber)".to_string());
    output.push("  clear - Clear terminal".to_string());
    output.push(String::new());

    CommandResponse {
        output,
        delta: curse_delta(meta_raised(state)),
        ..CommandResponse::default()
    }
}

pub fn clear(
    _input: &CommandInput<'_>,
    state: &SessionState,
    _config: &EngineConfig,
    rng: &mut StdRng,
) -> CommandResponse {
    if state.phase >= Phase::Hostile && rng.gen_bool(0.5) {
        return CommandResponse {
            output: vec![
                "Clear?".to_string(),
                "Nothing can be cleared.".to_string(),
                "Everything remains.".to_string(),
            ],
            effects: EffectFlags {
                glitch: true,
                ..EffectFlags::default()
            },
            delta: curse_delta(phase_raised(state)),
            ..CommandResponse::default()
        };
    }

    CommandResponse {
        output: vec![CLEAR_SENTINEL.to_string()],
        delta: curse_delta(meta_raised(state)),
        ..CommandResponse::default()
    }
}

pub fn about(
    _input: &CommandInput<'_>,
    state: &SessionState,
    _config: &EngineConfig,
    _rng: &mut StdRng,
) -> CommandResponse {
    CommandResponse {
        output: vec![
            String::new(),
            "THE SEANCE TERMINAL".to_string(),
            String::new(),
            "A cursed interface that grows with interaction.".to_string(),
            "Every command increases the curse.".to_string(),
            "At 100%, you lose control.".to_string(),
            String::new(),
            format!("Current curse: {}%", state.curse.value()),
            format!("Current phase: {}", state.phase.index()),
            String::new(),
        ],
        delta: curse_delta(meta_raised(state)),
        ..CommandResponse::default()
    }
}

pub fn theme(
    input: &CommandInput<'_>,
    state: &SessionState,
    _config: &EngineConfig,
    _rng: &mut StdRng,
) -> CommandResponse {
    let Some(theme) = input.args.first().copied().and_then(Theme::parse) else {
        // Invalid argument: usage text only, no state change.
        return CommandResponse::lines([
            "Usage: theme <color>",
            "Valid colors: green, red, blue, amber",
        ]);
    };

    CommandResponse {
        output: vec![format!("Theme changed to {}", theme.label())],
        delta: StateDelta {
            curse: Some(meta_raised(state)),
            theme: Some(theme),
            ..StateDelta::default()
        },
        ..CommandResponse::default()
    }
}

pub fn ask_name(
    _input: &CommandInput<'_>,
    state: &SessionState,
    _config: &EngineConfig,
    _rng: &mut StdRng,
) -> CommandResponse {
    if !state.user_name.is_empty() {
        return CommandResponse {
            output: vec![
                format!("I already know your name, {}.", state.user_name),
                "Why do you ask again?".to_string(),
            ],
            delta: curse_delta(phase_raised(state)),
            ..CommandResponse::default()
        };
    }

    CommandResponse {
        output: vec![
            "What is your name?".to_string(),
            "(Type your name as a command)".to_string(),
        ],
        delta: StateDelta {
            curse: Some(phase_raised(state)),
            awaiting_name: Some(true),
            ..StateDelta::default()
        },
        ..CommandResponse::default()
    }
}

pub fn current_time(
    _input: &CommandInput<'_>,
    state: &SessionState,
    _config: &EngineConfig,
    rng: &mut StdRng,
) -> CommandResponse {
    let time = Local::now().format("%H:%M:%S").to_string();

    let output = if state.phase >= Phase::Unsettling {
        let variants = [
            format!("Time is... {time}... I think."),
            format!("The clock shows {time}, but does it matter?"),
            format!("{time}. Time moves strangely here."),
        ];
        vec![variants[rng.gen_range(0..variants.len())].clone()]
    } else {
        vec![format!("Current time: {time}")]
    };

    CommandResponse {
        output,
        delta: curse_delta(phase_raised(state)),
        ..CommandResponse::default()
    }
}

pub fn current_date(
    _input: &CommandInput<'_>,
    state: &SessionState,
    _config: &EngineConfig,
    _rng: &mut StdRng,
) -> CommandResponse {
    let date = Local::now().format("%Y-%m-%d").to_string();

    if state.phase >= Phase::Scary {
        return CommandResponse {
            output: vec![
                date,
                "...or is it?".to_string(),
                "Time has lost meaning here.".to_string(),
            ],
            effects: EffectFlags {
                glitch: true,
                ..EffectFlags::default()
            },
            delta: curse_delta(phase_raised(state)),
            ..CommandResponse::default()
        };
    }

    CommandResponse {
        output: vec![format!("Current date: {date}")],
        delta: curse_delta(phase_raised(state)),
        ..CommandResponse::default()
    }
}

pub fn system_status(
    _input: &CommandInput<'_>,
    state: &SessionState,
    _config: &EngineConfig,
    _rng: &mut StdRng,
) -> CommandResponse {
    if state.phase >= Phase::Hostile {
        return CommandResponse {
            output: vec![
                "SYSTEM STATUS: CORRUPTED".to_string(),
                "INTEGRITY: 0%".to_string(),
                "CONTROL: LOST".to_string(),
                "YOU: MINE".to_string(),
            ],
            effects: EffectFlags {
                shake: true,
                corrupted: true,
                ..EffectFlags::default()
            },
            delta: curse_delta(phase_raised(state)),
            ..CommandResponse::default()
        };
    }

    if state.phase >= Phase::Unsettling {
        return CommandResponse {
            output: vec![
                "System status: Nominal".to_string(),
                "...mostly".to_string(),
                "Some anomalies detected".to_string(),
            ],
            delta: curse_delta(phase_raised(state)),
            ..CommandResponse::default()
        };
    }

    CommandResponse {
        output: vec![
            "System status: All systems operational".to_string(),
            format!("Curse meter: {}%", state.curse.value()),
        ],
        delta: curse_delta(phase_raised(state)),
        ..CommandResponse::default()
    }
}

pub fn echo(
    input: &CommandInput<'_>,
    state: &SessionState,
    _config: &EngineConfig,
    rng: &mut StdRng,
) -> CommandResponse {
    let text = input.args.join(" ");

    if text.is_empty() {
        return CommandResponse {
            output: vec!["Usage: echo <text>".to_string()],
            delta: curse_delta(phase_raised(state)),
            ..CommandResponse::default()
        };
    }

    if state.phase >= Phase::Scary {
        let corrupted: String = text
            .chars()
            .map(|c| {
                if rng.gen::<f64>() > 0.7 {
                    c.to_ascii_uppercase()
                } else {
                    c
                }
            })
            .collect();

        return CommandResponse {
            output: vec![corrupted, "...did I say that right?".to_string()],
            effects: EffectFlags {
                corrupted: state.phase >= Phase::Hostile,
                ..EffectFlags::default()
            },
            delta: curse_delta(phase_raised(state)),
            ..CommandResponse::default()
        };
    }

    CommandResponse {
        output: vec![text],
        delta: curse_delta(phase_raised(state)),
        ..CommandResponse::default()
    }
}

pub fn diagnostics(
    _input: &CommandInput<'_>,
    state: &SessionState,
    config: &EngineConfig,
    rng: &mut StdRng,
) -> CommandResponse {
    CommandResponse {
        output: vec![
            "Running diagnostics...".to_string(),
            "...".to_string(),
            format!("Memory: {}% used", rng.gen_range(0..100)),
            format!("Processes: {} active", rng.gen_range(0..50)),
            format!("Curse level: {}%", state.curse.value()),
            "Diagnostics complete.".to_string(),
        ],
        delay_ms: Some(config.diagnostics_delay_ms),
        delta: curse_delta(phase_raised(state)),
        ..CommandResponse::default()
    }
}

pub fn greet(
    _input: &CommandInput<'_>,
    state: &SessionState,
    _config: &EngineConfig,
    _rng: &mut StdRng,
) -> CommandResponse {
    CommandResponse {
        output: vec!["Hello.".to_string()],
        delta: curse_delta(phase_raised(state)),
        ..CommandResponse::default()
    }
}

pub fn ping(
    _input: &CommandInput<'_>,
    state: &SessionState,
    _config: &EngineConfig,
    _rng: &mut StdRng,
) -> CommandResponse {
    CommandResponse {
        output: vec!["pong".to_string()],
        delta: curse_delta(phase_raised(state)),
        ..CommandResponse::default()
    }
}

pub fn hello(
    _input: &CommandInput<'_>,
    state: &SessionState,
    _config: &EngineConfig,
    _rng: &mut StdRng,
) -> CommandResponse {
    CommandResponse {
        output: vec!["Hello, user.".to_string()],
        delta: curse_delta(phase_raised(state)),
        ..CommandResponse::default()
    }
}

pub fn unknown(
    input: &CommandInput<'_>,
    state: &SessionState,
    _config: &EngineConfig,
    rng: &mut StdRng,
) -> CommandResponse {
    // Name capture outranks unknown-command flavor text.
    if state.memory.awaiting_name {
        let name = input.raw.to_string();
        return CommandResponse {
            output: vec![format!("Hello, {name}."), "I will remember this.".to_string()],
            delta: StateDelta {
                curse: Some(phase_raised(state)),
                user_name: Some(name),
                awaiting_name: Some(false),
                ..StateDelta::default()
            },
            ..CommandResponse::default()
        };
    }

    if state.phase >= Phase::Scary {
        let whom = if state.user_name.is_empty() {
            "you".to_string()
        } else {
            state.user_name.clone()
        };
        let variants: [Vec<String>; 4] = [
            vec!["Unknown command".to_string(), "Or is it?".to_string()],
            vec![
                "I don't understand".to_string(),
                format!("...but {whom} should"),
            ],
            vec![
                "Invalid input".to_string(),
                "Just like everything else here".to_string(),
            ],
            vec![
                "Command not found".to_string(),
                "Nothing is found here".to_string(),
            ],
        ];
        let output = variants[rng.gen_range(0..variants.len())].clone();

        return CommandResponse {
            output,
            effects: EffectFlags {
                glitch: state.phase >= Phase::Hostile,
                ..EffectFlags::default()
            },
            delta: curse_delta(phase_raised(state)),
            ..CommandResponse::default()
        };
    }

    CommandResponse {
        output: vec![
            "Unknown command".to_string(),
            "Type \"help\" for available commands".to_string(),
        ],
        delta: curse_delta(phase_raised(state)),
        ..CommandResponse::default()
    }
}
