mod handlers;

pub use handlers::escape_lines;
pub use handlers::welcome_lines;
pub use handlers::AUTONOMOUS_POOL;
pub use handlers::ESCAPE_NARRATIVE;
pub use handlers::INTERRUPT_HINT;
pub use handlers::SIDE_MESSAGE_POOL;
pub use handlers::WELCOME_BANNER;

use rand::rngs::StdRng;

use crate::config::EngineConfig;
use crate::phase::CurseMeter;
use crate::state::SessionState;
use crate::state::Theme;

/// Sole line a handler emits to request a transcript wipe instead of text.
pub const CLEAR_SENTINEL: &str = "CLEAR";

/// Transient visual/timing directives riding on a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EffectFlags {
    pub glitch: bool,
    pub shake: bool,
    pub flicker: bool,
    pub corrupted: bool,
    pub unstable_typing: bool,
}

/// Partial patch a handler asks the reducer to merge. Curse values arrive
/// pre-clamped (`CurseMeter` cannot hold an out-of-range value).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateDelta {
    pub curse: Option<CurseMeter>,
    pub theme: Option<Theme>,
    pub user_name: Option<String>,
    pub awaiting_name: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandResponse {
    pub output: Vec<String>,
    pub delay_ms: Option<u64>,
    pub effects: EffectFlags,
    pub delta: StateDelta,
    pub lock_ms: Option<u64>,
}

impl CommandResponse {
    pub fn lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            output: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn requests_clear(&self) -> bool {
        self.output.len() == 1 && self.output[0] == CLEAR_SENTINEL
    }
}

/// What a resolved handler gets to look at: the argument tokens after the
/// matched key (normalized casing) and the raw input (case preserved, for
/// name capture and display).
#[derive(Debug, Clone)]
pub struct CommandInput<'a> {
    pub raw: &'a str,
    pub args: Vec<&'a str>,
}

pub type CommandHandler =
    fn(&CommandInput<'_>, &SessionState, &EngineConfig, &mut StdRng) -> CommandResponse;

#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub key: &'static str,
    pub handler: CommandHandler,
}

/// Registry order is load-bearing: prefix resolution takes the first key
/// the input starts with. Meta commands first, then the interaction set.
const COMMAND_SPECS: &[CommandSpec] = &[
    CommandSpec {
        key: "help",
        handler: handlers::help,
    },
    CommandSpec {
        key: "clear",
        handler: handlers::clear,
    },
    CommandSpec {
        key: "about",
        handler: handlers::about,
    },
    CommandSpec {
        key: "theme",
        handler: handlers::theme,
    },
    CommandSpec {
        key: "ask name",
        handler: handlers::ask_name,
    },
    CommandSpec {
        key: "current time",
        handler: handlers::current_time,
    },
    CommandSpec {
        key: "current date",
        handler: handlers::current_date,
    },
    CommandSpec {
        key: "system status",
        handler: handlers::system_status,
    },
    CommandSpec {
        key: "echo",
        handler: handlers::echo,
    },
    CommandSpec {
        key: "diagnostics",
        handler: handlers::diagnostics,
    },
    CommandSpec {
        key: "memory check",
        handler: handlers::diagnostics,
    },
    CommandSpec {
        key: "greet",
        handler: handlers::greet,
    },
    CommandSpec {
        key: "ping",
        handler: handlers::ping,
    },
    CommandSpec {
        key: "hello",
        handler: handlers::hello,
    },
];

pub fn registry() -> &'static [CommandSpec] {
    COMMAND_SPECS
}

/// Resolve raw input to exactly one handler and invoke it. Total: anything
/// unmatched lands on the unknown handler, so dispatch never fails.
pub fn dispatch(
    raw: &str,
    state: &SessionState,
    config: &EngineConfig,
    rng: &mut StdRng,
) -> CommandResponse {
    let trimmed = raw.trim();
    let normalized = trimmed.to_lowercase();

    let spec = COMMAND_SPECS
        .iter()
        .find(|spec| normalized == spec.key)
        .or_else(|| {
            COMMAND_SPECS
                .iter()
                .find(|spec| normalized.starts_with(spec.key))
        });

    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    match spec {
        Some(spec) => {
            let key_tokens = spec.key.split_whitespace().count();
            let args = tokens.iter().skip(key_tokens).copied().collect();
            let input = CommandInput { raw: trimmed, args };
            (spec.handler)(&input, state, config, rng)
        }
        None => {
            let args = tokens.iter().skip(1).copied().collect();
            let input = CommandInput { raw: trimmed, args };
            handlers::unknown(&input, state, config, rng)
        }
    }
}
