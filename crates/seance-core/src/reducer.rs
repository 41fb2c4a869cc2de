use rand::rngs::StdRng;
use rand::Rng;

use crate::actions::ManifestKind;
use crate::actions::RuntimeAction;
use crate::actions::SessionAction;
use crate::actions::TimerKey;
use crate::actions::UserAction;
use crate::commands;
use crate::commands::CommandResponse;
use crate::config::EngineConfig;
use crate::phase::CurseMeter;
use crate::phase::ESCAPE_CURSE;
use crate::state::LineKind;
use crate::state::OutputLine;
use crate::state::SessionEventKind;
use crate::state::SessionState;

/// Transient visual directive for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Glitch,
    Shake,
    Flicker,
}

impl EffectKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Glitch => "glitch",
            Self::Shake => "shake",
            Self::Flicker => "flicker",
        }
    }
}

/// One ordered batch of output. The controller emits the lines one at a
/// time with a per-line typing pause; `delay_ms` runs once, up front.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutputPlan {
    pub delay_ms: u64,
    pub lines: Vec<OutputLine>,
    pub unstable_typing: bool,
}

impl OutputPlan {
    pub fn lines(lines: Vec<OutputLine>) -> Self {
        Self {
            lines,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    Emit(OutputPlan),
    /// Wipe the transcript (the `CLEAR` sentinel, and session reset).
    ClearScreen,
    Pulse(EffectKind),
    Schedule {
        key: TimerKey,
        delay_ms: u64,
    },
    Cancel(TimerKey),
    CancelAll,
    /// Best-effort snapshot save; failures are swallowed downstream.
    Save,
}

/// The only mutation path for `SessionState`. Timers and the frontend feed
/// actions in; state changes and side-channel work come out as effects, in
/// execution order.
pub fn reduce(
    state: &mut SessionState,
    action: SessionAction,
    config: &EngineConfig,
    rng: &mut StdRng,
) -> Vec<SessionEffect> {
    match action {
        SessionAction::User(user) => reduce_user(state, user, config, rng),
        SessionAction::Runtime(runtime) => reduce_runtime(state, runtime, config, rng),
    }
}

fn reduce_user(
    state: &mut SessionState,
    action: UserAction,
    config: &EngineConfig,
    rng: &mut StdRng,
) -> Vec<SessionEffect> {
    match action {
        UserAction::Submit(raw) => reduce_submit(state, &raw, config, rng),
        UserAction::Interrupt => reduce_interrupt(state),
        UserAction::Reset => reduce_reset(state),
    }
}

fn reduce_submit(
    state: &mut SessionState,
    raw: &str,
    config: &EngineConfig,
    rng: &mut StdRng,
) -> Vec<SessionEffect> {
    let trimmed = raw.trim();
    // Locked input and empty input are silent no-ops, not errors.
    if trimmed.is_empty() || state.terminal_locked || state.autonomous_mode {
        return Vec::new();
    }

    state.last_command = trimmed.to_string();
    state.history.push(trimmed);
    let normalized = trimmed.to_lowercase();
    if let Some(key) = normalized.split_whitespace().next() {
        *state.command_counts.entry(key.to_string()).or_insert(0) += 1;
    }

    let response = commands::dispatch(trimmed, state, config, rng);
    state
        .event_log
        .record(SessionEventKind::Dispatch, trimmed.to_string());

    let mut effects = vec![SessionEffect::Emit(OutputPlan::lines(vec![
        OutputLine::command(format!("> {trimmed}")),
    ]))];
    apply_response(state, response, config, rng, &mut effects);
    effects.push(SessionEffect::Save);
    effects
}

fn apply_response(
    state: &mut SessionState,
    response: CommandResponse,
    config: &EngineConfig,
    rng: &mut StdRng,
    effects: &mut Vec<SessionEffect>,
) {
    if response.requests_clear() {
        effects.push(SessionEffect::ClearScreen);
    } else {
        let kind = if response.effects.corrupted {
            LineKind::Corrupted
        } else {
            LineKind::System
        };
        let lines = response
            .output
            .iter()
            .map(|text| OutputLine {
                text: text.clone(),
                kind,
            })
            .collect();
        effects.push(SessionEffect::Emit(OutputPlan {
            delay_ms: response.delay_ms.unwrap_or(0),
            lines,
            unstable_typing: response.effects.unstable_typing,
        }));
    }

    if response.effects.glitch {
        effects.push(SessionEffect::Pulse(EffectKind::Glitch));
    }
    if response.effects.shake {
        effects.push(SessionEffect::Pulse(EffectKind::Shake));
    }
    if response.effects.flicker {
        effects.push(SessionEffect::Pulse(EffectKind::Flicker));
    }

    let delta = response.delta;
    if let Some(theme) = delta.theme {
        state.theme = theme;
    }
    if let Some(name) = delta.user_name {
        state.user_name = name;
    }
    if let Some(awaiting) = delta.awaiting_name {
        state.memory.awaiting_name = awaiting;
    }
    if let Some(curse) = delta.curse {
        apply_curse(state, curse, config, effects);
    }

    if let Some(lock_ms) = response.lock_ms {
        if !state.autonomous_mode {
            state.terminal_locked = true;
            state
                .event_log
                .record(SessionEventKind::Locked, format!("{lock_ms}ms"));
            effects.push(SessionEffect::Schedule {
                key: TimerKey::LockExpiry,
                delay_ms: lock_ms,
            });
        }
    }

    maybe_schedule_side_message(state, config, rng, effects);
}

fn apply_curse(
    state: &mut SessionState,
    curse: CurseMeter,
    config: &EngineConfig,
    effects: &mut Vec<SessionEffect>,
) {
    let previous_phase = state.phase;
    state.curse = curse;
    state.sync_phase();

    if state.phase != previous_phase {
        state.event_log.record(
            SessionEventKind::PhaseShift,
            format!("{} -> {}", previous_phase.label(), state.phase.label()),
        );
    }

    rearm_manifestations(state, config, effects);

    if state.curse.is_full() && !state.autonomous_mode {
        state.autonomous_mode = true;
        state.terminal_locked = true;
        state.autonomous_ticks = 0;
        state
            .event_log
            .record(SessionEventKind::AutonomousEntered, "curse full");
        effects.push(SessionEffect::Cancel(TimerKey::LockExpiry));
        effects.push(SessionEffect::Schedule {
            key: TimerKey::AutonomousTick,
            delay_ms: config.autonomous_cadence_ms,
        });
    }
}

fn rearm_manifestations(
    state: &SessionState,
    config: &EngineConfig,
    effects: &mut Vec<SessionEffect>,
) {
    let curse = state.curse.value();
    if curse > 10 {
        effects.push(SessionEffect::Schedule {
            key: TimerKey::Flicker,
            delay_ms: config.flicker_interval_ms(curse),
        });
    }
    if curse > 25 {
        effects.push(SessionEffect::Schedule {
            key: TimerKey::Glitch,
            delay_ms: config.glitch_interval_ms(curse),
        });
    }
}

fn maybe_schedule_side_message(
    state: &SessionState,
    config: &EngineConfig,
    rng: &mut StdRng,
    effects: &mut Vec<SessionEffect>,
) {
    if state.autonomous_mode || state.curse.value() <= config.side_message_min_curse {
        return;
    }
    if rng.gen_bool(config.side_message_chance) {
        let delay_ms =
            rng.gen_range(config.side_message_min_delay_ms..=config.side_message_max_delay_ms);
        effects.push(SessionEffect::Schedule {
            key: TimerKey::SideMessage,
            delay_ms,
        });
    }
}

fn reduce_interrupt(state: &mut SessionState) -> Vec<SessionEffect> {
    // The gesture is reserved for autonomous mode and inert elsewhere.
    if !state.autonomous_mode {
        return Vec::new();
    }

    state.autonomous_mode = false;
    state.terminal_locked = false;
    state.autonomous_ticks = 0;
    state.curse = CurseMeter::new(ESCAPE_CURSE);
    state.sync_phase();
    state
        .event_log
        .record(SessionEventKind::Escape, "interrupt received");

    vec![
        SessionEffect::Cancel(TimerKey::AutonomousTick),
        SessionEffect::Emit(OutputPlan::lines(commands::escape_lines())),
        SessionEffect::Save,
    ]
}

fn reduce_reset(state: &mut SessionState) -> Vec<SessionEffect> {
    *state = SessionState::new();
    state.event_log.record(SessionEventKind::Reset, "user reset");

    vec![
        SessionEffect::CancelAll,
        SessionEffect::ClearScreen,
        SessionEffect::Emit(OutputPlan::lines(commands::welcome_lines())),
        SessionEffect::Save,
    ]
}

fn reduce_runtime(
    state: &mut SessionState,
    action: RuntimeAction,
    config: &EngineConfig,
    rng: &mut StdRng,
) -> Vec<SessionEffect> {
    match action {
        RuntimeAction::SessionStarted => reduce_session_started(state, config),
        RuntimeAction::LockElapsed => {
            // Autonomous mode owns the lock; only a timed lock expires.
            if state.autonomous_mode || !state.terminal_locked {
                return Vec::new();
            }
            state.terminal_locked = false;
            state
                .event_log
                .record(SessionEventKind::Unlocked, "lock elapsed");
            vec![SessionEffect::Save]
        }
        RuntimeAction::AutonomousTick => reduce_autonomous_tick(state, config),
        RuntimeAction::SideMessageDue => {
            let text = commands::SIDE_MESSAGE_POOL
                [rng.gen_range(0..commands::SIDE_MESSAGE_POOL.len())];
            vec![SessionEffect::Emit(OutputPlan::lines(vec![
                OutputLine::corrupted(text),
            ]))]
        }
        RuntimeAction::ManifestTick(kind) => reduce_manifest_tick(state, kind, config, rng),
    }
}

fn reduce_session_started(state: &mut SessionState, config: &EngineConfig) -> Vec<SessionEffect> {
    state.session_count += 1;
    state.autonomous_ticks = 0;
    state.sync_phase();
    // A restored autonomous session stays trapped until interrupted.
    state.terminal_locked = state.autonomous_mode;

    let mut effects = vec![SessionEffect::Emit(OutputPlan::lines(
        commands::welcome_lines(),
    ))];
    rearm_manifestations(state, config, &mut effects);
    if state.autonomous_mode {
        effects.push(SessionEffect::Schedule {
            key: TimerKey::AutonomousTick,
            delay_ms: config.autonomous_cadence_ms,
        });
    }
    effects.push(SessionEffect::Save);
    effects
}

fn reduce_autonomous_tick(state: &mut SessionState, config: &EngineConfig) -> Vec<SessionEffect> {
    // Stale-timer guard: a tick scheduled before an escape must not speak.
    if !state.autonomous_mode {
        return Vec::new();
    }

    let pool = commands::AUTONOMOUS_POOL;
    let text = pool[state.autonomous_ticks as usize % pool.len()];
    state.autonomous_ticks += 1;

    let mut lines = vec![OutputLine::corrupted(text)];
    if state.autonomous_ticks >= config.autonomous_line_limit {
        // The voice falls silent, but the trap stays shut.
        lines.push(OutputLine::system(""));
        lines.push(OutputLine::system(commands::INTERRUPT_HINT));
        return vec![SessionEffect::Emit(OutputPlan::lines(lines))];
    }

    vec![
        SessionEffect::Emit(OutputPlan::lines(lines)),
        SessionEffect::Schedule {
            key: TimerKey::AutonomousTick,
            delay_ms: config.autonomous_cadence_ms,
        },
    ]
}

fn reduce_manifest_tick(
    state: &SessionState,
    kind: ManifestKind,
    config: &EngineConfig,
    rng: &mut StdRng,
) -> Vec<SessionEffect> {
    let curse = state.curse.value();
    let (key, pulse, active, interval_ms) = match kind {
        ManifestKind::Flicker => (
            TimerKey::Flicker,
            EffectKind::Flicker,
            curse > 10,
            config.flicker_interval_ms(curse),
        ),
        ManifestKind::Glitch => (
            TimerKey::Glitch,
            EffectKind::Glitch,
            curse > 25,
            config.glitch_interval_ms(curse),
        ),
    };

    if !active {
        return Vec::new();
    }

    let mut effects = Vec::new();
    if rng.gen_bool(config.manifest_chance(curse).clamp(0.0, 1.0)) {
        effects.push(SessionEffect::Pulse(pulse));
    }
    effects.push(SessionEffect::Schedule {
        key,
        delay_ms: interval_ms,
    });
    effects
}

#[cfg(test)]
mod tests;
