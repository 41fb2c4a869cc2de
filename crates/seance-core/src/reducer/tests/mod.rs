use rand::rngs::StdRng;
use rand::SeedableRng;

pub(super) use super::reduce;
pub(super) use super::EffectKind;
pub(super) use super::SessionEffect;
pub(super) use crate::actions::ManifestKind;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::SessionAction;
pub(super) use crate::actions::TimerKey;
pub(super) use crate::actions::UserAction;
pub(super) use crate::commands;
pub(super) use crate::config::EngineConfig;
pub(super) use crate::phase::CurseMeter;
pub(super) use crate::phase::Phase;
pub(super) use crate::state::LineKind;
pub(super) use crate::state::SessionState;
pub(super) use crate::state::Theme;

mod autonomous;
mod reset;

fn state() -> SessionState {
    SessionState::new()
}

fn state_at(curse: u8) -> SessionState {
    let mut state = SessionState::new();
    state.curse = CurseMeter::new(curse);
    state.sync_phase();
    state
}

fn config() -> EngineConfig {
    EngineConfig::default()
}

fn rng() -> StdRng {
    StdRng::seed_from_u64(11)
}

fn submit(state: &mut SessionState, raw: &str, rng: &mut StdRng) -> Vec<SessionEffect> {
    reduce(
        state,
        SessionAction::User(UserAction::Submit(raw.to_string())),
        &config(),
        rng,
    )
}

fn runtime(state: &mut SessionState, action: RuntimeAction, rng: &mut StdRng) -> Vec<SessionEffect> {
    reduce(state, SessionAction::Runtime(action), &config(), rng)
}

/// All emitted text, flattened across `Emit` effects in order.
fn emitted_lines(effects: &[SessionEffect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            SessionEffect::Emit(plan) => Some(plan.lines.iter().map(|l| l.text.clone())),
            _ => None,
        })
        .flatten()
        .collect()
}

fn scheduled_delay(effects: &[SessionEffect], key: TimerKey) -> Option<u64> {
    effects.iter().find_map(|effect| match effect {
        SessionEffect::Schedule {
            key: scheduled,
            delay_ms,
        } if *scheduled == key => Some(*delay_ms),
        _ => None,
    })
}

fn cancels(effects: &[SessionEffect], key: TimerKey) -> bool {
    effects
        .iter()
        .any(|effect| matches!(effect, SessionEffect::Cancel(k) if *k == key))
}

fn clears_screen(effects: &[SessionEffect]) -> bool {
    effects
        .iter()
        .any(|effect| matches!(effect, SessionEffect::ClearScreen))
}
