use pretty_assertions::assert_eq;

use super::*;

fn lived_in_state(rng: &mut rand::rngs::StdRng) -> SessionState {
    let mut state = state();
    state.session_count = 4;
    for raw in ["ping", "ask name", "Morgan", "theme amber", "echo boo"] {
        submit(&mut state, raw, rng);
    }
    state
}

#[test]
fn reset_restores_documented_defaults() {
    let mut rng = rng();
    let mut state = lived_in_state(&mut rng);
    assert_ne!(state.curse.value(), 0);

    reduce(
        &mut state,
        SessionAction::User(UserAction::Reset),
        &config(),
        &mut rng,
    );

    let mut expected = SessionState::new();
    expected
        .event_log
        .record(crate::state::SessionEventKind::Reset, "user reset");
    assert_eq!(state, expected);
    assert_eq!(state.session_count, 0);
}

#[test]
fn reset_cancels_every_timer_and_replays_the_banner() {
    let mut rng = rng();
    let mut state = lived_in_state(&mut rng);

    let effects = reduce(
        &mut state,
        SessionAction::User(UserAction::Reset),
        &config(),
        &mut rng,
    );

    assert!(effects
        .iter()
        .any(|e| matches!(e, SessionEffect::CancelAll)));
    assert!(clears_screen(&effects));
    assert_eq!(
        emitted_lines(&effects),
        commands::WELCOME_BANNER
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
    );
}

#[test]
fn reset_breaks_even_an_autonomous_trap() {
    let mut rng = rng();
    let mut state = state_at(99);
    submit(&mut state, "greet", &mut rng);
    assert!(state.autonomous_mode);

    reduce(
        &mut state,
        SessionAction::User(UserAction::Reset),
        &config(),
        &mut rng,
    );
    assert!(!state.autonomous_mode);
    assert!(!state.terminal_locked);
    assert_eq!(state.curse.value(), 0);
}

#[test]
fn session_started_bumps_the_count_and_greets() {
    let mut rng = rng();
    let mut state = state();
    state.session_count = 6;

    let effects = runtime(&mut state, RuntimeAction::SessionStarted, &mut rng);
    assert_eq!(state.session_count, 7);
    assert_eq!(
        emitted_lines(&effects),
        commands::WELCOME_BANNER
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
    );
}

#[test]
fn session_started_rearms_a_restored_trap() {
    let mut rng = rng();
    let mut state = state_at(100);
    state.autonomous_mode = true;

    let effects = runtime(&mut state, RuntimeAction::SessionStarted, &mut rng);
    assert!(state.terminal_locked);
    assert_eq!(
        scheduled_delay(&effects, TimerKey::AutonomousTick),
        Some(config().autonomous_cadence_ms)
    );
}
