use pretty_assertions::assert_eq;

use super::*;

fn trapped_state(rng: &mut rand::rngs::StdRng) -> SessionState {
    let mut state = state_at(99);
    submit(&mut state, "greet", rng);
    assert!(state.autonomous_mode);
    state
}

#[test]
fn reaching_full_curse_locks_and_arms_the_ticker() {
    let mut state = state_at(99);
    let mut rng = rng();

    let effects = submit(&mut state, "greet", &mut rng);
    assert!(state.autonomous_mode);
    assert!(state.terminal_locked);
    assert_eq!(state.phase, Phase::Autonomous);
    assert_eq!(
        scheduled_delay(&effects, TimerKey::AutonomousTick),
        Some(config().autonomous_cadence_ms)
    );
    assert!(cancels(&effects, TimerKey::LockExpiry));
}

#[test]
fn autonomous_mode_swallows_ordinary_commands() {
    let mut rng = rng();
    let mut state = trapped_state(&mut rng);
    let before = state.clone();

    for raw in ["help", "ping", "clear", "reset please"] {
        let effects = submit(&mut state, raw, &mut rng);
        assert!(effects.is_empty(), "command {raw} leaked output");
    }
    assert_eq!(state, before);
}

#[test]
fn ticks_walk_the_pool_round_robin() {
    let mut rng = rng();
    let mut state = trapped_state(&mut rng);

    for i in 0..14 {
        let effects = runtime(&mut state, RuntimeAction::AutonomousTick, &mut rng);
        let lines = emitted_lines(&effects);
        let expected = commands::AUTONOMOUS_POOL[i % commands::AUTONOMOUS_POOL.len()];
        assert_eq!(lines[0], expected, "tick {i}");
    }
}

#[test]
fn ticker_stops_after_the_line_limit_with_the_hint() {
    let mut rng = rng();
    let mut state = trapped_state(&mut rng);
    let limit = config().autonomous_line_limit as usize;

    for i in 0..limit {
        let effects = runtime(&mut state, RuntimeAction::AutonomousTick, &mut rng);
        let rearmed = scheduled_delay(&effects, TimerKey::AutonomousTick).is_some();
        if i + 1 < limit {
            assert!(rearmed, "tick {i} should re-arm");
        } else {
            assert!(!rearmed, "final tick must not re-arm");
            let lines = emitted_lines(&effects);
            assert_eq!(lines.last().map(String::as_str), Some(commands::INTERRUPT_HINT));
        }
    }

    // Silent, but still trapped.
    assert!(state.autonomous_mode);
    assert!(state.terminal_locked);
}

#[test]
fn stale_tick_after_escape_is_ignored() {
    let mut rng = rng();
    let mut state = trapped_state(&mut rng);

    reduce(
        &mut state,
        SessionAction::User(UserAction::Interrupt),
        &config(),
        &mut rng,
    );
    let effects = runtime(&mut state, RuntimeAction::AutonomousTick, &mut rng);
    assert!(effects.is_empty());
}

#[test]
fn interrupt_escapes_to_exactly_seventy_five() {
    let mut rng = rng();
    let mut state = trapped_state(&mut rng);

    let effects = reduce(
        &mut state,
        SessionAction::User(UserAction::Interrupt),
        &config(),
        &mut rng,
    );

    assert_eq!(state.curse.value(), 75);
    assert_eq!(state.phase, Phase::Hostile);
    assert!(!state.autonomous_mode);
    assert!(!state.terminal_locked);
    assert!(cancels(&effects, TimerKey::AutonomousTick));

    let lines = emitted_lines(&effects);
    assert!(lines.iter().any(|l| l.contains("PARTIAL SUCCESS")));
    assert!(lines.iter().any(|l| l.contains("75%")));
}

#[test]
fn interrupt_is_inert_outside_autonomous_mode() {
    let mut state = state_at(40);
    let before = state.clone();
    let mut rng = rng();

    let effects = reduce(
        &mut state,
        SessionAction::User(UserAction::Interrupt),
        &config(),
        &mut rng,
    );
    assert!(effects.is_empty());
    assert_eq!(state, before);
}

#[test]
fn commands_work_again_after_escape() {
    let mut rng = rng();
    let mut state = trapped_state(&mut rng);

    reduce(
        &mut state,
        SessionAction::User(UserAction::Interrupt),
        &config(),
        &mut rng,
    );
    let effects = submit(&mut state, "ping", &mut rng);
    assert_eq!(emitted_lines(&effects)[1], "pong");
    // Hostile increment from 75.
    assert_eq!(state.curse.value(), 80);
}
