use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use seance_core::actions::ManifestKind;
use seance_core::actions::RuntimeAction;
use seance_core::actions::SessionAction;
use seance_core::actions::TimerKey;
use seance_core::actions::UserAction;
use seance_core::config::EngineConfig;
use seance_core::persistence::SnapshotStore;
use seance_core::reducer::reduce;
use seance_core::reducer::EffectKind;
use seance_core::reducer::OutputPlan;
use seance_core::reducer::SessionEffect;
use seance_core::state::LineKind;
use seance_core::state::OutputLine;
use seance_core::state::SessionEventKind;
use seance_core::state::SessionState;
use seance_core::state::Theme;

use crate::scheduler::Scheduler;

/// One thing for the frontend to do, in order. Pauses are part of the
/// event stream so the presentation layer never needs its own pacing
/// logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    Line {
        line: OutputLine,
        pause_before_ms: u64,
    },
    Clear,
    Pulse(EffectKind),
}

/// Controller-level view of the session. `submit` returns a whole command's
/// events at once, so the processing window lives in the frontend's paced
/// playback of that batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerMode {
    Idle,
    Locked,
    Autonomous,
}

/// Owns the session: state, the one scheduler, the RNG, and the snapshot
/// store. All mutation flows through the reducer; this type only executes
/// the returned effects.
#[derive(Debug)]
pub struct SessionController {
    state: SessionState,
    config: EngineConfig,
    scheduler: Scheduler,
    rng: StdRng,
    store: Option<SnapshotStore>,
}

impl SessionController {
    pub fn new(config: EngineConfig, store: Option<SnapshotStore>) -> Self {
        Self::with_rng(config, store, StdRng::from_entropy())
    }

    /// Construction with a caller-supplied RNG, so tests can seed it.
    pub fn with_rng(config: EngineConfig, store: Option<SnapshotStore>, rng: StdRng) -> Self {
        let state = match &store {
            Some(store) => store.load(),
            None => SessionState::new(),
        };
        Self {
            state,
            config,
            scheduler: Scheduler::new(),
            rng,
            store,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn theme(&self) -> Theme {
        self.state.theme
    }

    pub fn mode(&self) -> ControllerMode {
        if self.state.autonomous_mode {
            ControllerMode::Autonomous
        } else if self.state.terminal_locked {
            ControllerMode::Locked
        } else {
            ControllerMode::Idle
        }
    }

    /// Earliest pending timer deadline, for the frontend's poll loop.
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    /// Start (or resume) the session: bumps the session counter and replays
    /// the welcome banner; a snapshot that was autonomous re-arms its
    /// ticker.
    pub fn boot(&mut self, now_ms: u64) -> Vec<TerminalEvent> {
        self.apply(SessionAction::Runtime(RuntimeAction::SessionStarted), now_ms)
    }

    pub fn submit(&mut self, raw: &str, now_ms: u64) -> Vec<TerminalEvent> {
        self.apply(
            SessionAction::User(UserAction::Submit(raw.to_string())),
            now_ms,
        )
    }

    pub fn interrupt(&mut self, now_ms: u64) -> Vec<TerminalEvent> {
        self.apply(SessionAction::User(UserAction::Interrupt), now_ms)
    }

    pub fn reset(&mut self, now_ms: u64) -> Vec<TerminalEvent> {
        self.apply(SessionAction::User(UserAction::Reset), now_ms)
    }

    /// Fire every timer due at `now_ms`. Timer output interleaves between
    /// command batches, never inside one.
    pub fn poll(&mut self, now_ms: u64) -> Vec<TerminalEvent> {
        let mut events = Vec::new();
        for key in self.scheduler.pop_due(now_ms) {
            let action = match key {
                TimerKey::LockExpiry => RuntimeAction::LockElapsed,
                TimerKey::AutonomousTick => RuntimeAction::AutonomousTick,
                TimerKey::Flicker => RuntimeAction::ManifestTick(ManifestKind::Flicker),
                TimerKey::Glitch => RuntimeAction::ManifestTick(ManifestKind::Glitch),
                TimerKey::SideMessage => RuntimeAction::SideMessageDue,
            };
            events.extend(self.apply(SessionAction::Runtime(action), now_ms));
        }
        events
    }

    fn apply(&mut self, action: SessionAction, now_ms: u64) -> Vec<TerminalEvent> {
        let effects = reduce(&mut self.state, action, &self.config, &mut self.rng);
        self.run_effects(effects, now_ms)
    }

    fn run_effects(&mut self, effects: Vec<SessionEffect>, now_ms: u64) -> Vec<TerminalEvent> {
        let mut events = Vec::new();
        for effect in effects {
            match effect {
                SessionEffect::Emit(plan) => self.emit(plan, &mut events),
                SessionEffect::ClearScreen => events.push(TerminalEvent::Clear),
                SessionEffect::Pulse(kind) => events.push(TerminalEvent::Pulse(kind)),
                SessionEffect::Schedule { key, delay_ms } => {
                    self.scheduler.arm(key, now_ms.saturating_add(delay_ms));
                }
                SessionEffect::Cancel(key) => self.scheduler.cancel(key),
                SessionEffect::CancelAll => self.scheduler.cancel_all(),
                SessionEffect::Save => self.save_snapshot(),
            }
        }
        events
    }

    fn emit(&mut self, plan: OutputPlan, events: &mut Vec<TerminalEvent>) {
        let mut first = true;
        for line in plan.lines {
            // Command echoes land instantly; everything else is typed.
            let typed = if line.kind == LineKind::Command || line.text.is_empty() {
                0
            } else if plan.unstable_typing {
                self.rng.gen_range(
                    self.config.unstable_typing_min_ms..=self.config.unstable_typing_max_ms,
                )
            } else {
                self.config.typing_pause_ms
            };
            let pause_before_ms = if first && plan.delay_ms > 0 {
                plan.delay_ms
            } else {
                typed
            };
            events.push(TerminalEvent::Line {
                line,
                pause_before_ms,
            });
            first = false;
        }
    }

    fn save_snapshot(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        // Failures stay invisible to the user; the event log keeps a trace.
        let kind = if store.save(&self.state) {
            SessionEventKind::SnapshotSaved
        } else {
            SessionEventKind::SnapshotFailed
        };
        self.state.event_log.record(kind, store.path().display().to_string());
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    use seance_core::commands;
    use seance_core::phase::CurseMeter;
    use seance_core::phase::Phase;
    use seance_core::state::LineKind;

    use super::*;

    fn controller() -> SessionController {
        SessionController::with_rng(EngineConfig::default(), None, StdRng::seed_from_u64(3))
    }

    fn texts(events: &[TerminalEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|event| match event {
                TerminalEvent::Line { line, .. } => Some(line.text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Drive the controller to a full meter through ordinary commands.
    fn trap(controller: &mut SessionController, now_ms: u64) {
        while !controller.state().autonomous_mode {
            controller.submit("greet", now_ms);
        }
    }

    #[test]
    fn boot_replays_the_banner_and_counts_the_session() {
        let mut controller = controller();
        let events = controller.boot(0);
        assert_eq!(controller.state().session_count, 1);
        assert_eq!(
            texts(&events),
            commands::WELCOME_BANNER
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn submit_paces_lines_with_the_typing_pause() {
        let mut controller = controller();
        controller.boot(0);
        let events = controller.submit("ping", 0);

        match &events[0] {
            TerminalEvent::Line {
                line,
                pause_before_ms,
            } => {
                assert_eq!(line.kind, LineKind::Command);
                assert_eq!(line.text, "> ping");
                assert_eq!(*pause_before_ms, 0);
            }
            other => panic!("expected command echo, got {other:?}"),
        }
        match &events[1] {
            TerminalEvent::Line {
                line,
                pause_before_ms,
            } => {
                assert_eq!(line.text, "pong");
                assert_eq!(*pause_before_ms, EngineConfig::default().typing_pause_ms);
            }
            other => panic!("expected pong, got {other:?}"),
        }
    }

    #[test]
    fn diagnostics_delay_lands_on_the_first_response_line() {
        let mut controller = controller();
        controller.boot(0);
        let events = controller.submit("diagnostics", 0);

        // events[0] is the command echo; events[1] opens the response.
        match &events[1] {
            TerminalEvent::Line {
                pause_before_ms, ..
            } => assert_eq!(*pause_before_ms, EngineConfig::default().diagnostics_delay_ms),
            other => panic!("expected delayed line, got {other:?}"),
        }
    }

    #[test]
    fn poll_before_the_deadline_is_quiet() {
        let mut controller = controller();
        controller.boot(0);
        trap(&mut controller, 1_000);

        assert!(controller.poll(1_100).is_empty());
        let cadence = EngineConfig::default().autonomous_cadence_ms;
        let events = controller.poll(1_000 + cadence);
        assert_eq!(texts(&events), vec![commands::AUTONOMOUS_POOL[0].to_string()]);
    }

    #[test]
    fn autonomous_run_speaks_then_falls_silent_but_stays_shut() {
        let mut controller = controller();
        controller.boot(0);
        trap(&mut controller, 0);

        // Step well past the point the ticker goes quiet; manifestation
        // timers keep re-arming but contribute pulses, not lines.
        let cadence = EngineConfig::default().autonomous_cadence_ms;
        let limit = EngineConfig::default().autonomous_line_limit as usize;
        let mut now = 0;
        let mut spoken = Vec::new();
        for _ in 0..limit + 5 {
            now += cadence;
            spoken.extend(texts(&controller.poll(now)));
        }

        // Pool lines plus the blank spacer and the interrupt instruction.
        assert_eq!(spoken.len(), limit + 2);
        assert_eq!(spoken.last().map(String::as_str), Some(commands::INTERRUPT_HINT));
        assert_eq!(controller.mode(), ControllerMode::Autonomous);
        assert!(controller.submit("help", now + 1).is_empty());
    }

    #[test]
    fn interrupt_escapes_and_later_ticks_stay_dead() {
        let mut controller = controller();
        controller.boot(0);
        trap(&mut controller, 0);

        let events = controller.interrupt(100);
        assert_eq!(controller.state().curse, CurseMeter::new(75));
        assert_eq!(controller.state().phase, Phase::Hostile);
        assert_eq!(controller.mode(), ControllerMode::Idle);
        assert!(texts(&events).iter().any(|l| l.contains("PARTIAL SUCCESS")));

        // The ticker was cancelled with the escape; only cosmetic
        // manifestation timers remain, and those never speak.
        assert!(texts(&controller.poll(u64::MAX)).is_empty());
    }

    #[test]
    fn interrupt_outside_autonomous_mode_is_inert() {
        let mut controller = controller();
        controller.boot(0);
        controller.submit("ping", 0);
        let before = controller.state().clone();

        assert!(controller.interrupt(50).is_empty());
        assert_eq!(controller.state(), &before);
    }

    #[test]
    fn reset_cancels_outstanding_timers() {
        let mut controller = controller();
        controller.boot(0);
        trap(&mut controller, 0);
        assert!(controller.next_deadline().is_some());

        let events = controller.reset(10);
        assert!(events.contains(&TerminalEvent::Clear));
        assert_eq!(controller.next_deadline(), None);
        assert_eq!(controller.state().curse.value(), 0);
        assert_eq!(controller.mode(), ControllerMode::Idle);
    }

    #[test]
    fn snapshots_survive_a_controller_restart() {
        let dir = tempdir().expect("tmpdir");

        let mut first = SessionController::with_rng(
            EngineConfig::default(),
            Some(SnapshotStore::open(dir.path()).expect("open")),
            StdRng::seed_from_u64(3),
        );
        first.boot(0);
        first.submit("theme amber", 0);
        first.submit("ping", 0);
        let saved_curse = first.state().curse;

        let mut second = SessionController::with_rng(
            EngineConfig::default(),
            Some(SnapshotStore::open(dir.path()).expect("open")),
            StdRng::seed_from_u64(4),
        );
        second.boot(1_000);

        assert_eq!(second.state().session_count, 2);
        assert_eq!(second.state().theme, Theme::Amber);
        assert_eq!(second.state().curse, saved_curse);
    }

    #[test]
    fn manifestation_poll_rearms_without_touching_curse() {
        let mut controller = controller();
        controller.boot(0);
        // Raise past the glitch threshold.
        while controller.state().curse.value() <= 25 {
            controller.submit("greet", 0);
        }
        let curse_before = controller.state().curse;

        let deadline = controller.next_deadline().expect("manifest timer armed");
        controller.poll(deadline);
        assert_eq!(controller.state().curse, curse_before);
        assert!(controller.next_deadline().is_some());
    }
}
