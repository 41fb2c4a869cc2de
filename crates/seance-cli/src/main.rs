use std::env;
use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;

use crossterm::cursor::MoveToColumn;
use crossterm::event;
use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use crossterm::execute;
use crossterm::style::Attribute;
use crossterm::style::Color;
use crossterm::style::Print;
use crossterm::style::ResetColor;
use crossterm::style::SetAttribute;
use crossterm::style::SetForegroundColor;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::Clear;
use crossterm::terminal::ClearType;

use rand::rngs::StdRng;
use rand::SeedableRng;

use seance_core::config::EngineConfig;
use seance_core::persistence::SnapshotStore;
use seance_core::state::LineKind;
use seance_core::state::SessionState;
use seance_core::state::Theme;
use seance_runtime::controller::ControllerMode;
use seance_runtime::controller::SessionController;
use seance_runtime::controller::TerminalEvent;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut state_dir = None;
    let mut config_path = None;
    let mut seed = None;
    let mut ephemeral = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            "--version" | "-V" | "version" => {
                println!("seance {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--state-dir" => {
                let Some(value) = args.next() else {
                    return Err("--state-dir requires a path".into());
                };
                state_dir = Some(PathBuf::from(value));
            }
            "--config" => {
                let Some(value) = args.next() else {
                    return Err("--config requires a path".into());
                };
                config_path = Some(PathBuf::from(value));
            }
            "--seed" => {
                let Some(value) = args.next() else {
                    return Err("--seed requires a number".into());
                };
                seed = Some(value.parse::<u64>().map_err(|_| "--seed requires a number")?);
            }
            "--ephemeral" => {
                ephemeral = true;
            }
            other => {
                print_help();
                return Err(format!("unsupported argument: {other}").into());
            }
        }
    }

    let config = match &config_path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let store = if ephemeral {
        None
    } else {
        // A store that cannot be opened degrades to an in-memory session.
        resolve_state_dir(state_dir).and_then(|dir| SnapshotStore::open(dir).ok())
    };

    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let controller = SessionController::with_rng(config, store, rng);

    interactive(controller)
}

fn resolve_state_dir(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| dirs::data_dir().map(|dir| dir.join("seance")))
}

fn print_help() {
    println!("seance - a cursed terminal session");
    println!();
    println!("Usage: seance [options]");
    println!();
    println!("Options:");
    println!("  --state-dir <path>  Where the session snapshot lives");
    println!("  --config <path>     YAML tuning overrides");
    println!("  --seed <n>          Seed the randomness (for demos)");
    println!("  --ephemeral         Skip persistence entirely");
    println!();
    println!("Inside the session: Ctrl+C interrupts, Ctrl+R resets,");
    println!("Ctrl+Q quits.");
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

fn interactive(mut controller: SessionController) -> Result<(), Box<dyn std::error::Error>> {
    let _guard = RawModeGuard::enter()?;
    let started = Instant::now();
    let now_ms = move || started.elapsed().as_millis() as u64;

    let mut stdout = io::stdout();
    let mut input = String::new();

    let events = controller.boot(now_ms());
    play(&mut stdout, &controller, &events)?;
    draw_prompt(&mut stdout, &controller, &input)?;
    let mut last_mode = controller.mode();

    loop {
        let timer_events = controller.poll(now_ms());
        if !timer_events.is_empty() || controller.mode() != last_mode {
            clear_prompt(&mut stdout)?;
            play(&mut stdout, &controller, &timer_events)?;
            draw_prompt(&mut stdout, &controller, &input)?;
        }
        last_mode = controller.mode();

        // Wake for keys, or in time for the next scheduled timer.
        let wait = controller
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(now_ms()).min(100))
            .unwrap_or(100);
        if !event::poll(Duration::from_millis(wait))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind == KeyEventKind::Release {
            continue;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => {
                    let events = controller.interrupt(now_ms());
                    if !events.is_empty() {
                        clear_prompt(&mut stdout)?;
                        play(&mut stdout, &controller, &events)?;
                        draw_prompt(&mut stdout, &controller, &input)?;
                    }
                    continue;
                }
                KeyCode::Char('r') => {
                    input.clear();
                    let events = controller.reset(now_ms());
                    clear_prompt(&mut stdout)?;
                    play(&mut stdout, &controller, &events)?;
                    draw_prompt(&mut stdout, &controller, &input)?;
                    continue;
                }
                KeyCode::Char('q') => break,
                _ => continue,
            }
        }

        // Ordinary typing is rejected wholesale while the board is locked.
        if controller.mode() != ControllerMode::Idle {
            continue;
        }

        match key.code {
            KeyCode::Enter => {
                let submitted = std::mem::take(&mut input);
                let events = controller.submit(&submitted, now_ms());
                clear_prompt(&mut stdout)?;
                if !events.is_empty() {
                    play(&mut stdout, &controller, &events)?;
                    print_status(&mut stdout, controller.state())?;
                }
                draw_prompt(&mut stdout, &controller, &input)?;
            }
            KeyCode::Backspace => {
                if input.pop().is_some() {
                    clear_prompt(&mut stdout)?;
                    draw_prompt(&mut stdout, &controller, &input)?;
                }
            }
            KeyCode::Char(c) => {
                input.push(c);
                execute!(stdout, Print(c))?;
                stdout.flush()?;
            }
            _ => {}
        }
    }

    Ok(())
}

fn theme_color(theme: Theme) -> Color {
    match theme {
        Theme::Green => Color::Green,
        Theme::Red => Color::Red,
        Theme::Blue => Color::Blue,
        Theme::Amber => Color::Yellow,
    }
}

fn play(
    stdout: &mut io::Stdout,
    controller: &SessionController,
    events: &[TerminalEvent],
) -> io::Result<()> {
    let color = theme_color(controller.theme());
    for event in events {
        match event {
            TerminalEvent::Line {
                line,
                pause_before_ms,
            } => {
                if *pause_before_ms > 0 {
                    std::thread::sleep(Duration::from_millis(*pause_before_ms));
                }
                match line.kind {
                    LineKind::Command => execute!(
                        stdout,
                        SetForegroundColor(color),
                        SetAttribute(Attribute::Bold),
                        Print(&line.text),
                        SetAttribute(Attribute::Reset),
                        ResetColor,
                        Print("\r\n"),
                    )?,
                    LineKind::System => execute!(
                        stdout,
                        SetForegroundColor(color),
                        Print(&line.text),
                        ResetColor,
                        Print("\r\n"),
                    )?,
                    LineKind::Corrupted => execute!(
                        stdout,
                        SetForegroundColor(Color::DarkRed),
                        SetAttribute(Attribute::Bold),
                        Print(&line.text),
                        SetAttribute(Attribute::Reset),
                        ResetColor,
                        Print("\r\n"),
                    )?,
                }
            }
            TerminalEvent::Clear => {
                execute!(stdout, Clear(ClearType::All), crossterm::cursor::MoveTo(0, 0))?;
            }
            // Pulses belong to richer presentation layers; a line terminal
            // has nowhere to flash them.
            TerminalEvent::Pulse(_) => {}
        }
    }
    stdout.flush()
}

fn print_status(stdout: &mut io::Stdout, state: &SessionState) -> io::Result<()> {
    let mut status = format!(
        "SESSION #{} | PHASE {}/5 | THEME: {}",
        state.session_count,
        state.phase.index(),
        state.theme.label().to_uppercase()
    );
    if !state.user_name.is_empty() {
        status.push_str(&format!(" | USER: {}", state.user_name));
    }
    status.push_str(&format!(" | COMMANDS: {}", state.distinct_commands()));
    if state.terminal_locked {
        status.push_str(" | LOCKED");
    }
    status.push_str(&format!(" | CURSE: {}%", state.curse.value()));
    if let Some(tag) = state.phase.tier_tag() {
        status.push(' ');
        status.push_str(tag);
    }

    execute!(
        stdout,
        SetForegroundColor(Color::DarkGrey),
        Print(status),
        ResetColor,
        Print("\r\n"),
    )
}

fn draw_prompt(
    stdout: &mut io::Stdout,
    controller: &SessionController,
    input: &str,
) -> io::Result<()> {
    let color = theme_color(controller.theme());
    let marker = match controller.mode() {
        ControllerMode::Idle => "> ",
        ControllerMode::Locked => "⚠ TERMINAL LOCKED ",
        ControllerMode::Autonomous => "⚠⚠⚠ AUTONOMOUS ",
    };
    execute!(
        stdout,
        SetForegroundColor(color),
        Print(marker),
        Print(input),
        ResetColor,
    )?;
    stdout.flush()
}

fn clear_prompt(stdout: &mut io::Stdout) -> io::Result<()> {
    execute!(stdout, Clear(ClearType::CurrentLine), MoveToColumn(0))
}
