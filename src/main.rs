//! EXPERTRIS - terminal front end
//!
//! Draws the session snapshot, maps keys to commands and turns events into
//! beeps and feedback messages.

mod audio;
mod input;
mod ui;

use anyhow::{Context, Result};
use audio::{AudioManager, Beep};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use expertris::settings::Settings;
use expertris::{Command, GameEvent, Session};
use input::{InputAction, InputHandler};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io::{self, stdout},
    path::PathBuf,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

/// Target frame rate
const TARGET_FPS: u64 = 60;
const FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / TARGET_FPS);

/// How long a feedback message stays in the message bar
const MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Get the expertris temp directory, creating it if needed
fn expertris_temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join("expertris");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

fn main() -> Result<()> {
    // Generate session ID for this instance
    let session_id: u32 = rand::random();

    let log_dir = expertris_temp_dir();
    let log_file = format!("{:08x}.log", session_id);

    // Setup tracing to log file
    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(
                    "expertris=debug"
                        .parse::<tracing_subscriber::filter::Directive>()
                        .context("invalid log directive")?,
                ),
        )
        .with_ansi(false)
        .init();

    info!(
        "EXPERTRIS starting up, session={:08x}, log={}",
        session_id,
        log_dir.join(&log_file).display()
    );

    let mut settings = Settings::load();

    // Audio is optional, the game works without it
    let mut audio = if settings.audio.enabled {
        AudioManager::new()
    } else {
        None
    };
    if let Some(a) = audio.as_mut() {
        a.set_volume(settings.audio.volume as f32 / 100.0);
    }

    // Setup terminal
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut settings, &audio);

    // Restore terminal
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;

    // Save settings (including any new high scores)
    if let Err(e) = settings.save() {
        warn!("could not save settings: {:#}", e);
        eprintln!("Warning: Could not save settings: {:#}", e);
    }

    let session = result?;
    let engine = session.engine();
    println!("\nThanks for playing EXPERTRIS!");
    println!("Mode: {}", session.rules().mode.name());
    println!("Final Score: {}", engine.score());
    println!("Level: {} | Lines: {}", engine.level(), engine.lines());
    println!(
        "Expert Points: {} | Efficiency: {}%",
        engine.expert_points(),
        engine.efficiency()
    );
    if let Some(best) = settings.best(session.rules().mode) {
        println!("Best: {}", best);
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    settings: &mut Settings,
    audio: &Option<AudioManager>,
) -> io::Result<Session> {
    let mode = settings.gameplay.rules.mode;
    let mut session = Session::new(settings.gameplay.rules.clone());
    session.set_personal_best(settings.best(mode).unwrap_or(0));
    let mut input = InputHandler::from_settings(settings);
    let mut message: Option<(String, Instant)> = None;

    let play = |beep: Option<Beep>| {
        if let (Some(audio), Some(beep)) = (audio, beep) {
            audio.play(beep);
        }
    };

    loop {
        let snapshot = session.snapshot();
        let shown = message.as_ref().map(|(text, _)| text.as_str());
        terminal.draw(|frame| ui::render_game(frame, &snapshot, settings, shown))?;

        // Wake up for whichever comes first: the next frame or the gravity tick
        let now = Instant::now();
        let timeout = session
            .time_until_tick(now)
            .map_or(FRAME_DURATION, |d| d.min(FRAME_DURATION));

        let mut commands: Vec<Command> = Vec::new();
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.kind {
                    KeyEventKind::Release => input.key_up(key),
                    _ => match input.key_down(key, Instant::now()) {
                        Some(InputAction::Quit) => return Ok(session),
                        Some(InputAction::Game(command)) => commands.push(command),
                        None => {}
                    },
                }
            }
        }
        commands.extend(input.update(Instant::now()));

        for command in commands {
            match session.apply(command) {
                Ok(()) => {
                    play(Beep::for_command(command));
                    if matches!(command, Command::PauseToggle | Command::Reset) {
                        input.clear();
                    }
                }
                Err(e) => {
                    debug!("{:?} rejected: {}", command, e);
                    // Blocked moves are routine, only surface the rest
                    if !matches!(
                        command,
                        Command::MoveLeft | Command::MoveRight | Command::SoftDrop | Command::Rotate
                    ) {
                        message = Some((e.to_string(), Instant::now()));
                    }
                }
            }
        }

        session.update(Instant::now());

        for event in session.drain_events() {
            play(Beep::for_event(&event));
            if let GameEvent::GameOver(score) = event {
                let engine = session.engine();
                settings.add_score(mode, score, engine.lines(), engine.level(), engine.expert_points());
                match serde_json::to_string(&engine.report()) {
                    Ok(json) => info!("final stats: {}", json),
                    Err(e) => warn!("could not encode final stats: {}", e),
                }
            }
            if let Some(text) = ui::describe_event(&event) {
                message = Some((text, Instant::now()));
            }
        }

        if message
            .as_ref()
            .is_some_and(|(_, shown_at)| shown_at.elapsed() > MESSAGE_TTL)
        {
            message = None;
        }
    }
}
