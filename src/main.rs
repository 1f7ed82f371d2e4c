/// Entry point and game loop.

mod ui;

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use mazechase::config::GameConfig;
use mazechase::domain::entity::{FrameInput, Heading};
use mazechase::sim::event::GameEvent;
use mazechase::sim::level;
use mazechase::sim::step;
use mazechase::sim::world::WorldState;
use ui::input::InputState;
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    // Reported before raw mode so the message stays on screen.
    let (config, config_err) = GameConfig::load();
    if let Some(e) = &config_err {
        eprintln!("Warning: {e}; using defaults");
    }
    init_logging(&config);
    if let Some(e) = config_err {
        warn!("config fallback to defaults: {e}");
    }

    let mut world = match level::new_session(&config, level::session_rng(&config.general)) {
        Ok(w) => w,
        Err(e) => {
            error!("maze generation failed: {e}");
            eprintln!("Could not build maze: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Final Score: {}", world.score);
}

/// The terminal is in raw mode while playing, so logs go to a file.
/// `RUST_LOG` overrides the default `info` filter.
fn init_logging(config: &GameConfig) {
    let file = match File::create(&config.general.log_file) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: could not open log file {}: {e}", config.general.log_file.display());
            return;
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms.max(1));
    let dt = tick_rate.as_secs_f32();

    // Turns pressed between ticks are held for the next tick.
    let mut pending_turn: Option<Heading> = None;

    loop {
        kb.drain_events();

        if kb.quit_requested() {
            break;
        }
        if handle_meta(world, renderer, &kb, config)? {
            continue;
        }
        if let Some(turn) = kb.frame_input().turn {
            pending_turn = Some(turn);
        }

        if last_tick.elapsed() >= tick_rate {
            let input = FrameInput { turn: pending_turn.take() };
            let events = step::step(world, input, dt);
            process_events(world, &events);
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Pause, path overlay and restart. Returns true when the frame's input
/// was consumed by a restart.
fn handle_meta(
    world: &mut WorldState,
    renderer: &mut Renderer,
    kb: &InputState,
    config: &GameConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    if kb.was_pressed(KeyCode::Char('p')) && !world.is_over() {
        world.paused = !world.paused;
    }
    if kb.was_pressed(KeyCode::Char('v')) {
        renderer.show_paths = !renderer.show_paths;
    }
    if kb.was_pressed(KeyCode::Char('r')) && world.is_over() {
        info!("starting a new maze");
        *world = level::new_session(config, level::session_rng(&config.general))?;
        return Ok(true);
    }
    Ok(false)
}

fn process_events(world: &mut WorldState, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::PlayerKilled { by } => {
                let msg = format!("Caught by pursuer #{by}!");
                world.set_message(&msg, 2.0);
            }
            GameEvent::Respawned => {
                let msg = format!("{} lives left", world.lives);
                world.set_message(&msg, 2.0);
            }
            GameEvent::PursuerStateChanged { id, from, to } => {
                tracing::debug!(pursuer = id, ?from, ?to, "pursuer state");
            }
            GameEvent::CountdownFinished
            | GameEvent::PickupConsumed { .. }
            | GameEvent::GameOver
            | GameEvent::Won => {}
        }
    }
}
