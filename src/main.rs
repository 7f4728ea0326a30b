/// Entry point and frame loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use config::GameConfig;
use sim::event::GameEvent;
use sim::level::load_levels;
use sim::session::{GameSession, Phase};
use ui::input::{InputState, MenuCommand};
use ui::renderer::Renderer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = GameConfig::load();
    let templates = load_levels(&config)?;
    log::info!("{} levels loaded", templates.len());

    let mut session = GameSession::new(templates, config.physics.clone());
    let mut renderer = Renderer::new();
    renderer.init()?;

    let result = game_loop(&mut session, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    result?;

    let cleared = session.progress().completed.len();
    println!();
    println!("Thanks for playing Ruin Runner!");
    println!("Chambers cleared: {cleared}/{}", session.templates().len());
    Ok(())
}

fn game_loop(
    session: &mut GameSession,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.reports_key_release();
    let frame = Duration::from_millis(config.frame_ms);
    let mut map_cursor: usize = 0;
    let mut last_frame = Instant::now();

    loop {
        kb.drain_events();
        if kb.ctrl_c_pressed() {
            break;
        }

        let now = Instant::now();
        let dt_ms = now.duration_since(last_frame).as_secs_f32() * 1000.0;
        last_frame = now;

        if session.phase() == Phase::Running {
            let events = session.tick(kb.frame_input(), dt_ms);
            log_events(&events);
            if session.phase() == Phase::Map {
                map_cursor = session.progress().unlocked_up_to;
            }
        } else if let Some(cmd) = kb.menu_command() {
            if handle_menu(session, cmd, &mut map_cursor) {
                break;
            }
        }

        renderer.render(session, map_cursor)?;

        let spent = last_frame.elapsed();
        if spent < frame {
            std::thread::sleep(frame - spent);
        }
    }

    Ok(())
}

/// Screen navigation outside a run. Returns true to quit.
fn handle_menu(session: &mut GameSession, cmd: MenuCommand, map_cursor: &mut usize) -> bool {
    let outcome = match (session.phase(), cmd) {
        (_, MenuCommand::Quit) => return true,

        (Phase::Menu, MenuCommand::Confirm) => {
            *map_cursor = session.progress().unlocked_up_to;
            session.open_map()
        }
        (Phase::Menu, MenuCommand::Back) => return true,

        (Phase::Map, MenuCommand::Up) => {
            *map_cursor = map_cursor.saturating_sub(1);
            Ok(())
        }
        (Phase::Map, MenuCommand::Down) => {
            let last = session.templates().len().saturating_sub(1);
            *map_cursor = (*map_cursor + 1).min(last);
            Ok(())
        }
        (Phase::Map, MenuCommand::Confirm) => session.select_level(*map_cursor),

        (Phase::Result, MenuCommand::Retry) => session.retry(),
        (Phase::Result, MenuCommand::Confirm | MenuCommand::Back) => {
            *map_cursor = session.progress().unlocked_up_to;
            session.open_map()
        }

        _ => Ok(()),
    };

    if let Err(e) = outcome {
        log::debug!("ignored {cmd:?}: {e}");
    }
    false
}

fn log_events(events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::RunWon { .. } | GameEvent::RunLost { .. } => log::info!("{event:?}"),
            _ => log::debug!("{event:?}"),
        }
    }
}
