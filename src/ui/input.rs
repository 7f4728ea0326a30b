/// Keyboard input: held keys and fresh presses, folded into `FrameInput`.
///
/// Movement is level-triggered (held), jump and action are edge-triggered
/// (fresh press only). Terminals that report key releases get exact hold
/// tracking; the rest fall back to a short timeout after the last repeat.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::FrameInput;

/// A key with no Press/Repeat for this long counts as released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_JUMP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W'), KeyCode::Char(' ')];
const KEYS_ACTION: &[KeyCode] = &[KeyCode::Char('e'), KeyCode::Char('E'), KeyCode::Enter];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_MAP: &[KeyCode] = &[KeyCode::Char('m'), KeyCode::Char('M'), KeyCode::Esc];

const KEYS_MENU_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_MENU_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

/// Navigation intent on the menu, map and result screens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuCommand {
    Up,
    Down,
    Confirm,
    Retry,
    Back,
    Quit,
}

pub struct InputState {
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from released to held during the last drain.
    fresh_presses: Vec<KeyCode>,
    raw_events: Vec<KeyEvent>,
    /// Set once the terminal confirmed it reports Release events.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Read every pending terminal event without blocking. Once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while event::poll(Duration::ZERO).unwrap_or(false) {
            let Ok(Event::Key(key)) = event::read() else { continue };
            self.raw_events.push(key);
            self.record(key, Instant::now());
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn record(&mut self, key: KeyEvent, now: Instant) {
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        })
    }

    /// Simulation input for this frame.
    pub fn frame_input(&self) -> FrameInput {
        FrameInput {
            move_left: self.any_held(KEYS_LEFT) || self.any_pressed(KEYS_LEFT),
            move_right: self.any_held(KEYS_RIGHT) || self.any_pressed(KEYS_RIGHT),
            jump_pressed: self.any_pressed(KEYS_JUMP),
            action_pressed: self.any_pressed(KEYS_ACTION),
            restart_pressed: self.any_pressed(KEYS_RESTART),
            map_pressed: self.any_pressed(KEYS_MAP),
        }
    }

    /// First screen-navigation command pressed this frame.
    pub fn menu_command(&self) -> Option<MenuCommand> {
        if self.any_pressed(KEYS_MENU_UP) {
            Some(MenuCommand::Up)
        } else if self.any_pressed(KEYS_MENU_DOWN) {
            Some(MenuCommand::Down)
        } else if self.any_pressed(KEYS_CONFIRM) {
            Some(MenuCommand::Confirm)
        } else if self.any_pressed(KEYS_RESTART) {
            Some(MenuCommand::Retry)
        } else if self.any_pressed(KEYS_MAP) {
            Some(MenuCommand::Back)
        } else if self.any_pressed(KEYS_QUIT) {
            Some(MenuCommand::Quit)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Release)
    }

    #[test]
    fn jump_is_an_edge_but_movement_is_held() {
        let mut kb = InputState::new();
        kb.record(press(KeyCode::Right), Instant::now());
        kb.record(press(KeyCode::Char(' ')), Instant::now());
        let first = kb.frame_input();
        assert!(first.move_right && first.jump_pressed);

        // Next frame: both keys still held, nothing fresh.
        kb.fresh_presses.clear();
        kb.record(press(KeyCode::Right), Instant::now());
        kb.record(press(KeyCode::Char(' ')), Instant::now());
        let second = kb.frame_input();
        assert!(second.move_right);
        assert!(!second.jump_pressed);
    }

    #[test]
    fn release_is_ignored_until_honored() {
        let mut kb = InputState::new();
        kb.record(press(KeyCode::Left), Instant::now());
        kb.record(release(KeyCode::Left), Instant::now());
        assert!(kb.is_held(KeyCode::Left));

        kb.honor_release = true;
        kb.record(release(KeyCode::Left), Instant::now());
        assert!(!kb.is_held(KeyCode::Left));
    }

    #[test]
    fn escape_maps_to_back_and_map() {
        let mut kb = InputState::new();
        kb.record(press(KeyCode::Esc), Instant::now());
        assert!(kb.frame_input().map_pressed);
        assert_eq!(kb.menu_command(), Some(MenuCommand::Back));
    }
}
