//! Input handling with DAS (Delayed Auto Shift) and ARR (Auto Repeat Rate)
//!
//! Uses a polling-based approach that doesn't rely on key release events,
//! which are unreliable on Linux terminals.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, ModifierKeyCode};
use expertris::Command;
use expertris::settings::Settings;
use std::time::{Duration, Instant};
use tracing::warn;

/// Time after which we consider a key "released" if no repeat received
const KEY_TIMEOUT: Duration = Duration::from_millis(100);

/// What a key press asks the host to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Game(Command),
    Quit,
}

/// Keys that auto-repeat while held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Held {
    Left,
    Right,
    Down,
}

impl Held {
    fn command(self) -> Command {
        match self {
            Held::Left => Command::MoveLeft,
            Held::Right => Command::MoveRight,
            Held::Down => Command::SoftDrop,
        }
    }
}

#[derive(Debug, Clone)]
struct KeyPressState {
    key: Held,
    first_press: Instant,
    last_seen: Instant,
    das_triggered: bool,
    last_arr: Option<Instant>,
}

/// Key bindings configuration - supports multiple keys per action
#[derive(Debug, Clone)]
pub struct KeyBindings {
    /// Parsed bindings, checked in order
    bindings: Vec<(Vec<KeyCode>, InputAction)>,
}

impl KeyBindings {
    /// Parse a key string into KeyCode
    fn parse_key(s: &str) -> Option<KeyCode> {
        let lower = s.to_lowercase();
        let code = match lower.as_str() {
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "space" => KeyCode::Char(' '),
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "esc" | "escape" => KeyCode::Esc,
            "backspace" => KeyCode::Backspace,
            "shift" => KeyCode::Modifier(ModifierKeyCode::LeftShift),
            "ctrl" | "control" => KeyCode::Modifier(ModifierKeyCode::LeftControl),
            "alt" => KeyCode::Modifier(ModifierKeyCode::LeftAlt),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => {
                        warn!("unknown key binding {:?}", s);
                        return None;
                    }
                }
            }
        };
        Some(code)
    }

    /// Parse a list of key strings into KeyCodes
    fn parse_keys(keys: &[String]) -> Vec<KeyCode> {
        keys.iter().filter_map(|s| Self::parse_key(s)).collect()
    }

    /// Create keybindings from settings
    pub fn from_settings(settings: &Settings) -> Self {
        let keys = &settings.keys;
        let game = |list: &[String], command| (Self::parse_keys(list), InputAction::Game(command));
        Self {
            bindings: vec![
                game(&keys.move_left, Command::MoveLeft),
                game(&keys.move_right, Command::MoveRight),
                game(&keys.soft_drop, Command::SoftDrop),
                game(&keys.hard_drop, Command::HardDrop),
                game(&keys.rotate, Command::Rotate),
                game(&keys.pause, Command::PauseToggle),
                game(&keys.start, Command::Start),
                game(&keys.reset, Command::Reset),
                game(&keys.transfer_to_reserve, Command::TransferToReserve),
                game(&keys.use_reserve, Command::UseReserve),
                game(&keys.generate_next, Command::GenerateNext),
                game(&keys.show_stats, Command::ShowStats),
                game(&keys.optimize_queue, Command::OptimizeQueue),
                game(&keys.suggest, Command::Suggest),
                (Self::parse_keys(&keys.quit), InputAction::Quit),
            ],
        }
    }

    fn lookup(&self, code: KeyCode) -> Option<InputAction> {
        self.bindings
            .iter()
            .find(|(codes, _)| codes.contains(&code))
            .map(|(_, action)| *action)
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Input handler with DAS/ARR support
pub struct InputHandler {
    /// Horizontal movement, at most one direction at a time
    horizontal: Option<KeyPressState>,
    down: Option<KeyPressState>,
    /// Key bindings
    bindings: KeyBindings,
    /// DAS duration
    das: Duration,
    /// ARR duration
    arr: Duration,
}

impl InputHandler {
    /// Create input handler from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            horizontal: None,
            down: None,
            bindings: KeyBindings::from_settings(settings),
            das: Duration::from_millis(settings.gameplay.das_ms),
            arr: Duration::from_millis(settings.gameplay.arr_ms),
        }
    }

    /// Handle a key press event - returns the immediate action
    pub fn key_down(&mut self, key: KeyEvent, now: Instant) -> Option<InputAction> {
        // Handle Ctrl+C for quit
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(InputAction::Quit);
        }

        let action = self.bindings.lookup(normalize_key(key.code))?;
        let held = match action {
            InputAction::Game(Command::MoveLeft) => Held::Left,
            InputAction::Game(Command::MoveRight) => Held::Right,
            InputAction::Game(Command::SoftDrop) => Held::Down,
            other => return Some(other),
        };

        let slot = if held == Held::Down {
            &mut self.down
        } else {
            &mut self.horizontal
        };
        // Key repeat from the terminal while DAS is charging
        if let Some(state) = slot.as_mut().filter(|state| state.key == held) {
            state.last_seen = now;
            return None;
        }

        // New press, or a switch of direction
        *slot = Some(KeyPressState {
            key: held,
            first_press: now,
            last_seen: now,
            das_triggered: false,
            last_arr: None,
        });
        Some(action)
    }

    /// Handle a key release event (may not be called on Linux)
    pub fn key_up(&mut self, key: KeyEvent) {
        match self.bindings.lookup(normalize_key(key.code)) {
            Some(InputAction::Game(Command::MoveLeft | Command::MoveRight)) => self.horizontal = None,
            Some(InputAction::Game(Command::SoftDrop)) => self.down = None,
            _ => {}
        }
    }

    /// Update held keys and return repeat commands (call every frame)
    pub fn update(&mut self, now: Instant) -> Vec<Command> {
        let (das, arr) = (self.das, self.arr);
        let mut commands = Vec::new();

        for slot in [&mut self.horizontal, &mut self.down] {
            // No recent key event means the key was released
            if slot
                .as_ref()
                .is_some_and(|state| now.duration_since(state.last_seen) > KEY_TIMEOUT)
            {
                *slot = None;
            }
            if let Some(state) = slot {
                if process_das_arr(state, now, das, arr) {
                    commands.push(state.key.command());
                }
            }
        }

        commands
    }

    /// Clear all held keys (useful for pause/resume)
    pub fn clear(&mut self) {
        self.horizontal = None;
        self.down = None;
    }
}

/// Process DAS/ARR logic for a key state, returns true if should trigger action
fn process_das_arr(state: &mut KeyPressState, now: Instant, das: Duration, arr: Duration) -> bool {
    let held_duration = now.duration_since(state.first_press);

    if held_duration >= das {
        if !state.das_triggered {
            // First trigger after DAS
            state.das_triggered = true;
            state.last_arr = Some(now);
            return true;
        } else if let Some(last) = state.last_arr {
            // Subsequent ARR triggers
            if now.duration_since(last) >= arr {
                state.last_arr = Some(now);
                return true;
            }
        }
    }

    false
}

/// Normalize key codes for consistent handling
fn normalize_key(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn handler() -> InputHandler {
        InputHandler::from_settings(&Settings::default())
    }

    #[test]
    fn test_default_bindings() {
        let bindings = KeyBindings::default();
        assert_eq!(
            bindings.lookup(KeyCode::Char('c')),
            Some(InputAction::Game(Command::TransferToReserve))
        );
        assert_eq!(
            bindings.lookup(KeyCode::Char(' ')),
            Some(InputAction::Game(Command::HardDrop))
        );
        assert_eq!(bindings.lookup(KeyCode::Char('q')), Some(InputAction::Quit));
        assert_eq!(bindings.lookup(KeyCode::F(5)), None);
    }

    #[test]
    fn test_unknown_key_names_are_skipped() {
        assert_eq!(KeyBindings::parse_key("Space"), Some(KeyCode::Char(' ')));
        assert_eq!(KeyBindings::parse_key("X"), Some(KeyCode::Char('x')));
        assert_eq!(KeyBindings::parse_key("hyper"), None);
    }

    #[test]
    fn test_uppercase_letters_match() {
        let mut input = handler();
        let now = Instant::now();
        assert_eq!(
            input.key_down(press(KeyCode::Char('G')), now),
            Some(InputAction::Game(Command::GenerateNext))
        );
    }

    #[test]
    fn test_das_then_arr() {
        let mut input = handler();
        let t0 = Instant::now();
        assert_eq!(
            input.key_down(press(KeyCode::Left), t0),
            Some(InputAction::Game(Command::MoveLeft))
        );
        // Terminal repeats keep the key alive without extra moves
        let t1 = t0 + Duration::from_millis(90);
        assert_eq!(input.key_down(press(KeyCode::Left), t1), None);
        assert!(input.update(t1).is_empty());

        let t2 = t0 + Duration::from_millis(170);
        input.key_down(press(KeyCode::Left), t2);
        assert_eq!(input.update(t2), vec![Command::MoveLeft]);
        assert!(input.update(t2 + Duration::from_millis(20)).is_empty());
        assert_eq!(
            input.update(t2 + Duration::from_millis(50)),
            vec![Command::MoveLeft]
        );
    }

    #[test]
    fn test_key_times_out() {
        let mut input = handler();
        let t0 = Instant::now();
        input.key_down(press(KeyCode::Down), t0);
        assert!(input.update(t0 + Duration::from_millis(500)).is_empty());
    }

    #[test]
    fn test_switching_direction_moves_immediately() {
        let mut input = handler();
        let t0 = Instant::now();
        input.key_down(press(KeyCode::Left), t0);
        assert_eq!(
            input.key_down(press(KeyCode::Right), t0),
            Some(InputAction::Game(Command::MoveRight))
        );
    }
}
