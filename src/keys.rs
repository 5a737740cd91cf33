//! Keyboard handling: turns crossterm key events into engine input
//!
//! Terminals that support the kitty keyboard protocol report key releases, so
//! held keys are tracked exactly. Elsewhere (most Linux terminals) a held key
//! shows up as a stream of auto-repeated presses, and a key is considered
//! released once no press has been seen for a short while.

use crossterm::event::{KeyCode, ModifierKeyCode};
use std::time::{Duration, Instant};
use tetrion::input::{InputSnapshot, Key, KeyEvent};
use tetrion::settings;

/// Time after which we consider a key "released" if no repeat received
const KEY_TIMEOUT: Duration = Duration::from_millis(100);

/// Front-end commands that never reach the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pause,
    Restart,
    Quit,
}

/// Key bindings configuration - supports multiple keys per action
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub move_left: Vec<KeyCode>,
    pub move_right: Vec<KeyCode>,
    pub soft_drop: Vec<KeyCode>,
    pub hard_drop: Vec<KeyCode>,
    pub rotate: Vec<KeyCode>,
    pub hold: Vec<KeyCode>,
    pub pause: Vec<KeyCode>,
    pub restart: Vec<KeyCode>,
    pub quit: Vec<KeyCode>,
}

impl KeyBindings {
    /// Parse a key name such as "Left", "Space" or "x"
    fn parse_key(s: &str) -> Option<KeyCode> {
        let code = match s.to_lowercase().as_str() {
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "space" => KeyCode::Char(' '),
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "esc" | "escape" => KeyCode::Esc,
            "shift" => KeyCode::Modifier(ModifierKeyCode::LeftShift),
            "ctrl" | "control" => KeyCode::Modifier(ModifierKeyCode::LeftControl),
            "alt" => KeyCode::Modifier(ModifierKeyCode::LeftAlt),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => {
                        tracing::warn!("ignoring unknown key name {:?}", s);
                        return None;
                    }
                }
            }
        };
        Some(code)
    }

    fn parse_keys(keys: &[String]) -> Vec<KeyCode> {
        keys.iter().filter_map(|s| Self::parse_key(s)).collect()
    }

    /// Create keybindings from settings
    pub fn from_settings(keys: &settings::KeyBindings) -> Self {
        Self {
            move_left: Self::parse_keys(&keys.move_left),
            move_right: Self::parse_keys(&keys.move_right),
            soft_drop: Self::parse_keys(&keys.soft_drop),
            hard_drop: Self::parse_keys(&keys.hard_drop),
            rotate: Self::parse_keys(&keys.rotate),
            hold: Self::parse_keys(&keys.hold),
            pause: Self::parse_keys(&keys.pause),
            restart: Self::parse_keys(&keys.restart),
            quit: Self::parse_keys(&keys.quit),
        }
    }

    /// Engine key bound to `code`, if any
    pub fn game_key(&self, code: KeyCode) -> Option<Key> {
        let code = normalize_key(code);
        [
            (&self.move_left, Key::Left),
            (&self.move_right, Key::Right),
            (&self.soft_drop, Key::SoftDrop),
            (&self.hard_drop, Key::HardDrop),
            (&self.rotate, Key::Rotate),
            (&self.hold, Key::Hold),
        ]
        .into_iter()
        .find_map(|(codes, key)| codes.contains(&code).then_some(key))
    }

    /// Front-end command bound to `code`, if any
    pub fn command(&self, code: KeyCode) -> Option<Command> {
        let code = normalize_key(code);
        if self.pause.contains(&code) {
            Some(Command::Pause)
        } else if self.restart.contains(&code) {
            Some(Command::Restart)
        } else if self.quit.contains(&code) {
            Some(Command::Quit)
        } else {
            None
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::from_settings(&settings::KeyBindings::default())
    }
}

/// Collects key transitions between frames and tracks which keys are held
#[derive(Debug)]
pub struct KeyTracker {
    bindings: KeyBindings,
    /// Whether the terminal reports key releases
    release_events: bool,
    /// Last time each holdable key was seen down
    left: Option<Instant>,
    right: Option<Instant>,
    down: Option<Instant>,
    events: Vec<KeyEvent>,
}

impl KeyTracker {
    pub fn new(bindings: KeyBindings, release_events: bool) -> Self {
        Self {
            bindings,
            release_events,
            left: None,
            right: None,
            down: None,
            events: Vec::new(),
        }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    fn held_slot(&mut self, key: Key) -> Option<&mut Option<Instant>> {
        match key {
            Key::Left => Some(&mut self.left),
            Key::Right => Some(&mut self.right),
            Key::SoftDrop => Some(&mut self.down),
            _ => None,
        }
    }

    /// Handle a key press. `repeat` marks terminal auto-repeat.
    pub fn key_down(&mut self, code: KeyCode, repeat: bool, now: Instant) {
        let Some(key) = self.bindings.game_key(code) else {
            return;
        };

        let pressed = match self.held_slot(key) {
            Some(slot) => {
                let fresh = slot.is_none();
                *slot = Some(now);
                fresh
            }
            None => !repeat,
        };
        if pressed {
            self.events.push(KeyEvent::Pressed(key));
        }
    }

    /// Handle a key release (only reported by some terminals)
    pub fn key_up(&mut self, code: KeyCode) {
        let Some(key) = self.bindings.game_key(code) else {
            return;
        };
        if let Some(slot) = self.held_slot(key) {
            if slot.take().is_some() {
                self.events.push(KeyEvent::Released(key));
            }
        }
    }

    /// Everything that happened since the last snapshot
    pub fn snapshot(&mut self, now: Instant) -> InputSnapshot {
        if !self.release_events {
            for key in [Key::Left, Key::Right, Key::SoftDrop] {
                let Some(slot) = self.held_slot(key) else {
                    continue;
                };
                if slot.is_some_and(|seen| now.duration_since(seen) > KEY_TIMEOUT) {
                    *slot = None;
                    self.events.push(KeyEvent::Released(key));
                }
            }
        }

        InputSnapshot {
            events: std::mem::take(&mut self.events),
            left_held: self.left.is_some(),
            right_held: self.right.is_some(),
        }
    }

    /// Release all held keys (useful for pause/resume)
    pub fn clear(&mut self) {
        self.events.clear();
        for key in [Key::Left, Key::Right, Key::SoftDrop] {
            if let Some(slot) = self.held_slot(key) {
                if slot.take().is_some() {
                    self.events.push(KeyEvent::Released(key));
                }
            }
        }
    }
}

/// Normalize key codes for consistent handling
fn normalize_key(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        KeyCode::Modifier(ModifierKeyCode::RightShift) => KeyCode::Modifier(ModifierKeyCode::LeftShift),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(release_events: bool) -> KeyTracker {
        KeyTracker::new(KeyBindings::default(), release_events)
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(KeyBindings::parse_key("Space"), Some(KeyCode::Char(' ')));
        assert_eq!(KeyBindings::parse_key("LEFT"), Some(KeyCode::Left));
        assert_eq!(KeyBindings::parse_key("x"), Some(KeyCode::Char('x')));
        assert_eq!(KeyBindings::parse_key("F13-ish"), None);
    }

    #[test]
    fn test_default_bindings() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.game_key(KeyCode::Up), Some(Key::Rotate));
        assert_eq!(bindings.game_key(KeyCode::Char('X')), Some(Key::Rotate));
        assert_eq!(bindings.game_key(KeyCode::Char(' ')), Some(Key::HardDrop));
        assert_eq!(bindings.command(KeyCode::Esc), Some(Command::Pause));
        assert_eq!(bindings.command(KeyCode::Char('q')), Some(Command::Quit));
        assert_eq!(bindings.game_key(KeyCode::Char('q')), None);
    }

    #[test]
    fn test_held_key_pressed_once() {
        let mut t = tracker(true);
        let now = Instant::now();
        t.key_down(KeyCode::Left, false, now);
        t.key_down(KeyCode::Left, true, now + Duration::from_millis(30));

        let snapshot = t.snapshot(now + Duration::from_millis(500));
        assert_eq!(snapshot.events, vec![KeyEvent::Pressed(Key::Left)]);
        assert!(snapshot.left_held);

        t.key_up(KeyCode::Left);
        let snapshot = t.snapshot(now + Duration::from_millis(510));
        assert_eq!(snapshot.events, vec![KeyEvent::Released(Key::Left)]);
        assert!(!snapshot.left_held);
    }

    #[test]
    fn test_timeout_releases_without_release_events() {
        let mut t = tracker(false);
        let now = Instant::now();
        t.key_down(KeyCode::Down, false, now);
        assert_eq!(t.snapshot(now + Duration::from_millis(50)).events.len(), 1);

        let snapshot = t.snapshot(now + Duration::from_millis(150));
        assert_eq!(snapshot.events, vec![KeyEvent::Released(Key::SoftDrop)]);
    }

    #[test]
    fn test_repeat_does_not_retrigger_actions() {
        let mut t = tracker(true);
        let now = Instant::now();
        t.key_down(KeyCode::Up, false, now);
        t.key_down(KeyCode::Up, true, now);
        let snapshot = t.snapshot(now);
        assert_eq!(snapshot.events, vec![KeyEvent::Pressed(Key::Rotate)]);
    }

    #[test]
    fn test_clear_releases_held_keys() {
        let mut t = tracker(true);
        let now = Instant::now();
        t.key_down(KeyCode::Right, false, now);
        t.key_down(KeyCode::Char(' '), false, now);
        t.clear();
        let snapshot = t.snapshot(now);
        assert_eq!(snapshot.events, vec![KeyEvent::Released(Key::Right)]);
        assert!(!snapshot.right_held);
    }
}
