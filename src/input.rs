//! Input vocabulary and DAS (Delayed Auto Shift) / ARR (Auto Repeat Rate)
//!
//! The host turns raw keyboard state into an [`InputSnapshot`] once per frame:
//! edge-triggered press/release events plus the level-triggered "is held"
//! state of left and right, which the auto-shift timers need.

use std::time::Duration;

/// Keys the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    SoftDrop,
    Rotate,
    HardDrop,
    Hold,
}

/// A discrete key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Pressed(Key),
    Released(Key),
}

/// Everything the engine needs to know about the keyboard for one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    /// Transitions since the previous tick, in order
    pub events: Vec<KeyEvent>,
    pub left_held: bool,
    pub right_held: bool,
}

impl InputSnapshot {
    /// Snapshot with no events and nothing held
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn press(mut self, key: Key) -> Self {
        self.events.push(KeyEvent::Pressed(key));
        self
    }

    pub fn release(mut self, key: Key) -> Self {
        self.events.push(KeyEvent::Released(key));
        self
    }

    pub fn holding_left(mut self) -> Self {
        self.left_held = true;
        self
    }

    pub fn holding_right(mut self) -> Self {
        self.right_held = true;
        self
    }
}

/// Phase of a directional key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatPhase {
    #[default]
    Idle,
    /// Pressed, waiting out the DAS delay
    Delaying,
    /// Auto-repeating every ARR interval
    Repeating,
}

/// Per-direction auto-shift state machine
#[derive(Debug, Clone)]
pub struct InputTimer {
    das: Duration,
    arr: Duration,
    /// Session time of the last press, trigger or release
    last_time: Duration,
    phase: RepeatPhase,
}

impl InputTimer {
    pub fn new(das: Duration, arr: Duration) -> Self {
        Self {
            das,
            arr,
            last_time: Duration::ZERO,
            phase: RepeatPhase::Idle,
        }
    }

    pub fn phase(&self) -> RepeatPhase {
        self.phase
    }

    /// Advance the timer. Returns true when the piece should move now.
    ///
    /// `initial_press` marks the edge of a new press; it always moves at once.
    /// While held, the first repeat comes after `das`, then one every `arr`.
    pub fn update(&mut self, now: Duration, key_pressed: bool, initial_press: bool) -> bool {
        if !key_pressed {
            self.phase = RepeatPhase::Idle;
            self.last_time = now;
            return false;
        }

        if initial_press {
            self.phase = RepeatPhase::Delaying;
            self.last_time = now;
            return true;
        }

        let elapsed = now.saturating_sub(self.last_time);
        match self.phase {
            RepeatPhase::Idle | RepeatPhase::Delaying => {
                if elapsed >= self.das {
                    self.phase = RepeatPhase::Repeating;
                    self.last_time = now;
                    return true;
                }
            }
            RepeatPhase::Repeating => {
                if elapsed >= self.arr {
                    self.last_time = now;
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn timer() -> InputTimer {
        InputTimer::new(ms(380), ms(70))
    }

    #[test]
    fn test_initial_press_moves_immediately() {
        let mut t = timer();
        assert!(t.update(ms(1000), true, true));
        assert_eq!(t.phase(), RepeatPhase::Delaying);
    }

    #[test]
    fn test_das_then_arr() {
        let mut t = timer();
        assert!(t.update(ms(0), true, true));
        assert!(!t.update(ms(200), true, false));
        assert!(!t.update(ms(379), true, false));
        assert!(t.update(ms(380), true, false));
        assert_eq!(t.phase(), RepeatPhase::Repeating);
        assert!(!t.update(ms(420), true, false));
        assert!(t.update(ms(450), true, false));
        assert!(!t.update(ms(500), true, false));
        assert!(t.update(ms(520), true, false));
    }

    #[test]
    fn test_release_resets_to_idle() {
        let mut t = timer();
        t.update(ms(0), true, true);
        t.update(ms(400), true, false);
        assert!(!t.update(ms(410), false, false));
        assert_eq!(t.phase(), RepeatPhase::Idle);

        // A fresh press has to wait out DAS again
        assert!(t.update(ms(500), true, true));
        assert!(!t.update(ms(600), true, false));
        assert!(t.update(ms(880), true, false));
    }

    #[test]
    fn test_snapshot_builder() {
        let snapshot = InputSnapshot::idle().press(Key::Left).holding_left();
        assert_eq!(snapshot.events, vec![KeyEvent::Pressed(Key::Left)]);
        assert!(snapshot.left_held);
        assert!(!snapshot.right_held);
    }
}
