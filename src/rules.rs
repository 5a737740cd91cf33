//! Named rule parameters for timing, levels and scoring

use std::time::Duration;

/// Standard board dimensions
pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

/// Starting levels offered by the front end
pub const LEVEL_OPTIONS: [u32; 6] = [1, 5, 10, 15, 20, 25];

/// All tunable parameters of a session.
///
/// The defaults are the classic values the engine was designed around; the
/// board size is fixed at compile time (see [`BOARD_WIDTH`]/[`BOARD_HEIGHT`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Rules {
    /// Level the session starts at (before any lines are cleared)
    pub base_level: u32,
    /// Gravity interval at level 1
    pub base_fall_speed: Duration,
    /// Gravity interval while soft drop is held
    pub soft_drop_speed: Duration,
    /// Delayed Auto Shift
    pub das: Duration,
    /// Auto Repeat Rate
    pub arr: Duration,
    /// Minimum spacing between two auto-shift moves
    pub move_repeat_delay: Duration,
    /// Grace period between landing and locking
    pub lock_delay: Duration,
    /// How many times a landed piece may postpone its lock
    pub max_lock_resets: u32,
    pub lines_per_level: u32,
    /// Fall speed shrinks by this many percent of the base per level
    pub fall_speed_step_percent: u32,
    /// Fall speed never drops below this percentage of the base
    pub min_fall_speed_percent: u32,
    /// Indexed by number of lines cleared; index 0 is unused
    pub line_scores: [u32; 5],
    /// Entry `n - 1` is paid for a combo of `n`; the last entry caps longer combos
    pub combo_bonus: [u32; 6],
    pub back_to_back_multiplier: f64,
    pub tspin_multiplier: f64,
    pub perfect_clear_bonus: u32,
    pub next_queue_depth: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            base_level: 1,
            base_fall_speed: Duration::from_millis(1000),
            soft_drop_speed: Duration::from_millis(50),
            das: Duration::from_millis(380),
            arr: Duration::from_millis(70),
            move_repeat_delay: Duration::from_millis(15),
            lock_delay: Duration::from_millis(500),
            max_lock_resets: 15,
            lines_per_level: 10,
            fall_speed_step_percent: 15,
            min_fall_speed_percent: 10,
            line_scores: [0, 100, 300, 500, 800],
            combo_bonus: [0, 150, 200, 300, 400, 400],
            back_to_back_multiplier: 1.5,
            tspin_multiplier: 1.5,
            perfect_clear_bonus: 2000,
            next_queue_depth: 3,
        }
    }
}

impl Rules {
    /// Rules with a different starting level
    pub fn with_base_level(mut self, level: u32) -> Self {
        self.base_level = level.max(1);
        self
    }

    /// Level reached after clearing `lines` in total
    pub fn level_for(&self, lines: u32) -> u32 {
        self.base_level + lines / self.lines_per_level.max(1)
    }

    /// Gravity interval for a level: `max(10%, 100% - (level-1)*15%)` of the base
    pub fn fall_speed(&self, level: u32) -> Duration {
        let reduction = level
            .saturating_sub(1)
            .saturating_mul(self.fall_speed_step_percent);
        let percent = 100u32
            .saturating_sub(reduction)
            .max(self.min_fall_speed_percent);
        self.base_fall_speed * percent / 100
    }

    /// Base points for clearing `count` lines at once; anything unknown scores 0
    pub fn line_clear_score(&self, count: usize) -> u32 {
        self.line_scores.get(count).copied().unwrap_or(0)
    }

    /// Bonus for the given combo count; combos of 0 or 1 earn nothing
    pub fn combo_bonus(&self, combo: u32) -> u32 {
        if combo <= 1 {
            return 0;
        }
        let last = self.combo_bonus.len() - 1;
        self.combo_bonus[(combo as usize - 1).min(last)]
    }

    /// Bonus for a second consecutive four-line clear
    pub fn back_to_back_bonus(&self) -> u32 {
        (self.line_clear_score(4) as f64 * (self.back_to_back_multiplier - 1.0)) as u32
    }
}
