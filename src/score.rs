//! Scoring: line clears, combos, back-to-back, T-spins and perfect clears

use crate::board::Board;
use crate::piece::Piece;
use crate::rules::Rules;

/// Name of a line clear by size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearKind {
    Single,
    Double,
    Triple,
    Tetris,
}

impl ClearKind {
    pub fn from_lines(lines: usize) -> Option<Self> {
        match lines {
            1 => Some(ClearKind::Single),
            2 => Some(ClearKind::Double),
            3 => Some(ClearKind::Triple),
            4 => Some(ClearKind::Tetris),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClearKind::Single => "Single",
            ClearKind::Double => "Double",
            ClearKind::Triple => "Triple",
            ClearKind::Tetris => "Tetris",
        }
    }
}

/// Bonuses awarded on top of the line-clear points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComboBonus {
    pub combo_bonus: u32,
    pub back_to_back_bonus: u32,
    pub perfect_clear_bonus: u32,
}

impl ComboBonus {
    pub fn total(&self) -> u32 {
        self.combo_bonus + self.back_to_back_bonus + self.perfect_clear_bonus
    }
}

/// Full breakdown of the points a single lock earned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClearScore {
    pub lines: usize,
    pub kind: Option<ClearKind>,
    pub tspin: bool,
    /// Line-clear points, after the T-spin multiplier
    pub line_score: u32,
    /// Combo count after this lock
    pub combo: u32,
    pub bonus: ComboBonus,
}

impl ClearScore {
    pub fn total(&self) -> u32 {
        self.line_score + self.bonus.total()
    }

    /// Short label for display, e.g. "T-Spin Tetris" or "Perfect Clear!"
    pub fn label(&self) -> Option<String> {
        let kind = self.kind?;
        let mut label = String::new();
        if self.bonus.back_to_back_bonus > 0 {
            label.push_str("Back-to-Back ");
        }
        if self.tspin {
            label.push_str("T-Spin ");
        }
        label.push_str(kind.name());
        if self.combo > 1 {
            label.push_str(&format!(" Combo x{}", self.combo));
        }
        if self.bonus.perfect_clear_bonus > 0 {
            label.push_str(" Perfect Clear!");
        }
        Some(label)
    }
}

/// Remove full rows and look up their base score
pub fn clear_lines(board: &mut Board, rules: &Rules) -> (usize, u32) {
    let count = board.clear_lines();
    (count, rules.line_clear_score(count))
}

/// T-spin test: a T piece whose last action was a rotation, with at least
/// three of the four diagonal neighbours of its box center (x+1, y+1)
/// occupied or outside the walls/floor
pub fn check_for_tspin(piece: &Piece, board: &Board, last_action_was_rotation: bool) -> bool {
    if !piece.is_t_piece() || !last_action_was_rotation {
        return false;
    }

    let (cx, cy) = (piece.x + 1, piece.y + 1);
    let corners = [
        (cx - 1, cy - 1),
        (cx + 1, cy - 1),
        (cx - 1, cy + 1),
        (cx + 1, cy + 1),
    ];

    corners
        .iter()
        .filter(|&&(x, y)| board.is_corner_blocked(x, y))
        .count()
        >= 3
}

/// Running score state of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    /// Current score, never decreases
    pub points: u64,
    /// Current level
    pub level: u32,
    /// Total lines cleared
    pub lines: u32,
    /// Consecutive locks that cleared at least one line
    pub combo: u32,
    /// Whether the last line clear was a Tetris
    pub back_to_back: bool,
    /// Whether the last line clear emptied the board
    pub perfect_clear: bool,
}

impl Score {
    pub fn new(level: u32) -> Self {
        Self {
            points: 0,
            level,
            lines: 0,
            combo: 0,
            back_to_back: false,
            perfect_clear: false,
        }
    }

    /// Add score for soft drop (1 point per cell)
    pub fn add_soft_drop(&mut self, cells: u32) -> u32 {
        self.points += cells as u64;
        cells
    }

    /// Add score for hard drop (2 points per cell)
    pub fn add_hard_drop(&mut self, cells: u32) -> u32 {
        let points = cells * 2;
        self.points += points as u64;
        points
    }

    /// Advance combo and back-to-back state after a lock and compute bonuses.
    ///
    /// A lock that cleared nothing resets the combo and leaves the
    /// back-to-back and perfect-clear flags untouched.
    pub fn update_combo(&mut self, lines_cleared: usize, board: &Board, rules: &Rules) -> ComboBonus {
        let mut bonus = ComboBonus::default();
        if lines_cleared == 0 {
            self.combo = 0;
            return bonus;
        }

        self.combo += 1;
        bonus.combo_bonus = rules.combo_bonus(self.combo);

        if lines_cleared == 4 {
            if self.back_to_back {
                bonus.back_to_back_bonus = rules.back_to_back_bonus();
            }
            self.back_to_back = true;
        } else {
            self.back_to_back = false;
        }

        self.perfect_clear = board.is_empty();
        if self.perfect_clear {
            bonus.perfect_clear_bonus = rules.perfect_clear_bonus;
        }

        bonus
    }

    /// Score a lock whose lines have already been removed from `board`.
    ///
    /// `line_score` is the base value from [`clear_lines`]. Applies the T-spin
    /// multiplier to it, then adds the combo/back-to-back/perfect-clear
    /// bonuses and the line total.
    pub fn score_lock(
        &mut self,
        lines_cleared: usize,
        line_score: u32,
        tspin: bool,
        board: &Board,
        rules: &Rules,
    ) -> ClearScore {
        let mut line_score = line_score;
        let tspin = tspin && lines_cleared > 0;
        if tspin {
            line_score = (line_score as f64 * rules.tspin_multiplier) as u32;
        }

        let bonus = self.update_combo(lines_cleared, board, rules);
        let result = ClearScore {
            lines: lines_cleared,
            kind: ClearKind::from_lines(lines_cleared),
            tspin,
            line_score,
            combo: self.combo,
            bonus,
        };

        self.points += result.total() as u64;
        self.lines += lines_cleared as u32;
        result
    }

    /// Recompute the level from total lines. Returns true if it changed
    pub fn update_level(&mut self, rules: &Rules) -> bool {
        let level = rules.level_for(self.lines);
        if level != self.level {
            self.level = level;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BOARD_WIDTH, Cell};
    use crate::tetromino::{PieceType, Rotation};

    fn busy_board() -> Board {
        let mut board = Board::new();
        board.set(0, 19, Cell::Filled(PieceType::O));
        board
    }

    #[test]
    fn test_clear_lines_rows_three_and_seven() {
        let rules = Rules::default();
        let mut board = Board::new();
        for x in 0..BOARD_WIDTH as i32 {
            board.set(x, 3, Cell::Filled(PieceType::I));
            board.set(x, 7, Cell::Filled(PieceType::I));
        }
        board.set(2, 10, Cell::Filled(PieceType::T));
        assert_eq!(clear_lines(&mut board, &rules), (2, 300));
        assert_eq!(board.get(2, 10), Some(Cell::Filled(PieceType::T)));
    }

    #[test]
    fn test_combo_sequence() {
        let rules = Rules::default();
        let board = busy_board();
        let mut score = Score::new(1);

        let bonuses: Vec<_> = (0..3)
            .map(|_| {
                let bonus = score.update_combo(1, &board, &rules);
                (score.combo, bonus.combo_bonus)
            })
            .collect();
        assert_eq!(bonuses, vec![(1, 0), (2, 150), (3, 200)]);

        // A lock without a clear breaks the chain
        assert_eq!(score.update_combo(0, &board, &rules).total(), 0);
        assert_eq!(score.combo, 0);
    }

    #[test]
    fn test_back_to_back_tetris() {
        let rules = Rules::default();
        let board = busy_board();
        let mut score = Score::new(1);

        let first = score.score_lock(4, rules.line_clear_score(4), false, &board, &rules);
        assert_eq!(first.line_score + first.bonus.back_to_back_bonus, 800);

        let second = score.score_lock(4, rules.line_clear_score(4), false, &board, &rules);
        assert_eq!(second.line_score + second.bonus.back_to_back_bonus, 1200);
        // Second consecutive clear also earns the combo bonus
        assert_eq!(second.bonus.combo_bonus, 150);
        assert!(score.back_to_back);
    }

    #[test]
    fn test_tetris_after_single_is_not_back_to_back() {
        let rules = Rules::default();
        let board = busy_board();
        let mut score = Score::new(1);

        score.score_lock(1, rules.line_clear_score(1), false, &board, &rules);
        let tetris = score.score_lock(4, rules.line_clear_score(4), false, &board, &rules);
        assert_eq!(tetris.bonus.back_to_back_bonus, 0);
        assert!(score.back_to_back);
    }

    #[test]
    fn test_empty_lock_keeps_back_to_back() {
        let rules = Rules::default();
        let board = busy_board();
        let mut score = Score::new(1);

        score.score_lock(4, rules.line_clear_score(4), false, &board, &rules);
        score.score_lock(0, rules.line_clear_score(0), false, &board, &rules);
        let second = score.score_lock(4, rules.line_clear_score(4), false, &board, &rules);
        assert_eq!(second.bonus.back_to_back_bonus, 400);
        assert_eq!(second.bonus.combo_bonus, 0);
    }

    #[test]
    fn test_perfect_clear_bonus() {
        let rules = Rules::default();
        let mut score = Score::new(1);
        let result = score.score_lock(2, rules.line_clear_score(2), false, &Board::new(), &rules);
        assert_eq!(result.bonus.perfect_clear_bonus, 2000);
        assert_eq!(result.total(), 2300);
        assert!(score.perfect_clear);
        assert_eq!(score.points, 2300);
    }

    #[test]
    fn test_tspin_multiplier() {
        let rules = Rules::default();
        let board = busy_board();
        let mut score = Score::new(1);
        let result = score.score_lock(2, rules.line_clear_score(2), true, &board, &rules);
        assert_eq!(result.line_score, 450);
        assert!(result.tspin);
        assert_eq!(result.label().as_deref(), Some("T-Spin Double"));

        // No lines, no T-spin bonus
        let empty = score.score_lock(0, rules.line_clear_score(0), true, &board, &rules);
        assert!(!empty.tspin);
        assert_eq!(empty.total(), 0);
    }

    #[test]
    fn test_drop_points() {
        let mut score = Score::new(1);
        assert_eq!(score.add_soft_drop(5), 5);
        assert_eq!(score.add_hard_drop(10), 20);
        assert_eq!(score.points, 25);
    }

    #[test]
    fn test_level_up() {
        let rules = Rules::default();
        let board = busy_board();
        let mut score = Score::new(1);
        for _ in 0..9 {
            score.score_lock(1, rules.line_clear_score(1), false, &board, &rules);
            assert!(!score.update_level(&rules));
        }
        score.score_lock(1, rules.line_clear_score(1), false, &board, &rules);
        assert!(score.update_level(&rules));
        assert_eq!(score.level, 2);
        assert_eq!(rules.fall_speed(score.level).as_millis(), 850);
    }

    #[test]
    fn test_tspin_needs_rotation_and_corners() {
        let mut board = Board::new();
        let mut piece = Piece::spawn(PieceType::T);
        piece.rotation = Rotation::Spawn;
        piece.x = 3;
        piece.y = 18;
        // Center (4, 19): the floor blocks both lower corners
        assert!(!check_for_tspin(&piece, &board, true));
        board.set(3, 18, Cell::Filled(PieceType::J));
        assert!(check_for_tspin(&piece, &board, true));
        assert!(!check_for_tspin(&piece, &board, false));

        let mut other = piece;
        other.piece_type = PieceType::L;
        assert!(!check_for_tspin(&other, &board, true));
    }
}
