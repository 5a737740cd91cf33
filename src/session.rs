//! Core game state and per-tick logic
//!
//! A [`GameSession`] owns everything about one game: board, current/next/held
//! pieces, score and the gravity/lock-delay state machine. The host calls
//! [`GameSession::update`] once per frame with the elapsed time and an
//! [`InputSnapshot`]; all time is measured on the session's own clock, which
//! only advances through `update`, so a session is fully deterministic for a
//! given seed and input stream.

use crate::bag::RandomizerBag;
use crate::board::Board;
use crate::input::{InputSnapshot, InputTimer, Key, KeyEvent};
use crate::piece::Piece;
use crate::queue::NextQueue;
use crate::rules::Rules;
use crate::score::{self, ClearScore, Score};
use crate::tetromino::PieceType;
use std::time::Duration;
use tracing::{debug, info};

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Piece falling or moving freely
    Active,
    /// Piece resting on the stack, lock delay running
    Landed,
    GameOver,
}

/// A piece being fixed to the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockEvent {
    pub piece_type: PieceType,
    /// Board cells the piece occupied when it locked
    pub cells: [(i32, i32); 4],
    pub clear: ClearScore,
}

/// Something that happened during a tick, for the renderer to react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SoftDrop { cells: u32, points: u32 },
    HardDrop { cells: u32, points: u32 },
    Locked(LockEvent),
    Held(PieceType),
    LevelUp(u32),
    GameOver,
}

/// What changed during one call to [`GameSession::update`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickResult {
    pub score_delta: u64,
    pub lines_delta: u32,
    pub level_changed: bool,
    pub game_over: bool,
    pub events: Vec<SessionEvent>,
}

impl TickResult {
    pub fn lock_event_occurred(&self) -> bool {
        self.locks().next().is_some()
    }

    pub fn locks(&self) -> impl Iterator<Item = &LockEvent> {
        self.events.iter().filter_map(|event| match event {
            SessionEvent::Locked(lock) => Some(lock),
            _ => None,
        })
    }
}

/// The main game struct
#[derive(Debug, Clone)]
pub struct GameSession {
    rules: Rules,
    board: Board,
    /// Current falling piece
    current: Piece,
    next: NextQueue,
    /// Held piece (can swap once per piece)
    hold: Option<PieceType>,
    /// Whether hold has been used this piece
    hold_used: bool,
    bag: RandomizerBag,
    score: Score,
    game_over: bool,
    /// Session clock, advanced only by `update`
    now: Duration,
    /// Time accumulated towards the next gravity step
    fall_time: Duration,
    /// Lock delay start (Some when the piece has landed)
    landed_since: Option<Duration>,
    /// Number of lock resets used by this piece
    lock_resets: u32,
    soft_dropping: bool,
    /// Cells descended under soft drop, not yet credited
    soft_drop_distance: u32,
    /// For T-spin detection
    last_action_was_rotation: bool,
    das_left: InputTimer,
    das_right: InputTimer,
    last_movement: Option<Duration>,
}

impl GameSession {
    /// Create a new session with a random piece sequence
    pub fn new(rules: Rules) -> Self {
        Self::with_bag(rules, RandomizerBag::new())
    }

    /// Create a new session with a reproducible piece sequence
    pub fn with_seed(rules: Rules, seed: u64) -> Self {
        Self::with_bag(rules, RandomizerBag::with_seed(seed))
    }

    fn with_bag(rules: Rules, mut bag: RandomizerBag) -> Self {
        let current = Piece::spawn(bag.draw());
        let next = NextQueue::filled(rules.next_queue_depth, &mut bag);
        let score = Score::new(rules.base_level);

        Self {
            board: Board::new(),
            current,
            next,
            hold: None,
            hold_used: false,
            bag,
            score,
            game_over: false,
            now: Duration::ZERO,
            fall_time: Duration::ZERO,
            landed_since: None,
            lock_resets: 0,
            soft_dropping: false,
            soft_drop_distance: 0,
            last_action_was_rotation: false,
            das_left: InputTimer::new(rules.das, rules.arr),
            das_right: InputTimer::new(rules.das, rules.arr),
            last_movement: None,
            rules,
        }
    }

    /// Start over at the base level with an empty board, continuing the bag
    pub fn reset(&mut self) {
        let rules = self.rules.clone();
        let bag = std::mem::take(&mut self.bag);
        *self = Self::with_bag(rules, bag);
        debug!(level = self.score.level, "session reset");
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current(&self) -> &Piece {
        &self.current
    }

    /// Where the current piece would land
    pub fn ghost(&self) -> Piece {
        Piece {
            y: self.board.ghost_y(&self.current),
            ..self.current
        }
    }

    /// Upcoming pieces, next first
    pub fn next_pieces(&self) -> impl Iterator<Item = PieceType> + '_ {
        self.next.iter()
    }

    pub fn held(&self) -> Option<PieceType> {
        self.hold
    }

    pub fn hold_used(&self) -> bool {
        self.hold_used
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn level(&self) -> u32 {
        self.score.level
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn state(&self) -> SessionState {
        if self.game_over {
            SessionState::GameOver
        } else if self.landed_since.is_some() {
            SessionState::Landed
        } else {
            SessionState::Active
        }
    }

    /// Current gravity interval
    pub fn fall_speed(&self) -> Duration {
        let level_speed = self.rules.fall_speed(self.score.level);
        if self.soft_dropping {
            self.rules.soft_drop_speed.min(level_speed)
        } else {
            level_speed
        }
    }

    /// Advance the session by `elapsed`, applying this frame's input
    pub fn update(&mut self, input: &InputSnapshot, elapsed: Duration) -> TickResult {
        let mut tick = TickResult::default();
        if self.game_over {
            tick.game_over = true;
            return tick;
        }

        let points_before = self.score.points;
        let lines_before = self.score.lines;
        self.now += elapsed;

        for &event in &input.events {
            if self.game_over {
                break;
            }
            self.handle_event(event, &mut tick);
        }

        if !self.game_over {
            self.handle_continuous_input(input);
        }
        if !self.game_over {
            self.apply_gravity(elapsed, &mut tick);
        }

        if self.score.update_level(&self.rules) {
            debug!(level = self.score.level, fall_ms = self.fall_speed().as_millis() as u64, "level up");
            tick.level_changed = true;
            tick.events.push(SessionEvent::LevelUp(self.score.level));
        }

        tick.score_delta = self.score.points - points_before;
        tick.lines_delta = self.score.lines - lines_before;
        tick.game_over = self.game_over;
        tick
    }

    fn handle_event(&mut self, event: KeyEvent, tick: &mut TickResult) {
        match event {
            KeyEvent::Pressed(Key::Rotate) => {
                self.try_rotate();
            }
            KeyEvent::Pressed(Key::Left) => {
                if self.das_left.update(self.now, true, true) {
                    self.move_block(-1);
                }
                self.das_right = InputTimer::new(self.rules.das, self.rules.arr);
            }
            KeyEvent::Pressed(Key::Right) => {
                if self.das_right.update(self.now, true, true) {
                    self.move_block(1);
                }
                self.das_left = InputTimer::new(self.rules.das, self.rules.arr);
            }
            KeyEvent::Pressed(Key::SoftDrop) => {
                if !self.soft_dropping {
                    self.soft_dropping = true;
                    self.soft_drop_distance = 0;
                }
            }
            KeyEvent::Pressed(Key::HardDrop) => self.hard_drop(tick),
            KeyEvent::Pressed(Key::Hold) => self.hold(tick),
            KeyEvent::Released(Key::SoftDrop) => {
                self.credit_soft_drop(tick);
                self.soft_dropping = false;
            }
            KeyEvent::Released(Key::Left) => {
                self.das_left.update(self.now, false, false);
            }
            KeyEvent::Released(Key::Right) => {
                self.das_right.update(self.now, false, false);
            }
            KeyEvent::Released(_) => {}
        }
    }

    /// Auto-shift for held left/right. Holding both cancels out.
    fn handle_continuous_input(&mut self, input: &InputSnapshot) {
        let now = self.now;
        let repeat_ready = self
            .last_movement
            .is_none_or(|last| now.saturating_sub(last) >= self.rules.move_repeat_delay);

        if input.left_held && !input.right_held {
            if self.das_left.update(now, true, false) && repeat_ready {
                self.move_block(-1);
            }
        } else if !input.left_held {
            self.das_left.update(now, false, false);
        }

        if input.right_held && !input.left_held {
            if self.das_right.update(now, true, false) && repeat_ready {
                self.move_block(1);
            }
        } else if !input.right_held {
            self.das_right.update(now, false, false);
        }
    }

    fn apply_gravity(&mut self, elapsed: Duration, tick: &mut TickResult) {
        self.fall_time += elapsed;
        if self.fall_time >= self.fall_speed() {
            self.fall_time = Duration::ZERO;
            if self.current.try_move(&self.board, 0, 1) {
                if self.soft_dropping {
                    self.soft_drop_distance += 1;
                }
                self.landed_since = None;
            } else if self.landed_since.is_none() {
                self.landed_since = Some(self.now);
            }
        }

        let Some(since) = self.landed_since else {
            return;
        };
        if self.now.saturating_sub(since) < self.rules.lock_delay {
            return;
        }

        if self.board.is_valid_move(&self.current, 0, 1, None) {
            // Slid off the ledge while landed; fall again instead of locking
            self.landed_since = None;
        } else {
            self.lock_piece(tick);
        }
    }

    fn move_block(&mut self, dx: i32) -> bool {
        if self.current.try_move(&self.board, dx, 0) {
            self.last_movement = Some(self.now);
            self.reset_lock_delay();
            self.last_action_was_rotation = false;
            true
        } else {
            false
        }
    }

    fn try_rotate(&mut self) -> bool {
        if self.current.rotate(&self.board) {
            self.reset_lock_delay();
            self.last_action_was_rotation = true;
            true
        } else {
            false
        }
    }

    /// Postpone the lock while landed, up to the reset cap
    fn reset_lock_delay(&mut self) {
        if self.landed_since.is_some() && self.lock_resets < self.rules.max_lock_resets {
            self.landed_since = Some(self.now);
            self.lock_resets += 1;
        }
    }

    fn credit_soft_drop(&mut self, tick: &mut TickResult) {
        if self.soft_dropping && self.soft_drop_distance > 0 {
            let cells = self.soft_drop_distance;
            let points = self.score.add_soft_drop(cells);
            tick.events.push(SessionEvent::SoftDrop { cells, points });
        }
        self.soft_drop_distance = 0;
    }

    fn hard_drop(&mut self, tick: &mut TickResult) {
        let cells = self.current.hard_drop(&self.board);
        let points = self.score.add_hard_drop(cells);
        tick.events.push(SessionEvent::HardDrop { cells, points });
        self.lock_piece(tick);
    }

    fn hold(&mut self, tick: &mut TickResult) {
        if self.hold_used {
            return;
        }

        let stashed = self.current.piece_type;
        let incoming = match self.hold.replace(stashed) {
            Some(held) => held,
            None => self.next.pop_and_refill(&mut self.bag),
        };
        debug!(?stashed, ?incoming, "hold");
        tick.events.push(SessionEvent::Held(stashed));

        self.current = Piece::spawn(incoming);
        self.reset_piece_state();
        self.hold_used = true;
        self.check_spawn(tick);
    }

    /// Lock the current piece and spawn next
    fn lock_piece(&mut self, tick: &mut TickResult) {
        self.credit_soft_drop(tick);

        let piece = self.current;
        let tspin = score::check_for_tspin(&piece, &self.board, self.last_action_was_rotation);
        self.board.place(&piece);

        let (lines, line_score) = score::clear_lines(&mut self.board, &self.rules);
        let clear = self
            .score
            .score_lock(lines, line_score, tspin, &self.board, &self.rules);
        debug!(
            piece = ?piece.piece_type,
            lines,
            tspin = clear.tspin,
            combo = clear.combo,
            points = clear.total(),
            "piece locked"
        );
        tick.events.push(SessionEvent::Locked(LockEvent {
            piece_type: piece.piece_type,
            cells: piece.cells(),
            clear,
        }));

        self.current = Piece::spawn(self.next.pop_and_refill(&mut self.bag));
        self.reset_piece_state();
        self.hold_used = false;
        self.check_spawn(tick);
    }

    /// Top out if the freshly spawned piece does not fit
    fn check_spawn(&mut self, tick: &mut TickResult) {
        if !self.board.is_valid_move(&self.current, 0, 0, None) {
            self.game_over = true;
            info!(score = self.score.points, lines = self.score.lines, "game over");
            tick.events.push(SessionEvent::GameOver);
        }
    }

    /// Reset per-piece state
    fn reset_piece_state(&mut self) {
        self.landed_since = None;
        self.lock_resets = 0;
        self.last_action_was_rotation = false;
        self.fall_time = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BOARD_HEIGHT, BOARD_WIDTH, Cell};
    use crate::tetromino::Rotation;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn session() -> GameSession {
        GameSession::with_seed(Rules::default(), 2024)
    }

    fn idle() -> InputSnapshot {
        InputSnapshot::idle()
    }

    /// Fill a row except for the given columns
    fn fill_row_except(board: &mut Board, row: i32, gap: std::ops::Range<i32>) {
        for x in 0..BOARD_WIDTH as i32 {
            if !gap.contains(&x) {
                board.set(x, row, Cell::Filled(PieceType::Z));
            }
        }
    }

    #[test]
    fn test_new_session() {
        let s = session();
        assert_eq!(s.next_pieces().count(), 3);
        assert_eq!(s.state(), SessionState::Active);
        assert_eq!(s.level(), 1);
        assert_eq!(s.held(), None);
        assert_eq!(s.current().y, 0);
    }

    #[test]
    fn test_same_seed_same_pieces() {
        let a = session();
        let b = session();
        assert_eq!(a.current().piece_type, b.current().piece_type);
        assert!(a.next_pieces().eq(b.next_pieces()));
    }

    #[test]
    fn test_gravity_after_fall_speed() {
        let mut s = session();
        s.update(&idle(), ms(999));
        assert_eq!(s.current().y, 0);
        s.update(&idle(), ms(1));
        assert_eq!(s.current().y, 1);
        s.update(&idle(), ms(999));
        assert_eq!(s.current().y, 1);
    }

    #[test]
    fn test_lock_after_delay() {
        let mut s = session();
        s.current.y = s.board.ghost_y(&s.current);

        let tick = s.update(&idle(), ms(1000));
        assert_eq!(s.state(), SessionState::Landed);
        assert!(!tick.lock_event_occurred());

        assert!(!s.update(&idle(), ms(499)).lock_event_occurred());
        let tick = s.update(&idle(), ms(1));
        assert!(tick.lock_event_occurred());
        assert_eq!(s.state(), SessionState::Active);
        assert_eq!(s.current().y, 0);
    }

    #[test]
    fn test_lock_reset_cap() {
        let mut s = session();
        s.current = Piece::spawn(PieceType::O);
        s.current.y = s.board.ghost_y(&s.current);
        s.update(&idle(), ms(1000));
        assert_eq!(s.state(), SessionState::Landed);

        // Each shuffle restamps the lock timer, so the piece survives well past
        // the lock delay
        for i in 0..15 {
            let key = if i % 2 == 0 { Key::Left } else { Key::Right };
            let tick = s.update(&idle().press(key).release(key), ms(400));
            assert!(!tick.lock_event_occurred(), "locked early at move {i}");
        }
        assert_eq!(s.lock_resets, 15);

        // The 16th move still happens but no longer postpones the lock
        let x_before = s.current().x;
        let tick = s.update(&idle().press(Key::Left).release(Key::Left), ms(400));
        assert!(!tick.lock_event_occurred());
        assert_eq!(s.current().x, x_before - 1);

        let tick = s.update(&idle(), ms(100));
        assert!(tick.lock_event_occurred());
    }

    #[test]
    fn test_slide_off_ledge_cancels_lock() {
        let mut s = session();
        s.current = Piece::spawn(PieceType::O);
        s.board.set(4, 10, Cell::Filled(PieceType::J));
        s.board.set(5, 10, Cell::Filled(PieceType::J));
        s.current.y = 8;
        s.update(&idle(), ms(1000));
        assert_eq!(s.state(), SessionState::Landed);

        let right = idle().press(Key::Right).release(Key::Right);
        s.update(&right, ms(0));
        s.update(&right, ms(0));
        assert_eq!(s.current().x, 6);

        let tick = s.update(&idle(), ms(500));
        assert!(!tick.lock_event_occurred());
        assert_eq!(s.state(), SessionState::Active);
        s.update(&idle(), ms(500));
        assert_eq!(s.current().y, 9);
    }

    #[test]
    fn test_hard_drop_scores_and_locks() {
        let mut s = session();
        let first = s.current().piece_type;
        let upcoming: Vec<_> = s.next_pieces().collect();
        let distance = (s.board.ghost_y(&s.current) - s.current.y) as u64;

        let tick = s.update(&idle().press(Key::HardDrop), ms(16));
        assert_eq!(tick.score_delta, distance * 2);
        assert_eq!(tick.lines_delta, 0);
        let lock = tick.locks().next().expect("hard drop locks");
        assert_eq!(lock.piece_type, first);
        assert_eq!(s.current().piece_type, upcoming[0]);
        assert_eq!(s.next_pieces().count(), 3);
        assert_eq!(s.score().combo, 0);
    }

    #[test]
    fn test_hard_drop_perfect_clear() {
        let mut s = session();
        s.current = Piece::spawn(PieceType::I);
        fill_row_except(&mut s.board, 19, 3..7);

        let tick = s.update(&idle().press(Key::HardDrop), ms(0));
        // 19 cells of hard drop, a single, and the perfect-clear bonus
        assert_eq!(tick.score_delta, 38 + 100 + 2000);
        assert_eq!(tick.lines_delta, 1);
        assert!(s.board().is_empty());
        assert!(s.score().perfect_clear);
    }

    #[test]
    fn test_hard_drop_single_with_leftovers() {
        let mut s = session();
        s.current = Piece::spawn(PieceType::I);
        fill_row_except(&mut s.board, 19, 3..7);
        s.board.set(0, 18, Cell::Filled(PieceType::L));

        let tick = s.update(&idle().press(Key::HardDrop), ms(0));
        assert_eq!(tick.score_delta, 38 + 100);
        assert_eq!(s.board().get(0, 19), Some(Cell::Filled(PieceType::L)));
        let lock = tick.locks().next().unwrap();
        assert_eq!(lock.clear.label().as_deref(), Some("Single"));
    }

    #[test]
    fn test_soft_drop_credited_on_release() {
        let mut s = session();
        let tick = s.update(&idle().press(Key::SoftDrop), ms(50));
        assert_eq!(s.current().y, 1);
        assert_eq!(tick.score_delta, 0);
        s.update(&idle(), ms(50));
        assert_eq!(s.current().y, 2);

        let tick = s.update(&idle().release(Key::SoftDrop), ms(0));
        assert_eq!(tick.score_delta, 2);
        assert_eq!(s.fall_speed(), ms(1000));
    }

    #[test]
    fn test_soft_drop_credited_on_lock() {
        let mut s = session();
        s.current = Piece::spawn(PieceType::O);
        s.current.y = s.board.ghost_y(&s.current) - 1;

        s.update(&idle().press(Key::SoftDrop), ms(50));
        // Blocked: lands, then locks after the delay with the pending cell
        s.update(&idle(), ms(50));
        let tick = s.update(&idle(), ms(500));
        assert!(tick.lock_event_occurred());
        assert!(tick.events.contains(&SessionEvent::SoftDrop { cells: 1, points: 1 }));
        assert_eq!(s.score().points, 1);
    }

    #[test]
    fn test_hold_once_per_piece() {
        let mut s = session();
        let first = s.current().piece_type;
        let second = s.next_pieces().next().unwrap();

        s.update(&idle().press(Key::Hold), ms(0));
        assert_eq!(s.held(), Some(first));
        assert_eq!(s.current().piece_type, second);
        assert_eq!(s.next_pieces().count(), 3);

        // Second hold for the same piece is ignored
        s.update(&idle().press(Key::Hold), ms(0));
        assert_eq!(s.held(), Some(first));
        assert_eq!(s.current().piece_type, second);

        // After a lock, hold swaps with the stored piece
        s.update(&idle().press(Key::HardDrop), ms(0));
        assert!(!s.hold_used());
        let third = s.current().piece_type;
        s.update(&idle().press(Key::Hold), ms(0));
        assert_eq!(s.held(), Some(third));
        assert_eq!(s.current().piece_type, first);
        assert_eq!(s.current().rotation, Rotation::Spawn);
    }

    #[test]
    fn test_das_and_arr() {
        let mut s = session();
        s.current = Piece::spawn(PieceType::O);
        assert_eq!(s.current().x, 4);

        s.update(&idle().press(Key::Left).holding_left(), ms(0));
        assert_eq!(s.current().x, 3);
        s.update(&idle().holding_left(), ms(379));
        assert_eq!(s.current().x, 3);
        s.update(&idle().holding_left(), ms(1));
        assert_eq!(s.current().x, 2);
        s.update(&idle().holding_left(), ms(69));
        assert_eq!(s.current().x, 2);
        s.update(&idle().holding_left(), ms(1));
        assert_eq!(s.current().x, 1);
    }

    #[test]
    fn test_opposite_press_resets_other_timer() {
        let mut s = session();
        s.current = Piece::spawn(PieceType::O);

        s.update(&idle().press(Key::Left).holding_left(), ms(0));
        s.update(&idle().holding_left(), ms(380));
        assert_eq!(s.das_left.phase(), crate::input::RepeatPhase::Repeating);

        s.update(&idle().press(Key::Right).holding_right(), ms(0));
        assert_eq!(s.das_left.phase(), crate::input::RepeatPhase::Idle);
    }

    #[test]
    fn test_rotation_flag_tracks_last_action() {
        let mut s = session();
        s.current = Piece::spawn(PieceType::T);
        s.current.y = 5;
        s.update(&idle().press(Key::Rotate), ms(0));
        assert!(s.last_action_was_rotation);
        s.update(&idle().press(Key::Left), ms(0));
        assert!(!s.last_action_was_rotation);
    }

    #[test]
    fn test_level_up_speeds_up_gravity() {
        let mut s = session();
        s.score.lines = 10;
        let tick = s.update(&idle(), ms(0));
        assert!(tick.level_changed);
        assert_eq!(s.level(), 2);
        assert_eq!(s.fall_speed(), ms(850));
        assert!(tick.events.contains(&SessionEvent::LevelUp(2)));
    }

    #[test]
    fn test_base_level_sets_speed() {
        let s = GameSession::with_seed(Rules::default().with_base_level(5), 1);
        assert_eq!(s.level(), 5);
        assert_eq!(s.fall_speed(), ms(400));
    }

    #[test]
    fn test_top_out_ends_session() {
        let mut s = session();
        s.current = Piece::spawn(PieceType::I);
        fill_row_except(&mut s.board, 1, 0..1);

        let tick = s.update(&idle().press(Key::HardDrop), ms(0));
        assert!(tick.game_over);
        assert!(tick.events.contains(&SessionEvent::GameOver));
        assert_eq!(s.state(), SessionState::GameOver);

        let points = s.score().points;
        let tick = s.update(&idle().press(Key::HardDrop), ms(5000));
        assert!(tick.game_over);
        assert!(tick.events.is_empty());
        assert_eq!(s.score().points, points);
    }

    #[test]
    fn test_reset_clears_board() {
        let mut s = session();
        s.update(&idle().press(Key::HardDrop), ms(0));
        assert!(!s.board().is_empty());
        s.reset();
        assert!(s.board().is_empty());
        assert_eq!(s.score().points, 0);
        assert_eq!(s.next_pieces().count(), 3);
        assert!(s.current().y < BOARD_HEIGHT as i32);
    }
}
