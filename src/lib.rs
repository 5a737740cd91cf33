//! TETRION - a falling-block puzzle engine
//!
//! The library is the rules-and-timing core: a [`GameSession`] is advanced
//! once per frame with the elapsed time and an [`InputSnapshot`], and reports
//! what happened in a [`TickResult`]. It does no I/O besides the optional
//! settings and high-score stores.

pub mod bag;
pub mod board;
pub mod error;
pub mod highscores;
pub mod input;
pub mod kicks;
pub mod piece;
pub mod queue;
pub mod rules;
pub mod score;
pub mod session;
pub mod settings;
pub mod tetromino;

pub use board::{Board, Cell};
pub use error::StoreError;
pub use highscores::{HighScoreEntry, HighScores};
pub use input::{InputSnapshot, Key, KeyEvent};
pub use piece::Piece;
pub use rules::Rules;
pub use score::{ClearKind, ClearScore, Score};
pub use session::{GameSession, LockEvent, SessionEvent, SessionState, TickResult};
pub use settings::Settings;
pub use tetromino::{PieceType, Rotation};
