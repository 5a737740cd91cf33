//! Active falling piece logic

use crate::board::{Board, BOARD_WIDTH};
use crate::kicks::kick_offsets;
use crate::tetromino::{PieceType, Rotation, Shape};

/// An active falling piece
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    /// The type of tetromino
    pub piece_type: PieceType,
    /// Current rotation state
    pub rotation: Rotation,
    /// Top-left corner of the bounding box; y grows downward
    pub x: i32,
    pub y: i32,
}

impl Piece {
    /// Create a new piece at spawn position: top row, bounding box centered
    pub fn spawn(piece_type: PieceType) -> Self {
        let shape = piece_type.shape(Rotation::Spawn);
        Self {
            piece_type,
            rotation: Rotation::Spawn,
            x: BOARD_WIDTH as i32 / 2 - shape.width / 2,
            y: 0,
        }
    }

    pub fn shape(&self) -> &'static Shape {
        self.piece_type.shape(self.rotation)
    }

    /// Absolute board positions (x, y) of all 4 blocks
    pub fn cells(&self) -> [(i32, i32); 4] {
        self.shape().cells.map(|(cx, cy)| (self.x + cx, self.y + cy))
    }

    /// Try to shift by (dx, dy), returns true if successful
    pub fn try_move(&mut self, board: &Board, dx: i32, dy: i32) -> bool {
        if board.is_valid_move(self, dx, dy, None) {
            self.x += dx;
            self.y += dy;
            true
        } else {
            false
        }
    }

    /// Try to rotate 90° clockwise, trying wall kicks in table order.
    ///
    /// On failure the piece is left exactly as it was.
    pub fn rotate(&mut self, board: &Board) -> bool {
        let to = self.rotation.cw();
        for &(dx, dy) in kick_offsets(self.piece_type, self.rotation, to) {
            if board.is_valid_move(self, dx, dy, Some(to)) {
                self.x += dx;
                self.y += dy;
                self.rotation = to;
                return true;
            }
        }
        false
    }

    /// Move down as far as possible and return distance dropped
    pub fn hard_drop(&mut self, board: &Board) -> u32 {
        let mut distance = 0;
        while self.try_move(board, 0, 1) {
            distance += 1;
        }
        distance
    }

    /// Check if this is a T piece (for T-spin detection)
    pub fn is_t_piece(&self) -> bool {
        matches!(self.piece_type, PieceType::T)
    }
}
