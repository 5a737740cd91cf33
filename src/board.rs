//! Game board representation and collision detection

use crate::piece::Piece;
use crate::tetromino::{PieceType, Rotation};

pub use crate::rules::{BOARD_HEIGHT, BOARD_WIDTH};

/// A cell on the board - either empty or filled by a piece type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(PieceType),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, Cell::Filled(_))
    }
}

/// The game board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Grid stored as [row][col], row 0 is the top, row increases downward
    cells: [[Cell; BOARD_WIDTH]; BOARD_HEIGHT],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; BOARD_WIDTH]; BOARD_HEIGHT],
        }
    }

    /// Get the cell at column `x`, row `y`.
    /// Returns None if out of bounds
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= BOARD_WIDTH || y >= BOARD_HEIGHT {
            return None;
        }
        Some(self.cells[y][x])
    }

    /// Set a cell at a position.
    /// Returns false if out of bounds
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= BOARD_WIDTH || y >= BOARD_HEIGHT {
            return false;
        }
        self.cells[y][x] = cell;
        true
    }

    /// Check if a single position can hold a piece cell.
    ///
    /// Columns must be in `[0, BOARD_WIDTH)` and rows below `BOARD_HEIGHT`.
    /// Rows above the top (negative) are free space for spawning and kicks.
    pub fn is_free(&self, x: i32, y: i32) -> bool {
        if x < 0 || x >= BOARD_WIDTH as i32 || y >= BOARD_HEIGHT as i32 {
            return false;
        }
        if y < 0 {
            return true;
        }
        self.cells[y as usize][x as usize].is_empty()
    }

    /// Check whether `piece`, shifted by (dx, dy) and optionally shown in a
    /// different rotation, would fit. Pure check; nothing is mutated.
    pub fn is_valid_move(&self, piece: &Piece, dx: i32, dy: i32, rotation: Option<Rotation>) -> bool {
        let shape = piece.piece_type.shape(rotation.unwrap_or(piece.rotation));
        shape
            .cells
            .iter()
            .all(|&(cx, cy)| self.is_free(piece.x + cx + dx, piece.y + cy + dy))
    }

    /// Write the piece into the grid. Cells above the top row are dropped.
    /// Returns how many cells landed on the board.
    pub fn place(&mut self, piece: &Piece) -> usize {
        let cell = Cell::Filled(piece.piece_type);
        piece
            .cells()
            .into_iter()
            .filter(|&(x, y)| self.set(x, y, cell))
            .count()
    }

    /// Remove every full row, shifting the rows above it down.
    /// Returns the number of rows removed
    pub fn clear_lines(&mut self) -> usize {
        let mut lines_cleared = 0;
        let mut write_row = BOARD_HEIGHT;

        // Compact from the bottom up so surviving rows keep their order
        for read_row in (0..BOARD_HEIGHT).rev() {
            if self.is_line_full(read_row) {
                lines_cleared += 1;
            } else {
                write_row -= 1;
                if write_row != read_row {
                    self.cells[write_row] = self.cells[read_row];
                }
            }
        }

        // Fill the top with empty rows
        for row in 0..write_row {
            self.cells[row] = [Cell::Empty; BOARD_WIDTH];
        }

        lines_cleared
    }

    /// Check if a line is completely filled
    fn is_line_full(&self, row: usize) -> bool {
        self.cells[row].iter().all(|cell| cell.is_filled())
    }

    /// Check if the board is completely empty (for perfect-clear detection)
    pub fn is_empty(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(|cell| cell.is_empty()))
    }

    /// Row the piece would come to rest at if dropped straight down
    pub fn ghost_y(&self, piece: &Piece) -> i32 {
        let mut dy = 0;
        while self.is_valid_move(piece, 0, dy + 1, None) {
            dy += 1;
        }
        piece.y + dy
    }

    /// Corner test used by T-spin detection: walls and floor count as
    /// occupied, space above the top row does not
    pub fn is_corner_blocked(&self, x: i32, y: i32) -> bool {
        if x < 0 || x >= BOARD_WIDTH as i32 || y >= BOARD_HEIGHT as i32 {
            return true;
        }
        self.get(x, y).is_some_and(|cell| cell.is_filled())
    }

    /// Iterate over rows, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Cell; BOARD_WIDTH]> {
        self.cells.iter()
    }
}
