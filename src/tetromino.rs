//! Tetromino definitions and shapes
//!
//! Each of the 7 tetrominoes has a base shape matrix. The other three
//! orientations are derived by rotating that matrix 90° clockwise
//! (transpose, then reverse each row) and are computed once into a lookup
//! table.

use std::sync::LazyLock;

/// The 7 tetromino types, in index order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceType {
    I, // Cyan - long bar
    L, // Orange
    J, // Blue
    O, // Yellow - square
    S, // Green
    Z, // Red
    T, // Purple
}

impl PieceType {
    /// Get all tetromino types for bag randomization
    pub fn all() -> [PieceType; 7] {
        [
            PieceType::I,
            PieceType::L,
            PieceType::J,
            PieceType::O,
            PieceType::S,
            PieceType::Z,
            PieceType::T,
        ]
    }

    /// Stable type index (0..7)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Get the color for this tetromino as RGB
    pub fn color(self) -> (u8, u8, u8) {
        match self {
            PieceType::I => (0, 255, 255),
            PieceType::L => (255, 165, 0),
            PieceType::J => (0, 0, 255),
            PieceType::O => (255, 255, 0),
            PieceType::S => (0, 255, 0),
            PieceType::Z => (255, 0, 0),
            PieceType::T => (255, 0, 255),
        }
    }

    /// Base (spawn) orientation as rows of filled flags, top row first
    fn base_matrix(self) -> &'static [&'static [u8]] {
        match self {
            PieceType::I => &[&[1, 1, 1, 1]],
            PieceType::L => &[&[1, 0, 0], &[1, 1, 1]],
            PieceType::J => &[&[0, 0, 1], &[1, 1, 1]],
            PieceType::O => &[&[1, 1], &[1, 1]],
            PieceType::S => &[&[0, 1, 1], &[1, 1, 0]],
            PieceType::Z => &[&[1, 1, 0], &[0, 1, 1]],
            PieceType::T => &[&[0, 1, 0], &[1, 1, 1]],
        }
    }

    /// Shape of this tetromino in the given rotation state
    pub fn shape(self, rotation: Rotation) -> &'static Shape {
        &SHAPES[self.index()][rotation.index()]
    }
}

/// Rotation states, clockwise from spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    Spawn, // 0°
    Right, // 90°
    Half,  // 180°
    Left,  // 270°
}

impl Rotation {
    pub fn all() -> [Rotation; 4] {
        [Rotation::Spawn, Rotation::Right, Rotation::Half, Rotation::Left]
    }

    /// Rotate clockwise: Spawn → Right → Half → Left → Spawn
    pub fn cw(self) -> Rotation {
        match self {
            Rotation::Spawn => Rotation::Right,
            Rotation::Right => Rotation::Half,
            Rotation::Half => Rotation::Left,
            Rotation::Left => Rotation::Spawn,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// The filled cells of one orientation, relative to its bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    /// (x, y) offsets, x to the right, y downward
    pub cells: [(i32, i32); 4],
    pub width: i32,
    pub height: i32,
}

impl Shape {
    fn from_matrix(matrix: &[&[u8]]) -> Self {
        let mut cells = [(0, 0); 4];
        let mut n = 0;
        for (y, row) in matrix.iter().enumerate() {
            for (x, &filled) in row.iter().enumerate() {
                if filled != 0 {
                    cells[n] = (x as i32, y as i32);
                    n += 1;
                }
            }
        }
        debug_assert_eq!(n, 4, "tetromino matrix must have exactly 4 cells");
        Self {
            cells,
            width: matrix[0].len() as i32,
            height: matrix.len() as i32,
        }
    }

    /// Rotate the matrix 90° clockwise: cell (x, y) moves to (h - 1 - y, x)
    fn rotated_cw(&self) -> Self {
        let mut cells = self.cells.map(|(x, y)| (self.height - 1 - y, x));
        // Keep row-major order so shapes compare structurally
        cells.sort_by_key(|&(x, y)| (y, x));
        Self {
            cells,
            width: self.height,
            height: self.width,
        }
    }

    /// Whether the cell at (x, y) of the bounding box is filled
    pub fn is_filled(&self, x: i32, y: i32) -> bool {
        self.cells.contains(&(x, y))
    }
}

static SHAPES: LazyLock<[[Shape; 4]; 7]> = LazyLock::new(|| {
    PieceType::all().map(|piece_type| {
        let spawn = Shape::from_matrix(piece_type.base_matrix());
        let right = spawn.rotated_cw();
        let half = right.rotated_cw();
        let left = half.rotated_cw();
        [spawn, right, half, left]
    })
});
