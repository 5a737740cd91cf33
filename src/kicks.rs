//! Wall kick data
//!
//! When an in-place rotation collides, these offsets are tried in order.
//! The lookup is keyed by the rotation transition so that per-transition data
//! can be slotted in; the current tables are a simplified rotation system
//! that uses the same list for every transition, not canonical SRS data.

use crate::tetromino::{PieceType, Rotation};

/// Offsets for J, L, O, S, T, Z as (dx, dy), x to the right, y downward
const JLOSTZ_KICKS: [(i32, i32); 5] = [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)];

/// Offsets for the I piece
const I_KICKS: [(i32, i32); 5] = [(0, 0), (-2, 0), (1, 0), (-2, -1), (1, 2)];

/// Get wall kick offsets for a rotation attempt.
///
/// The first entry is always the identity, so callers can try the whole list
/// in order and take the first placement that fits.
pub fn kick_offsets(piece_type: PieceType, from: Rotation, to: Rotation) -> &'static [(i32, i32)] {
    match (piece_type, from, to) {
        (PieceType::I, _, _) => &I_KICKS,
        _ => &JLOSTZ_KICKS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_kick_is_identity() {
        for piece in PieceType::all() {
            for from in Rotation::all() {
                let kicks = kick_offsets(piece, from, from.cw());
                assert_eq!(kicks[0], (0, 0));
            }
        }
    }

    #[test]
    fn test_i_piece_has_its_own_table() {
        let i = kick_offsets(PieceType::I, Rotation::Spawn, Rotation::Right);
        let t = kick_offsets(PieceType::T, Rotation::Spawn, Rotation::Right);
        assert_ne!(i, t);
        assert_eq!(i.len(), 5);
        assert_eq!(t.len(), 5);
    }
}
