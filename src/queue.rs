//! Fixed-depth preview queue of upcoming pieces

use crate::bag::RandomizerBag;
use crate::tetromino::PieceType;
use std::collections::VecDeque;

/// Upcoming pieces, always holding exactly `depth` entries between calls
#[derive(Debug, Clone)]
pub struct NextQueue {
    pieces: VecDeque<PieceType>,
    depth: usize,
}

impl NextQueue {
    /// Create a queue of `depth` pieces drawn from `bag`
    pub fn filled(depth: usize, bag: &mut RandomizerBag) -> Self {
        let mut queue = Self {
            pieces: VecDeque::with_capacity(depth + 1),
            depth: depth.max(1),
        };
        queue.refill(bag);
        queue
    }

    /// Take the front piece and top the queue back up from `bag`
    pub fn pop_and_refill(&mut self, bag: &mut RandomizerBag) -> PieceType {
        let piece = self.pieces.pop_front().unwrap_or_else(|| bag.draw());
        self.refill(bag);
        piece
    }

    /// Draw from `bag` until the queue is at full depth
    pub fn refill(&mut self, bag: &mut RandomizerBag) {
        while self.pieces.len() < self.depth {
            self.pieces.push_back(bag.draw());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = PieceType> + '_ {
        self.pieces.iter().copied()
    }

    pub fn peek(&self) -> Option<PieceType> {
        self.pieces.front().copied()
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}
