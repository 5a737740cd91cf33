//! 7-bag randomizer for piece generation
//!
//! All 7 pieces are shuffled, then dealt out before reshuffling. Over any
//! window of 7 draws aligned to the start, each type appears exactly once.

use crate::tetromino::PieceType;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// The 7-bag piece randomizer
#[derive(Debug, Clone)]
pub struct RandomizerBag {
    /// Pieces left in the current bag, in deal order
    queue: VecDeque<PieceType>,
    rng: ChaCha8Rng,
}

impl Default for RandomizerBag {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomizerBag {
    /// Create a bag with a random seed
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Create a bag with a fixed seed (reproducible sequences)
    pub fn with_seed(seed: u64) -> Self {
        let mut bag = Self {
            queue: VecDeque::with_capacity(7),
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        bag.refill();
        bag
    }

    /// Deal the next piece, reshuffling as soon as the bag runs out
    pub fn draw(&mut self) -> PieceType {
        // The queue is refilled the moment it empties, so this never falls back
        let piece = self.queue.pop_front().unwrap_or(PieceType::T);
        if self.queue.is_empty() {
            self.refill();
        }
        piece
    }

    /// Pieces still waiting in the current bag
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Refill the queue with a new shuffled bag
    fn refill(&mut self) {
        let mut new_bag = PieceType::all();
        new_bag.shuffle(&mut self.rng);
        self.queue.extend(new_bag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_bag_contains_all_pieces() {
        let mut bag = RandomizerBag::with_seed(7);
        let unique: HashSet<_> = (0..7).map(|_| bag.draw()).collect();
        assert_eq!(unique.len(), 7);
    }

    #[test]
    fn test_never_empty_after_draw() {
        let mut bag = RandomizerBag::with_seed(1);
        for _ in 0..50 {
            bag.draw();
            assert!(bag.remaining() > 0);
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = RandomizerBag::with_seed(42);
        let mut b = RandomizerBag::with_seed(42);
        let seq_a: Vec<_> = (0..21).map(|_| a.draw()).collect();
        let seq_b: Vec<_> = (0..21).map(|_| b.draw()).collect();
        assert_eq!(seq_a, seq_b);
    }

    proptest! {
        #[test]
        fn prop_every_window_of_seven_is_a_permutation(seed in any::<u64>(), bags in 1usize..12) {
            let mut bag = RandomizerBag::with_seed(seed);
            for _ in 0..bags {
                let window: HashSet<_> = (0..7).map(|_| bag.draw()).collect();
                prop_assert_eq!(window.len(), 7);
            }
        }
    }
}
