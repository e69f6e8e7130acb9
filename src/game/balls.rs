//! Compact set of drawn balls

use crate::card::Format;

/// Drawn balls as a bitset. Balls 1-90 fit in a `u128`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BallSet(u128);

impl BallSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a ball. Returns false if it was already present or cannot be represented.
    pub fn insert(&mut self, ball: u8) -> bool {
        let Some(bit) = bit(ball) else { return false };
        let fresh = self.0 & bit == 0;
        self.0 |= bit;
        fresh
    }

    pub fn contains(&self, ball: u8) -> bool {
        bit(ball).is_some_and(|bit| self.0 & bit != 0)
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Balls of `format` not yet drawn, ascending.
    pub fn remaining(&self, format: Format) -> Vec<u8> {
        format.balls().filter(|b| !self.contains(*b)).collect()
    }
}

fn bit(ball: u8) -> Option<u128> {
    (ball < 128).then(|| 1u128 << ball)
}

impl FromIterator<u8> for BallSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = BallSet::new();
        for ball in iter {
            set.insert(ball);
        }
        set
    }
}

impl From<&[u8]> for BallSet {
    fn from(balls: &[u8]) -> Self {
        balls.iter().copied().collect()
    }
}
