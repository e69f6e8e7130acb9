//! Win evaluation
//!
//! A slot is hit when it is FREE/EMPTY or its number has been drawn. The
//! 75-ball card is checked pattern by pattern on its 5x5 grid; a 90-ball
//! ticket only completes on a full house. The two are evaluated by separate
//! functions and never share row/column math.

use super::balls::BallSet;
use super::{WinConditions, WinType};
use crate::card::grid75::{self, Grid75};
use crate::card::{Card, Cell, Grid90, Layout};
use std::collections::BTreeSet;

/// Outcome of evaluating one card against the drawn balls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Enabled conditions the card currently satisfies
    pub matched: BTreeSet<WinType>,
    /// Exactly one number on the card is still undrawn
    pub almost: bool,
}

impl Evaluation {
    pub fn is_win(&self) -> bool {
        !self.matched.is_empty()
    }
}

/// Evaluate `card` against `drawn`, reporting only conditions in `enabled`.
pub fn evaluate(card: &Card, drawn: &BallSet, enabled: &WinConditions) -> Evaluation {
    let satisfied = match card.layout() {
        Layout::Ball75(grid) => patterns_75(grid, drawn),
        Layout::Ball90(grid) => patterns_90(grid, drawn),
    };
    let matched = satisfied.intersection(enabled).copied().collect();

    let undrawn = card
        .numbers()
        .into_iter()
        .filter(|n| !drawn.contains(*n))
        .count();

    Evaluation {
        matched,
        almost: undrawn == 1,
    }
}

fn patterns_75(grid: &Grid75, drawn: &BallSet) -> BTreeSet<WinType> {
    const N: usize = grid75::SIZE;
    let hit = |row: usize, col: usize| match grid.cell(row, col) {
        Cell::Number(n) => drawn.contains(n),
        Cell::Free | Cell::Empty => true,
    };

    let mut found = BTreeSet::new();

    let full_rows = (0..N).filter(|&r| (0..N).all(|c| hit(r, c))).count();
    if full_rows >= 1 {
        found.insert(WinType::Line);
    }
    if full_rows >= 2 {
        found.insert(WinType::DoubleLine);
    }
    if (0..N).any(|c| (0..N).all(|r| hit(r, c))) {
        found.insert(WinType::Column);
    }
    if (0..N).all(|i| hit(i, i)) || (0..N).all(|i| hit(i, N - 1 - i)) {
        found.insert(WinType::Diagonal);
    }
    if [(0, 0), (0, N - 1), (N - 1, 0), (N - 1, N - 1)]
        .into_iter()
        .all(|(r, c)| hit(r, c))
    {
        found.insert(WinType::Corners);
    }
    if full_rows == N {
        found.insert(WinType::FullHouse);
    }

    found
}

fn patterns_90(grid: &Grid90, drawn: &BallSet) -> BTreeSet<WinType> {
    let mut found = BTreeSet::new();
    if grid.numbers().all(|n| drawn.contains(n)) {
        found.insert(WinType::FullHouse);
    }
    found
}
