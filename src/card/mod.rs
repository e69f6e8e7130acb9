//! Bingo cards: formats, grid layouts, marking and generation
//!
//! A card is a tagged layout keyed by its format. The 75-ball card is a
//! 5x5 grid with a FREE center; the 90-ball card is a 3x9 ticket with one
//! EMPTY slot per row. The two shapes never share index math.

mod generator;
pub mod grid75;
pub mod grid90;

pub use generator::{generate, generate_with_rng};
pub use grid75::Grid75;
pub use grid90::Grid90;

use crate::error::Precondition;
use crate::game::evaluator::Evaluation;
use crate::game::WinType;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use uuid::Uuid;

/// The bingo variant a room plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    /// American 75-ball bingo on a 5x5 card
    #[serde(rename = "75")]
    Ball75,
    /// British/European 90-ball bingo on a 3x9 ticket
    #[serde(rename = "90")]
    Ball90,
}

impl Format {
    /// Highest ball number in this format.
    pub fn max_ball(self) -> u8 {
        match self {
            Format::Ball75 => 75,
            Format::Ball90 => 90,
        }
    }

    /// Every ball that can be drawn in this format.
    pub fn balls(self) -> RangeInclusive<u8> {
        1..=self.max_ball()
    }

    /// Number of grid slots on a card, including FREE/EMPTY slots.
    pub fn cell_count(self) -> usize {
        match self {
            Format::Ball75 => grid75::SIZE * grid75::SIZE,
            Format::Ball90 => grid90::ROWS * grid90::COLUMNS,
        }
    }

    /// Number of populated (numbered) slots on a card.
    pub fn number_count(self) -> usize {
        match self {
            Format::Ball75 => grid75::SIZE * grid75::SIZE - 1,
            Format::Ball90 => grid90::NUMBERS,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Ball75 => write!(f, "75-ball"),
            Format::Ball90 => write!(f, "90-ball"),
        }
    }
}

/// Error returned when parsing an unknown format name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown bingo format {0:?} (expected 75 or 90)")]
pub struct UnknownFormat(pub String);

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "75" | "75-ball" | "b75" => Ok(Format::Ball75),
            "90" | "90-ball" | "b90" => Ok(Format::Ball90),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

/// Opaque card identifier, assigned once at generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(Uuid);

impl CardId {
    /// Build an identifier from the given RNG, so seeded generation is reproducible.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        CardId(uuid::Builder::from_random_bytes(rng.random()).into_uuid())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// One slot of a card grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    /// A numbered slot
    Number(u8),
    /// The pre-matched center of a 75-ball card
    Free,
    /// An unused slot on a 90-ball ticket
    Empty,
}

impl Cell {
    /// The number held by this slot, if any.
    pub fn number(self) -> Option<u8> {
        match self {
            Cell::Number(n) => Some(n),
            Cell::Free | Cell::Empty => None,
        }
    }
}

/// Format-specific card layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", content = "grid")]
pub enum Layout {
    #[serde(rename = "75")]
    Ball75(Grid75),
    #[serde(rename = "90")]
    Ball90(Grid90),
}

impl Layout {
    pub fn format(&self) -> Format {
        match self {
            Layout::Ball75(_) => Format::Ball75,
            Layout::Ball90(_) => Format::Ball90,
        }
    }

    /// All slots in row-major order.
    pub fn cells(&self) -> Vec<Cell> {
        match self {
            Layout::Ball75(grid) => grid.rows().iter().flatten().copied().collect(),
            Layout::Ball90(grid) => grid.rows().iter().flatten().copied().collect(),
        }
    }

    /// The populated numbers, row-major.
    pub fn numbers(&self) -> Vec<u8> {
        self.cells().into_iter().filter_map(Cell::number).collect()
    }

    /// Row-major index of the slot holding `ball`.
    pub fn position_of(&self, ball: u8) -> Option<usize> {
        self.cells().iter().position(|cell| *cell == Cell::Number(ball))
    }
}

/// A bingo card held by a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    id: CardId,
    layout: Layout,
    marked: Vec<bool>,
    is_winner: bool,
    win_types: BTreeSet<WinType>,
    almost_win: bool,
}

impl Card {
    /// Create a card with no results and the initial mark mask.
    pub fn new(id: CardId, layout: Layout) -> Self {
        let marked = initial_marks(&layout);
        Self {
            id,
            layout,
            marked,
            is_winner: false,
            win_types: BTreeSet::new(),
            almost_win: false,
        }
    }

    pub fn id(&self) -> CardId {
        self.id
    }

    pub fn format(&self) -> Format {
        self.layout.format()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Mark mask parallel to [`Layout::cells`].
    pub fn marked(&self) -> &[bool] {
        &self.marked
    }

    pub fn is_winner(&self) -> bool {
        self.is_winner
    }

    /// Conditions satisfied at the last evaluation.
    pub fn win_types(&self) -> &BTreeSet<WinType> {
        &self.win_types
    }

    /// True when exactly one number on the card is still undrawn.
    pub fn almost_win(&self) -> bool {
        self.almost_win
    }

    pub fn numbers(&self) -> Vec<u8> {
        self.layout.numbers()
    }

    pub fn contains(&self, ball: u8) -> bool {
        self.layout.position_of(ball).is_some()
    }

    /// Toggle the player's mark on a numbered slot. Returns the new mark.
    pub fn toggle_mark(&mut self, index: usize) -> Result<bool, Precondition> {
        self.check_shape()?;
        let cell = self
            .layout
            .cells()
            .get(index)
            .copied()
            .ok_or(Precondition::UnmarkableCell(index))?;
        match cell {
            Cell::Number(_) => {
                self.marked[index] = !self.marked[index];
                Ok(self.marked[index])
            }
            Cell::Free | Cell::Empty => Err(Precondition::UnmarkableCell(index)),
        }
    }

    /// Mark the slot holding `ball`, if the card has it.
    pub(crate) fn mark_ball(&mut self, ball: u8) -> bool {
        match self.layout.position_of(ball) {
            Some(index) => {
                self.marked[index] = true;
                true
            }
            None => false,
        }
    }

    /// Replace the stored results with a fresh evaluation.
    pub(crate) fn apply(&mut self, evaluation: &Evaluation) {
        self.is_winner = !evaluation.matched.is_empty();
        self.win_types = evaluation.matched.clone();
        self.almost_win = evaluation.almost;
    }

    /// Back to the state the card had when it was generated.
    pub(crate) fn rewind(&mut self) {
        self.marked = initial_marks(&self.layout);
        self.is_winner = false;
        self.win_types.clear();
        self.almost_win = false;
    }

    /// Check the stored mask still lines up with the layout.
    pub fn check_shape(&self) -> Result<(), Precondition> {
        let expected = self.format().cell_count();
        if self.marked.len() != expected {
            return Err(Precondition::MalformedCard(format!(
                "card {} has {} mark flags, expected {}",
                self.id,
                self.marked.len(),
                expected
            )));
        }
        Ok(())
    }
}

fn initial_marks(layout: &Layout) -> Vec<bool> {
    layout
        .cells()
        .into_iter()
        .map(|cell| cell == Cell::Free)
        .collect()
}
