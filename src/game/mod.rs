//! Game logic: win conditions, evaluation, the winners ledger and draws

pub mod arbitrator;
pub mod balls;
pub mod evaluator;
pub mod ledger;

use crate::card::Format;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A named pattern a card can complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinType {
    /// Any full row
    Line,
    /// At least two full rows
    DoubleLine,
    /// Any full column
    Column,
    /// Either diagonal
    Diagonal,
    /// All four corners
    Corners,
    /// Every number on the card
    FullHouse,
}

/// The set of conditions a room pays out on.
pub type WinConditions = BTreeSet<WinType>;

impl WinType {
    pub const ALL: [WinType; 6] = [
        WinType::Line,
        WinType::DoubleLine,
        WinType::Column,
        WinType::Diagonal,
        WinType::Corners,
        WinType::FullHouse,
    ];

    /// Label for announcing a win.
    pub fn label(self) -> &'static str {
        match self {
            WinType::Line => "Line",
            WinType::DoubleLine => "Double line",
            WinType::Column => "Column",
            WinType::Diagonal => "Diagonal",
            WinType::Corners => "Four corners",
            WinType::FullHouse => "BINGO!",
        }
    }

    /// 90-ball tickets only pay out on a full house.
    pub fn applies_to(self, format: Format) -> bool {
        match format {
            Format::Ball75 => true,
            Format::Ball90 => self == WinType::FullHouse,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            WinType::Line => "line",
            WinType::DoubleLine => "double_line",
            WinType::Column => "column",
            WinType::Diagonal => "diagonal",
            WinType::Corners => "corners",
            WinType::FullHouse => "full_house",
        }
    }
}

impl fmt::Display for WinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown win condition {0:?}")]
pub struct UnknownWinType(pub String);

impl FromStr for WinType {
    type Err = UnknownWinType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        WinType::ALL
            .into_iter()
            .find(|w| w.as_str() == normalized)
            .ok_or_else(|| UnknownWinType(s.to_string()))
    }
}
