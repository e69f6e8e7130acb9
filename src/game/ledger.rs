//! Winners ledger
//!
//! Append-only record of who won what. A (player, card, win type) triple
//! is recorded at most once for the life of the room, until a reset.

use super::WinType;
use crate::card::CardId;
use crate::room::PlayerId;
use serde::{Deserialize, Serialize};

/// One recorded win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerEntry {
    pub player_id: PlayerId,
    /// Display name at the time of the win
    pub username: String,
    pub card_id: CardId,
    pub win_type: WinType,
}

impl WinnerEntry {
    pub fn key(&self) -> (PlayerId, CardId, WinType) {
        (self.player_id, self.card_id, self.win_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<WinnerEntry>", into = "Vec<WinnerEntry>")]
pub struct WinnersLedger {
    entries: Vec<WinnerEntry>,
}

impl WinnersLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from stored entries, dropping repeated triples.
    pub fn from_entries(entries: impl IntoIterator<Item = WinnerEntry>) -> Self {
        let mut ledger = Self::new();
        for entry in entries {
            ledger.record(entry);
        }
        ledger
    }

    pub fn contains(&self, player_id: PlayerId, card_id: CardId, win_type: WinType) -> bool {
        self.entries
            .iter()
            .any(|e| e.key() == (player_id, card_id, win_type))
    }

    /// Append `entry` unless its triple is already present. Returns true if appended.
    pub fn record(&mut self, entry: WinnerEntry) -> bool {
        if self.contains(entry.player_id, entry.card_id, entry.win_type) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn entries(&self) -> &[WinnerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry for a condition, e.g. who called the first full house.
    pub fn first_of(&self, win_type: WinType) -> Option<&WinnerEntry> {
        self.entries.iter().find(|e| e.win_type == win_type)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

impl From<Vec<WinnerEntry>> for WinnersLedger {
    fn from(entries: Vec<WinnerEntry>) -> Self {
        Self::from_entries(entries)
    }
}

impl From<WinnersLedger> for Vec<WinnerEntry> {
    fn from(ledger: WinnersLedger) -> Self {
        ledger.entries
    }
}
