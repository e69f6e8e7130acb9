//! Room persistence and change feeds
//!
//! This module provides:
//! - The [`RoomStore`] trait the host and players talk to
//! - [`RoomPatch`] partial updates, applied atomically per room
//! - An in-memory store for tests and single-process games
//! - A SQLite store keeping one JSON snapshot per room
//!
//! Writes are serialized per store. A patch that the room rejects leaves
//! the stored room untouched and publishes nothing.

pub mod feed;
mod memory;
mod sqlite;

pub use feed::{Subscribers, Subscription};
pub use memory::InMemoryRoomStore;
pub use sqlite::SqliteRoomStore;

use crate::card::Card;
use crate::error::BingoError;
use crate::game::ledger::WinnersLedger;
use crate::room::{JoinOutcome, Player, PlayerId, Room, RoomCode, RoomSettings, RoomStatus};

pub(crate) const LOG_TARGET: &str = "bingo::store";

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("room {0} not found")]
    NotFound(RoomCode),
    #[error("room {0} already exists")]
    AlreadyExists(RoomCode),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("room snapshot could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("could not determine data directory")]
    NoDataDirectory,
    #[error("failed to create data directory: {0}")]
    CreateDirFailed(#[source] std::io::Error),
    #[error("database schema version {found} is newer than supported version {supported}")]
    FutureSchemaVersion { found: u32, supported: u32 },
    #[error("no free room code after {attempts} attempts")]
    NoFreeCode { attempts: usize },
    /// The room refused the change
    #[error(transparent)]
    Rejected(#[from] BingoError),
}

/// Shared room state collaborator.
pub trait RoomStore: Send + Sync {
    /// Create a room in the lobby with `host` as its first player.
    fn create_room(
        &self,
        code: RoomCode,
        host: Player,
        settings: RoomSettings,
    ) -> Result<Room, StoreError>;

    /// Add a player to a room, following the room's join rules.
    fn join_room(&self, code: &RoomCode, player: Player) -> Result<JoinOutcome, StoreError>;

    /// Follow a room. The current snapshot is delivered first.
    fn subscribe(&self, code: &RoomCode) -> Result<Subscription, StoreError>;

    /// Apply a partial update and return the committed room.
    fn patch_room(&self, code: &RoomCode, patch: RoomPatch) -> Result<Room, StoreError>;

    fn load_room(&self, code: &RoomCode) -> Result<Option<Room>, StoreError>;
}

/// A partial room update. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomPatch {
    pub status: Option<RoomStatus>,
    pub settings: Option<RoomSettings>,
    pub drawn_numbers: Option<Vec<u8>>,
    /// `Some(None)` clears the last drawn ball
    pub last_drawn: Option<Option<u8>>,
    pub players: Option<Vec<Player>>,
    pub winners: Option<WinnersLedger>,
    /// Replace one player's cards
    pub player_cards: Option<(PlayerId, Vec<Card>)>,
    /// Cards to hand out, checked against the card ceiling at commit time
    pub new_cards: Vec<(PlayerId, Card)>,
}

impl RoomPatch {
    /// Everything a draw, settle or reset changes.
    pub fn game_state(room: &Room) -> Self {
        Self {
            status: Some(room.status()),
            drawn_numbers: Some(room.drawn_numbers().to_vec()),
            last_drawn: Some(room.last_drawn()),
            players: Some(room.players().to_vec()),
            winners: Some(room.winners().clone()),
            ..Self::default()
        }
    }

    pub fn player_cards(player_id: PlayerId, cards: Vec<Card>) -> Self {
        Self {
            player_cards: Some((player_id, cards)),
            ..Self::default()
        }
    }

    /// Hand one more card to a player.
    pub fn add_card(player_id: PlayerId, card: Card) -> Self {
        Self {
            new_cards: vec![(player_id, card)],
            ..Self::default()
        }
    }

    pub fn status(status: RoomStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Produce the room that results from applying this patch to `room`.
    ///
    /// Settings go first so the other fields are checked against them.
    /// Status goes last and must follow the room lifecycle; a patch that
    /// clears draws and winners may return the room to the lobby.
    pub fn apply(self, room: &Room) -> Result<Room, BingoError> {
        let mut next = room.clone();
        if let Some(settings) = self.settings {
            next.set_settings(settings)?;
        }
        if let Some(players) = self.players {
            next.set_players(players)?;
        }
        if let Some((player_id, cards)) = self.player_cards {
            next.set_player_cards(player_id, cards)?;
        }
        for (player_id, card) in self.new_cards {
            next.attach_card(player_id, card)?;
        }
        match (self.drawn_numbers, self.last_drawn) {
            (Some(drawn), last) => {
                let last = last.unwrap_or_else(|| drawn.last().copied());
                next.set_draws(drawn, last)?;
            }
            (None, Some(last)) => {
                let drawn = next.drawn_numbers().to_vec();
                next.set_draws(drawn, last)?;
            }
            (None, None) => {}
        }
        if let Some(winners) = self.winners {
            next.set_winners(winners)?;
        }
        if let Some(status) = self.status {
            next.change_status(status)?;
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{generate_with_rng, Format};
    use crate::error::Precondition;
    use crate::game::arbitrator;
    use crate::game::ledger::WinnersLedger;
    use crate::game::WinType;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn lobby(rng: &mut StdRng) -> Room {
        let host = Player::new("Host", rng);
        Room::new(RoomCode::generate(rng), host, RoomSettings::default()).unwrap()
    }

    fn ninety_ball_lobby(rng: &mut StdRng) -> Room {
        let settings = RoomSettings {
            format: Format::Ball90,
            win_conditions: [WinType::FullHouse].into_iter().collect(),
            ..RoomSettings::default()
        };
        Room::new(RoomCode::generate(rng), Player::new("Host", rng), settings).unwrap()
    }

    /// A playing room whose only card has paid out LINE and FULL_HOUSE.
    fn room_with_winners(rng: &mut StdRng) -> Room {
        let mut room = lobby(rng);
        let card_id = room.issue_card(room.host_id(), rng).unwrap();
        room.start().unwrap();
        let numbers = room.players()[0].card(card_id).unwrap().numbers();
        for ball in numbers {
            room = arbitrator::apply_draw(&room, ball).unwrap().room;
        }
        assert_eq!(room.winners().len(), 2);
        room
    }

    fn winners_patch(ledger: WinnersLedger) -> RoomPatch {
        RoomPatch {
            winners: Some(ledger),
            ..RoomPatch::default()
        }
    }

    #[test]
    fn test_empty_patch_changes_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        let room = lobby(&mut rng);
        let patch = RoomPatch::default();
        assert!(patch.is_empty());
        assert_eq!(patch.apply(&room).unwrap(), room);
    }

    #[test]
    fn test_game_state_patch_reproduces_draw() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut room = lobby(&mut rng);
        room.issue_card(room.host_id(), &mut rng).unwrap();
        room.start().unwrap();
        let drawn = arbitrator::draw_next(&room, &mut rng).unwrap().room;

        let patched = RoomPatch::game_state(&drawn).apply(&room).unwrap();
        assert_eq!(patched, drawn);
    }

    #[test]
    fn test_add_card_respects_ceiling() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut room = lobby(&mut rng);
        let host = room.host_id();
        for _ in 0..room.settings().max_cards_per_player {
            room.issue_card(host, &mut rng).unwrap();
        }
        let card = generate_with_rng(Format::Ball75, &mut rng);
        let result = RoomPatch::add_card(host, card).apply(&room);
        assert!(matches!(result, Err(BingoError::CapacityExceeded { .. })));
    }

    #[test]
    fn test_duplicate_draws_rejected() {
        let mut rng = StdRng::seed_from_u64(4);
        let room = lobby(&mut rng);
        let patch = RoomPatch {
            drawn_numbers: Some(vec![5, 9, 5]),
            ..RoomPatch::default()
        };
        assert_eq!(
            patch.apply(&room),
            Err(BingoError::Precondition(Precondition::BallAlreadyDrawn(5)))
        );
    }

    #[test]
    fn test_settings_patch_rechecks_cards() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut room = lobby(&mut rng);
        room.issue_card(room.host_id(), &mut rng).unwrap();
        let patch = RoomPatch {
            settings: Some(RoomSettings {
                format: Format::Ball90,
                win_conditions: [crate::game::WinType::FullHouse].into_iter().collect(),
                ..RoomSettings::default()
            }),
            ..RoomPatch::default()
        };
        assert!(matches!(
            patch.apply(&room),
            Err(BingoError::Precondition(Precondition::FormatMismatch { .. }))
        ));
    }

    #[test]
    fn test_settings_fixed_after_start() {
        let mut rng = StdRng::seed_from_u64(6);
        let room = ninety_ball_lobby(&mut rng);
        let room = RoomPatch::status(RoomStatus::Playing).apply(&room).unwrap();
        let room = RoomPatch {
            drawn_numbers: Some(vec![88]),
            ..RoomPatch::default()
        }
        .apply(&room)
        .unwrap();

        let patch = RoomPatch {
            settings: Some(RoomSettings::default()),
            ..RoomPatch::default()
        };
        assert_eq!(
            patch.apply(&room),
            Err(BingoError::Precondition(Precondition::InvalidTransition {
                action: "change the settings of",
                from: RoomStatus::Playing
            }))
        );
    }

    #[test]
    fn test_settings_patch_rechecks_draws() {
        let mut rng = StdRng::seed_from_u64(7);
        let room = ninety_ball_lobby(&mut rng);
        let room = RoomPatch {
            drawn_numbers: Some(vec![88]),
            ..RoomPatch::default()
        }
        .apply(&room)
        .unwrap();

        let patch = RoomPatch {
            settings: Some(RoomSettings::default()),
            ..RoomPatch::default()
        };
        assert_eq!(
            patch.apply(&room),
            Err(BingoError::Precondition(Precondition::BallOutOfRange {
                ball: 88,
                max: 75
            }))
        );
    }

    #[test]
    fn test_status_patch_follows_lifecycle() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut room = lobby(&mut rng);
        room.start().unwrap();
        room.finish().unwrap();
        assert_eq!(
            RoomPatch::status(RoomStatus::Playing).apply(&room),
            Err(BingoError::Precondition(Precondition::InvalidTransition {
                action: "resume",
                from: RoomStatus::Finished
            }))
        );

        let room = room_with_winners(&mut rng);
        assert!(matches!(
            RoomPatch::status(RoomStatus::Lobby).apply(&room),
            Err(BingoError::Precondition(Precondition::InvalidTransition { .. }))
        ));
        let reopened = RoomPatch::game_state(&arbitrator::reset(&room))
            .apply(&room)
            .unwrap();
        assert_eq!(reopened.status(), RoomStatus::Lobby);
        assert!(reopened.winners().is_empty());
    }

    #[test]
    fn test_winners_patch_cannot_drop_entries() {
        let mut rng = StdRng::seed_from_u64(9);
        let room = room_with_winners(&mut rng);
        let first = room.winners().entries()[0].clone();

        let result = winners_patch(WinnersLedger::new()).apply(&room);
        assert!(matches!(
            result,
            Err(BingoError::Precondition(Precondition::InvalidWinners(_)))
        ));
        let result = winners_patch(WinnersLedger::from_entries(vec![first])).apply(&room);
        assert!(matches!(
            result,
            Err(BingoError::Precondition(Precondition::InvalidWinners(_)))
        ));
    }

    #[test]
    fn test_winners_patch_checks_entries() {
        let mut rng = StdRng::seed_from_u64(10);
        let room = room_with_winners(&mut rng);
        let existing = room.winners().entries().to_vec();

        let mut stranger_card = existing[0].clone();
        stranger_card.card_id = crate::card::CardId::random(&mut rng);
        let mut entries = existing.clone();
        entries.push(stranger_card.clone());
        assert_eq!(
            winners_patch(WinnersLedger::from_entries(entries)).apply(&room),
            Err(BingoError::Precondition(Precondition::UnknownCard(
                stranger_card.card_id
            )))
        );

        let mut corners = existing[0].clone();
        corners.win_type = WinType::Corners;
        let mut entries = existing;
        entries.push(corners);
        assert!(matches!(
            winners_patch(WinnersLedger::from_entries(entries)).apply(&room),
            Err(BingoError::Precondition(Precondition::InvalidWinners(_)))
        ));
    }
}
