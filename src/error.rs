//! Error taxonomy for the bingo engine
//!
//! `Exhausted` and `CapacityExceeded` are ordinary outcomes the host must
//! handle. `Precondition` means the caller handed the engine something it
//! should never have seen; no partial evaluation is attempted.

use crate::card::{CardId, Format};
use crate::room::{PlayerId, RoomStatus};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BingoError {
    /// Every ball of the format has been drawn
    #[error("all {format} balls have been drawn")]
    Exhausted { format: Format },
    /// The player already holds the room's maximum number of cards
    #[error("player {player} already holds the maximum of {max} cards")]
    CapacityExceeded { player: PlayerId, max: u8 },
    /// The room has left the lobby
    #[error("the game has already started")]
    JoinClosed,
    /// Another player in the room uses this name
    #[error("username {0:?} is already in use in this room")]
    UsernameTaken(String),
    /// Only the room's host may draw, start, pause or reset
    #[error("only the host may do that")]
    NotHost,
    #[error(transparent)]
    Precondition(#[from] Precondition),
}

/// Programmer errors: inputs that violate the engine's contracts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Precondition {
    #[error("room is {0}, not playing")]
    RoomNotInProgress(RoomStatus),
    #[error("cannot {action} a room that is {from}")]
    InvalidTransition {
        action: &'static str,
        from: RoomStatus,
    },
    #[error("malformed card: {0}")]
    MalformedCard(String),
    #[error("{card} card does not fit a {room} room")]
    FormatMismatch { card: Format, room: Format },
    #[error("ball {ball} is outside 1..={max}")]
    BallOutOfRange { ball: u8, max: u8 },
    #[error("ball {0} has already been drawn")]
    BallAlreadyDrawn(u8),
    #[error("drawn numbers are invalid: {0}")]
    InvalidDraws(String),
    #[error("winners ledger is invalid: {0}")]
    InvalidWinners(String),
    #[error("no player {0} in this room")]
    UnknownPlayer(PlayerId),
    #[error("no card {0} in this room")]
    UnknownCard(CardId),
    #[error("cell {0} cannot be marked")]
    UnmarkableCell(usize),
    #[error("invalid room code {0:?}")]
    InvalidRoomCode(String),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}
