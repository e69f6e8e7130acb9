//! Bingo Hall - multiplayer 75-ball and 90-ball bingo
//!
//! Card generation, win evaluation, draw arbitration and the room
//! lifecycle, plus in-memory and SQLite room stores.

pub mod card;
pub mod config;
pub mod error;
pub mod game;
pub mod host;
pub mod logging;
pub mod room;
pub mod store;

pub use card::{Card, CardId, Format};
pub use error::{BingoError, Precondition};
pub use game::arbitrator::{apply_draw, draw_next, reset, settle, Settlement};
pub use game::ledger::{WinnerEntry, WinnersLedger};
pub use game::{WinConditions, WinType};
pub use host::HostSession;
pub use room::{Player, PlayerId, Room, RoomCode, RoomSettings, RoomStatus};
pub use store::{InMemoryRoomStore, RoomPatch, RoomStore, SqliteRoomStore, StoreError};
