//! Host session
//!
//! The host is the only writer of game state for its room: it starts and
//! pauses the game, draws balls and resets. Draw results are computed
//! locally with [`crate::game::arbitrator`] and committed to the store in
//! one patch. Guests only join and claim cards.

use crate::card::{generate_with_rng, CardId};
use crate::error::BingoError;
use crate::game::arbitrator::{self, Settlement};
use crate::room::{Player, PlayerId, Room, RoomCode, RoomSettings};
use crate::store::{RoomPatch, RoomStore, StoreError, Subscription};
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "bingo::host";

/// Attempts at finding an unused room code before giving up
pub const MAX_CODE_ATTEMPTS: usize = 8;

/// The host's handle on a room it created.
pub struct HostSession<S: RoomStore> {
    store: Arc<S>,
    code: RoomCode,
    host_id: PlayerId,
    rng: StdRng,
}

impl<S: RoomStore> HostSession<S> {
    /// Create a room under a fresh code with `host` as its first player.
    pub fn open(
        store: Arc<S>,
        host: Player,
        settings: RoomSettings,
        mut rng: StdRng,
    ) -> Result<Self, StoreError> {
        let host_id = host.id();
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = RoomCode::generate(&mut rng);
            match store.create_room(code.clone(), host.clone(), settings.clone()) {
                Ok(_) => {
                    info!(target: LOG_TARGET, room = %code, host = %host.username(), "Hosting room");
                    return Ok(Self {
                        store,
                        code,
                        host_id,
                        rng,
                    });
                }
                Err(StoreError::AlreadyExists(_)) => {
                    debug!(target: LOG_TARGET, room = %code, "Room code taken, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Err(StoreError::NoFreeCode {
            attempts: MAX_CODE_ATTEMPTS,
        })
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host_id(&self) -> PlayerId {
        self.host_id
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The committed room.
    pub fn room(&self) -> Result<Room, StoreError> {
        self.store
            .load_room(&self.code)?
            .ok_or_else(|| StoreError::NotFound(self.code.clone()))
    }

    pub fn subscribe(&self) -> Result<Subscription, StoreError> {
        self.store.subscribe(&self.code)
    }

    /// Give the host a card of its own.
    pub fn issue_card(&mut self) -> Result<CardId, StoreError> {
        claim_card(self.store.as_ref(), &self.code, self.host_id, &mut self.rng)
    }

    pub fn start(&self) -> Result<Room, StoreError> {
        self.transition(Room::start)
    }

    pub fn pause(&self) -> Result<Room, StoreError> {
        self.transition(Room::pause)
    }

    pub fn resume(&self) -> Result<Room, StoreError> {
        self.transition(Room::resume)
    }

    pub fn finish(&self) -> Result<Room, StoreError> {
        self.transition(Room::finish)
    }

    /// Draw the next ball as the host.
    pub fn draw(&mut self) -> Result<Settlement, StoreError> {
        self.draw_as(self.host_id)
    }

    /// Draw on behalf of `actor`, refusing anyone but the host.
    pub fn draw_as(&mut self, actor: PlayerId) -> Result<Settlement, StoreError> {
        self.ensure_host(actor, "draw")?;
        let room = self.room()?;
        let settlement = arbitrator::draw_next(&room, &mut self.rng)?;
        self.commit(settlement)
    }

    /// Re-evaluate every card without drawing.
    pub fn settle(&self) -> Result<Settlement, StoreError> {
        let settlement = arbitrator::settle(&self.room()?)?;
        self.commit(settlement)
    }

    /// Clear the round and return the room to the lobby.
    pub fn reset(&self) -> Result<Room, StoreError> {
        let room = arbitrator::reset(&self.room()?);
        self.store
            .patch_room(&self.code, RoomPatch::game_state(&room))
    }

    fn commit(&self, settlement: Settlement) -> Result<Settlement, StoreError> {
        let room = self
            .store
            .patch_room(&self.code, RoomPatch::game_state(&settlement.room))?;
        Ok(Settlement {
            room,
            ..settlement
        })
    }

    fn transition(
        &self,
        apply: impl FnOnce(&mut Room) -> Result<(), BingoError>,
    ) -> Result<Room, StoreError> {
        let mut room = self.room()?;
        apply(&mut room)?;
        let committed = self
            .store
            .patch_room(&self.code, RoomPatch::status(room.status()))?;
        info!(target: LOG_TARGET, room = %self.code, status = %committed.status(), "Room status changed");
        Ok(committed)
    }

    fn ensure_host(&self, actor: PlayerId, action: &str) -> Result<(), BingoError> {
        if actor != self.host_id {
            warn!(target: LOG_TARGET, room = %self.code, %actor, action, "Rejected non-host action");
            return Err(BingoError::NotHost);
        }
        Ok(())
    }
}

/// Claim a new card for `player_id` in the room's format.
///
/// The ceiling is checked before a card is generated and again when the
/// store commits, so two concurrent claims cannot both squeeze past it.
pub fn claim_card<S, R>(
    store: &S,
    code: &RoomCode,
    player_id: PlayerId,
    rng: &mut R,
) -> Result<CardId, StoreError>
where
    S: RoomStore + ?Sized,
    R: Rng + ?Sized,
{
    let room = store
        .load_room(code)?
        .ok_or_else(|| StoreError::NotFound(code.clone()))?;
    room.ensure_card_slot(player_id)?;
    let card = generate_with_rng(room.format(), rng);
    let card_id = card.id();
    store.patch_room(code, RoomPatch::add_card(player_id, card))?;
    debug!(target: LOG_TARGET, room = %code, player = %player_id, card = %card_id, "Card issued");
    Ok(card_id)
}
