//! Draw arbitration for a bingo room
//!
//! The host runs the arbitrator to pick balls and decide who has won.
//! Every operation takes the room by reference and returns a new room
//! value, so a failed draw leaves the caller's room exactly as it was.
//! The ledger only ever grows until a reset: re-settling a room that
//! already paid out produces no new entries.
//!
//! Rooms are checked before any work is done, so a malformed room (for
//! example a deserialized card whose mark mask is the wrong length) is
//! refused with a precondition error rather than partially evaluated.

use super::evaluator::evaluate;
use super::ledger::WinnerEntry;
use crate::error::{BingoError, Precondition};
use crate::room::{Room, RoomStatus};
use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{debug, info};

const LOG_TARGET: &str = "bingo::draw";

/// The room after a draw or settle, plus what changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub room: Room,
    /// The ball drawn in this step; `None` for a plain settle
    pub ball: Option<u8>,
    /// Ledger entries added in this step, in ledger order
    pub new_winners: Vec<WinnerEntry>,
}

/// Draw a uniformly random undrawn ball and settle every card.
///
/// A card that has already won keeps collecting: each further condition it
/// completes gets its own ledger entry.
pub fn draw_next<R: Rng + ?Sized>(room: &Room, rng: &mut R) -> Result<Settlement, BingoError> {
    ensure_status(room, &[RoomStatus::Playing])?;
    room.check_integrity()?;
    let format = room.format();
    let available = room.drawn_set().remaining(format);
    let ball = *available
        .choose(rng)
        .ok_or(BingoError::Exhausted { format })?;
    draw_ball(room, ball)
}

/// Draw a specific ball, e.g. when replaying a recorded game.
pub fn apply_draw(room: &Room, ball: u8) -> Result<Settlement, BingoError> {
    ensure_status(room, &[RoomStatus::Playing])?;
    room.check_integrity()?;
    draw_ball(room, ball)
}

fn draw_ball(room: &Room, ball: u8) -> Result<Settlement, BingoError> {
    let format = room.format();
    if !format.balls().contains(&ball) {
        return Err(Precondition::BallOutOfRange {
            ball,
            max: format.max_ball(),
        }
        .into());
    }
    if room.drawn_set().contains(ball) {
        return Err(Precondition::BallAlreadyDrawn(ball).into());
    }

    let mut next = room.clone();
    next.push_draw(ball);
    if next.settings().auto_mark {
        next.mark_ball(ball);
    }
    let new_winners = settle_cards(&mut next);

    debug!(
        target: LOG_TARGET,
        room = %next.code(),
        ball,
        drawn = next.drawn_numbers().len(),
        "Ball drawn"
    );
    Ok(Settlement {
        room: next,
        ball: Some(ball),
        new_winners,
    })
}

/// Re-evaluate every card against the balls drawn so far.
pub fn settle(room: &Room) -> Result<Settlement, BingoError> {
    ensure_status(room, &[RoomStatus::Playing, RoomStatus::Paused])?;
    room.check_integrity()?;
    let mut next = room.clone();
    let new_winners = settle_cards(&mut next);
    Ok(Settlement {
        room: next,
        ball: None,
        new_winners,
    })
}

/// Clear draws and results and return the room to the lobby.
///
/// Players, card ids and card numbers are kept.
pub fn reset(room: &Room) -> Room {
    let mut next = room.clone();
    next.rewind();
    info!(target: LOG_TARGET, room = %next.code(), "Room reset");
    next
}

fn ensure_status(room: &Room, allowed: &[RoomStatus]) -> Result<(), Precondition> {
    if allowed.contains(&room.status()) {
        Ok(())
    } else {
        Err(Precondition::RoomNotInProgress(room.status()))
    }
}

fn settle_cards(room: &mut Room) -> Vec<WinnerEntry> {
    let drawn = room.drawn_set();
    let enabled = room.settings().win_conditions.clone();
    let code = room.code().clone();
    let (players, winners) = room.players_and_winners_mut();

    let mut fresh = Vec::new();
    for player in players.iter_mut() {
        let player_id = player.id();
        let username = player.username().to_string();
        for card in player.cards_mut() {
            let evaluation = evaluate(card, &drawn, &enabled);
            for &win_type in &evaluation.matched {
                let entry = WinnerEntry {
                    player_id,
                    username: username.clone(),
                    card_id: card.id(),
                    win_type,
                };
                if winners.record(entry.clone()) {
                    info!(
                        target: LOG_TARGET,
                        room = %code,
                        player = %entry.username,
                        card = %entry.card_id,
                        win = %win_type,
                        "New winner"
                    );
                    fresh.push(entry);
                }
            }
            card.apply(&evaluation);
        }
    }
    fresh
}
