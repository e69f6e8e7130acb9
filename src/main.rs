//! Bingo Hall - host a simulated bingo room
//!
//! Opens a room, seats the guests, deals cards and calls balls until a
//! full house is claimed or the balls run out.

use anyhow::{Context, Result};
use bingo_hall::config::Args;
use bingo_hall::host::{claim_card, HostSession};
use bingo_hall::store::{InMemoryRoomStore, RoomStore, SqliteRoomStore, StoreError};
use bingo_hall::{logging, BingoError, Player, Room, RoomSettings, WinType};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

const LOG_TARGET: &str = "bingo::sim";

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.json)?;
    let settings = args.settings().context("invalid room settings")?;

    match (&args.database, args.persist) {
        (Some(path), _) => {
            let store = SqliteRoomStore::open_at(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            run(Arc::new(store), &args, settings)
        }
        (None, true) => {
            let store = SqliteRoomStore::open().context("failed to open room database")?;
            run(Arc::new(store), &args, settings)
        }
        (None, false) => run(Arc::new(InMemoryRoomStore::new()), &args, settings),
    }
}

fn run<S: RoomStore>(store: Arc<S>, args: &Args, settings: RoomSettings) -> Result<()> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let interval = settings.ball_interval;
    let host = Player::new("Host", &mut rng);
    let draw_rng = StdRng::from_rng(&mut rng);
    let mut session =
        HostSession::open(store.clone(), host, settings, draw_rng).context("failed to open room")?;
    let code = session.code().clone();
    let mut feed = session.subscribe()?;

    for _ in 0..args.cards_per_player {
        session.issue_card().context("failed to deal host card")?;
    }
    for n in 1..args.players {
        let guest = Player::new(format!("Guest {n}"), &mut rng);
        let guest_id = guest.id();
        store.join_room(&code, guest)?;
        for _ in 0..args.cards_per_player {
            claim_card(store.as_ref(), &code, guest_id, &mut rng)
                .with_context(|| format!("failed to deal card to guest {n}"))?;
        }
    }

    let room = session.start()?;
    info!(
        target: LOG_TARGET,
        room = %code,
        format = %room.format(),
        players = room.players().len(),
        cards = room.cards().count(),
        "Game started"
    );

    loop {
        match session.draw() {
            Ok(settlement) => {
                if let Some(ball) = settlement.ball {
                    info!(target: LOG_TARGET, ball, drawn = settlement.room.drawn_numbers().len(), "Ball called");
                }
                for winner in &settlement.new_winners {
                    info!(
                        target: LOG_TARGET,
                        player = %winner.username,
                        card = %winner.card_id,
                        win = winner.win_type.label(),
                        "Winner"
                    );
                }
                if settlement.room.winners().first_of(WinType::FullHouse).is_some() {
                    break;
                }
            }
            Err(StoreError::Rejected(BingoError::Exhausted { format })) => {
                info!(target: LOG_TARGET, %format, "All balls drawn");
                break;
            }
            Err(e) => return Err(e).context("draw failed"),
        }
        debug!(target: LOG_TARGET, updates = feed.drain().len(), "Feed caught up");
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }

    let room = session.finish()?;
    print_ledger(&room);
    Ok(())
}

fn print_ledger(room: &Room) {
    println!(
        "Room {} finished after {} balls",
        room.code(),
        room.drawn_numbers().len()
    );
    if room.winners().is_empty() {
        println!("  no winners");
    }
    for entry in room.winners().entries() {
        println!(
            "  {:<12} {:<10} card {}",
            entry.win_type.label(),
            entry.username,
            entry.card_id
        );
    }
}
