//! Room management for multiplayer bingo
//!
//! Handles:
//! - Room codes players use to find a room
//! - Player list management and join rules
//! - Per-player card issuance under the room's card ceiling
//! - The lobby -> playing -> paused -> finished lifecycle
//!
//! Drawing and settling live in [`crate::game::arbitrator`]; this module
//! owns the aggregate those operations read and produce.

use crate::card::{generate_with_rng, Card, CardId, Format};
use crate::error::{BingoError, Precondition};
use crate::game::balls::BallSet;
use crate::game::ledger::WinnersLedger;
use crate::game::{WinConditions, WinType};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Length of a room code
pub const ROOM_CODE_LENGTH: usize = 6;

/// Room code characters; 0/O and 1/I are left out so codes read aloud cleanly
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Default card ceiling per player
pub const DEFAULT_MAX_CARDS: u8 = 4;

/// Opaque player identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        PlayerId(uuid::Builder::from_random_bytes(rng.random()).into_uuid())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// The shared code players type to join a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Generate a random room code.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..ROOM_CODE_LENGTH)
            .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
            .collect();
        RoomCode(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RoomCode {
    type Err = Precondition;

    /// Parse a code typed by a player; case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        let valid = code.len() == ROOM_CODE_LENGTH
            && code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b));
        if valid {
            Ok(RoomCode(code))
        } else {
            Err(Precondition::InvalidRoomCode(s.to_string()))
        }
    }
}

impl TryFrom<String> for RoomCode {
    type Error = Precondition;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a room is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Players are joining and picking cards
    Lobby,
    /// Balls are being drawn
    Playing,
    /// Drawing is suspended
    Paused,
    /// The round is over
    Finished,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoomStatus::Lobby => "lobby",
            RoomStatus::Playing => "playing",
            RoomStatus::Paused => "paused",
            RoomStatus::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Host-chosen rules for a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSettings {
    pub format: Format,
    pub max_cards_per_player: u8,
    pub win_conditions: WinConditions,
    /// Mark drawn numbers on every card automatically
    pub auto_mark: bool,
    /// Pause between automatic draws; zero means the host draws by hand
    pub ball_interval: Duration,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            format: Format::Ball75,
            max_cards_per_player: DEFAULT_MAX_CARDS,
            win_conditions: [WinType::Line, WinType::FullHouse].into_iter().collect(),
            auto_mark: true,
            ball_interval: Duration::ZERO,
        }
    }
}

impl RoomSettings {
    pub fn validate(&self) -> Result<(), Precondition> {
        if self.max_cards_per_player == 0 {
            return Err(Precondition::InvalidSettings(
                "players must be allowed at least one card".to_string(),
            ));
        }
        if !self.win_conditions.iter().any(|w| w.applies_to(self.format)) {
            return Err(Precondition::InvalidSettings(format!(
                "none of the enabled win conditions can occur in {} bingo",
                self.format
            )));
        }
        Ok(())
    }
}

/// A player in a room and the cards they hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    username: String,
    is_host: bool,
    cards: Vec<Card>,
}

impl Player {
    /// A new player with a fresh id and no cards.
    pub fn new<R: Rng + ?Sized>(username: impl Into<String>, rng: &mut R) -> Self {
        Self::with_id(PlayerId::random(rng), username)
    }

    /// A player with a known id, e.g. one rejoining from a saved session.
    pub fn with_id(id: PlayerId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            is_host: false,
            cards: Vec::new(),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_host(&self) -> bool {
        self.is_host
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, card_id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id() == card_id)
    }

    pub(crate) fn cards_mut(&mut self) -> &mut [Card] {
        &mut self.cards
    }
}

/// Result of a successful join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The player was added to the room
    Joined,
    /// The player was already in the room; nothing changed
    Rejoined,
}

/// The room aggregate: settings, players, draws and the winners ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    code: RoomCode,
    host_id: PlayerId,
    status: RoomStatus,
    settings: RoomSettings,
    drawn_numbers: Vec<u8>,
    last_drawn: Option<u8>,
    players: Vec<Player>,
    winners: WinnersLedger,
}

impl Room {
    /// Open a room in the lobby with `host` as its first player.
    pub fn new(code: RoomCode, mut host: Player, settings: RoomSettings) -> Result<Self, BingoError> {
        settings.validate()?;
        host.is_host = true;
        check_cards(&host, &settings)?;
        Ok(Self {
            code,
            host_id: host.id,
            status: RoomStatus::Lobby,
            settings,
            drawn_numbers: Vec::new(),
            last_drawn: None,
            players: vec![host],
            winners: WinnersLedger::new(),
        })
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host_id(&self) -> PlayerId {
        self.host_id
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    pub fn format(&self) -> Format {
        self.settings.format
    }

    /// Balls in the order they were drawn.
    pub fn drawn_numbers(&self) -> &[u8] {
        &self.drawn_numbers
    }

    pub fn last_drawn(&self) -> Option<u8> {
        self.last_drawn
    }

    pub fn drawn_set(&self) -> BallSet {
        BallSet::from(self.drawn_numbers.as_slice())
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn winners(&self) -> &WinnersLedger {
        &self.winners
    }

    /// Every card in the room with its owner.
    pub fn cards(&self) -> impl Iterator<Item = (&Player, &Card)> + '_ {
        self.players
            .iter()
            .flat_map(|p| p.cards.iter().map(move |c| (p, c)))
    }

    /// Admit a player. Only possible while the room is in the lobby.
    ///
    /// A player rejoining with the same id is accepted without being added
    /// twice; a different player may not take a name already in use.
    pub fn admit(&mut self, player: Player) -> Result<JoinOutcome, BingoError> {
        if self.status != RoomStatus::Lobby {
            return Err(BingoError::JoinClosed);
        }
        if self.player(player.id).is_some() {
            return Ok(JoinOutcome::Rejoined);
        }
        if self.players.iter().any(|p| p.username == player.username) {
            return Err(BingoError::UsernameTaken(player.username));
        }
        let mut player = player;
        player.is_host = false;
        check_cards(&player, &self.settings)?;
        self.players.push(player);
        Ok(JoinOutcome::Joined)
    }

    /// Fail if the player cannot take another card right now.
    ///
    /// Cards are only handed out in the lobby, up to the room's ceiling.
    pub fn ensure_card_slot(&self, player_id: PlayerId) -> Result<(), BingoError> {
        if self.status != RoomStatus::Lobby {
            return Err(BingoError::JoinClosed);
        }
        let player = self
            .player(player_id)
            .ok_or(Precondition::UnknownPlayer(player_id))?;
        let max = self.settings.max_cards_per_player;
        if player.cards.len() >= max as usize {
            return Err(BingoError::CapacityExceeded {
                player: player_id,
                max,
            });
        }
        Ok(())
    }

    /// Generate a card in the room's format and hand it to the player.
    pub fn issue_card<R: Rng + ?Sized>(
        &mut self,
        player_id: PlayerId,
        rng: &mut R,
    ) -> Result<CardId, BingoError> {
        self.ensure_card_slot(player_id)?;
        let card = generate_with_rng(self.settings.format, rng);
        let id = card.id();
        self.attach_card(player_id, card)?;
        Ok(id)
    }

    /// Hand an existing card to the player, enforcing format and the card ceiling.
    pub fn attach_card(&mut self, player_id: PlayerId, card: Card) -> Result<(), BingoError> {
        self.ensure_card_slot(player_id)?;
        check_card(&card, self.settings.format)?;
        if self.cards().any(|(_, c)| c.id() == card.id()) {
            return Err(Precondition::MalformedCard(format!(
                "card {} is already in this room",
                card.id()
            ))
            .into());
        }
        let player = self.player_mut(player_id)?;
        player.cards.push(card);
        Ok(())
    }

    /// Toggle a mark on one of the player's cards.
    pub fn toggle_mark(
        &mut self,
        player_id: PlayerId,
        card_id: CardId,
        index: usize,
    ) -> Result<bool, BingoError> {
        let card = self
            .player_mut(player_id)?
            .cards
            .iter_mut()
            .find(|c| c.id() == card_id)
            .ok_or(Precondition::UnknownCard(card_id))?;
        Ok(card.toggle_mark(index)?)
    }

    pub fn start(&mut self) -> Result<(), BingoError> {
        self.transition("start", &[RoomStatus::Lobby], RoomStatus::Playing)
    }

    pub fn pause(&mut self) -> Result<(), BingoError> {
        self.transition("pause", &[RoomStatus::Playing], RoomStatus::Paused)
    }

    pub fn resume(&mut self) -> Result<(), BingoError> {
        self.transition("resume", &[RoomStatus::Paused], RoomStatus::Playing)
    }

    pub fn finish(&mut self) -> Result<(), BingoError> {
        self.transition(
            "finish",
            &[RoomStatus::Playing, RoomStatus::Paused],
            RoomStatus::Finished,
        )
    }

    fn transition(
        &mut self,
        action: &'static str,
        from: &[RoomStatus],
        to: RoomStatus,
    ) -> Result<(), BingoError> {
        if !from.contains(&self.status) {
            return Err(Precondition::InvalidTransition {
                action,
                from: self.status,
            }
            .into());
        }
        self.status = to;
        Ok(())
    }

    fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, Precondition> {
        self.players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(Precondition::UnknownPlayer(id))
    }

    // Crate-internal mutation used by the arbitrator and store patches

    pub(crate) fn push_draw(&mut self, ball: u8) {
        self.drawn_numbers.push(ball);
        self.last_drawn = Some(ball);
    }

    pub(crate) fn mark_ball(&mut self, ball: u8) {
        for player in self.players.iter_mut() {
            for card in player.cards.iter_mut() {
                card.mark_ball(ball);
            }
        }
    }

    /// Split borrow for settling: every player's cards plus the ledger.
    pub(crate) fn players_and_winners_mut(&mut self) -> (&mut [Player], &mut WinnersLedger) {
        (self.players.as_mut_slice(), &mut self.winners)
    }

    /// Clear draws and results; card ids and numbers survive.
    pub(crate) fn rewind(&mut self) {
        self.drawn_numbers.clear();
        self.last_drawn = None;
        self.winners.clear();
        for player in self.players.iter_mut() {
            for card in player.cards.iter_mut() {
                card.rewind();
            }
        }
        self.status = RoomStatus::Lobby;
    }

    /// Move to `to` along the lifecycle. Going back to the lobby is only
    /// allowed once draws and winners have been cleared.
    pub(crate) fn change_status(&mut self, to: RoomStatus) -> Result<(), BingoError> {
        match to {
            _ if to == self.status => Ok(()),
            RoomStatus::Playing if self.status == RoomStatus::Lobby => self.start(),
            RoomStatus::Playing => self.resume(),
            RoomStatus::Paused => self.pause(),
            RoomStatus::Finished => self.finish(),
            RoomStatus::Lobby => {
                if !self.drawn_numbers.is_empty() || !self.winners.is_empty() {
                    return Err(Precondition::InvalidTransition {
                        action: "reopen",
                        from: self.status,
                    }
                    .into());
                }
                self.status = RoomStatus::Lobby;
                Ok(())
            }
        }
    }

    /// Settings are fixed once the room leaves the lobby.
    pub(crate) fn set_settings(&mut self, settings: RoomSettings) -> Result<(), BingoError> {
        if settings == self.settings {
            return Ok(());
        }
        if self.status != RoomStatus::Lobby {
            return Err(Precondition::InvalidTransition {
                action: "change the settings of",
                from: self.status,
            }
            .into());
        }
        settings.validate()?;
        check_draws(&self.drawn_numbers, settings.format)?;
        for player in &self.players {
            check_cards(player, &settings)?;
        }
        check_winners(&self.winners, &self.players, &settings)?;
        self.settings = settings;
        Ok(())
    }

    pub(crate) fn set_draws(&mut self, drawn: Vec<u8>, last: Option<u8>) -> Result<(), Precondition> {
        check_draws(&drawn, self.settings.format)?;
        if last != drawn.last().copied() {
            return Err(Precondition::InvalidDraws(
                "last drawn ball does not match the draw order".to_string(),
            ));
        }
        self.drawn_numbers = drawn;
        self.last_drawn = last;
        Ok(())
    }

    pub(crate) fn set_players(&mut self, players: Vec<Player>) -> Result<(), BingoError> {
        if !players.iter().any(|p| p.id == self.host_id) {
            return Err(Precondition::UnknownPlayer(self.host_id).into());
        }
        for player in &players {
            check_cards(player, &self.settings)?;
        }
        check_winners(&self.winners, &players, &self.settings)?;
        self.players = players;
        Ok(())
    }

    pub(crate) fn set_player_cards(
        &mut self,
        player_id: PlayerId,
        cards: Vec<Card>,
    ) -> Result<(), BingoError> {
        let settings = self.settings.clone();
        let player = self.player_mut(player_id)?;
        let candidate = Player {
            cards,
            ..player.clone()
        };
        check_cards(&candidate, &settings)?;
        *player = candidate;
        check_winners(&self.winners, &self.players, &settings)?;
        Ok(())
    }

    /// Replace the ledger. Entries can only be appended while balls are
    /// on the board; dropping them needs the draws cleared first.
    pub(crate) fn set_winners(&mut self, winners: WinnersLedger) -> Result<(), Precondition> {
        let appended = winners.entries().starts_with(self.winners.entries());
        if !appended && !self.drawn_numbers.is_empty() {
            return Err(Precondition::InvalidWinners(
                "recorded wins cannot be removed mid-round".to_string(),
            ));
        }
        check_winners(&winners, &self.players, &self.settings)?;
        self.winners = winners;
        Ok(())
    }

    /// Fail fast on a room whose shape the engine cannot trust, e.g. one
    /// deserialized from an untrusted snapshot.
    pub fn check_integrity(&self) -> Result<(), Precondition> {
        self.settings.validate()?;
        check_draws(&self.drawn_numbers, self.settings.format)?;
        if self.last_drawn != self.drawn_numbers.last().copied() {
            return Err(Precondition::InvalidDraws(
                "last drawn ball does not match the draw order".to_string(),
            ));
        }
        if self.player(self.host_id).is_none() {
            return Err(Precondition::UnknownPlayer(self.host_id));
        }
        for (_, card) in self.cards() {
            check_card(card, self.settings.format)?;
        }
        check_winners(&self.winners, &self.players, &self.settings)
    }
}

fn check_card(card: &Card, format: Format) -> Result<(), Precondition> {
    if card.format() != format {
        return Err(Precondition::FormatMismatch {
            card: card.format(),
            room: format,
        });
    }
    card.check_shape()
}

fn check_cards(player: &Player, settings: &RoomSettings) -> Result<(), BingoError> {
    let max = settings.max_cards_per_player;
    if player.cards.len() > max as usize {
        return Err(BingoError::CapacityExceeded {
            player: player.id,
            max,
        });
    }
    for card in &player.cards {
        check_card(card, settings.format)?;
    }
    Ok(())
}

/// Every entry must name a card its player holds and a condition the room plays.
fn check_winners(
    winners: &WinnersLedger,
    players: &[Player],
    settings: &RoomSettings,
) -> Result<(), Precondition> {
    for entry in winners.entries() {
        let player = players
            .iter()
            .find(|p| p.id == entry.player_id)
            .ok_or(Precondition::UnknownPlayer(entry.player_id))?;
        if player.card(entry.card_id).is_none() {
            return Err(Precondition::UnknownCard(entry.card_id));
        }
        let enabled = settings.win_conditions.contains(&entry.win_type)
            && entry.win_type.applies_to(settings.format);
        if !enabled {
            return Err(Precondition::InvalidWinners(format!(
                "{} is not played in this room",
                entry.win_type
            )));
        }
    }
    Ok(())
}

fn check_draws(drawn: &[u8], format: Format) -> Result<(), Precondition> {
    let mut seen = BallSet::new();
    for &ball in drawn {
        if !format.balls().contains(&ball) {
            return Err(Precondition::BallOutOfRange {
                ball,
                max: format.max_ball(),
            });
        }
        if !seen.insert(ball) {
            return Err(Precondition::BallAlreadyDrawn(ball));
        }
    }
    Ok(())
}
