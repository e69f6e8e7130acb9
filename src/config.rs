//! Command-line and environment configuration

use crate::card::Format;
use crate::error::Precondition;
use crate::game::{WinConditions, WinType};
use crate::room::{RoomSettings, DEFAULT_MAX_CARDS};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "bingo-hall")]
#[command(about = "Host a simulated bingo room from lobby to full house", long_about = None)]
pub struct Args {
    /// Bingo format: 75 or 90
    #[arg(long, env = "BINGO_FORMAT", default_value = "75")]
    pub format: Format,

    /// Players in the room, host included
    #[arg(long, env = "BINGO_PLAYERS", default_value_t = 4,
          value_parser = clap::value_parser!(u8).range(1..))]
    pub players: u8,

    /// Cards each player claims before the game starts
    #[arg(long, env = "BINGO_CARDS_PER_PLAYER", default_value_t = 2)]
    pub cards_per_player: u8,

    /// Most cards a single player may hold
    #[arg(long, env = "BINGO_MAX_CARDS", default_value_t = DEFAULT_MAX_CARDS)]
    pub max_cards: u8,

    /// Win conditions the room pays out on, comma separated
    #[arg(long = "win", env = "BINGO_WIN_CONDITIONS", value_delimiter = ',',
          default_value = "line,full_house")]
    pub win_conditions: Vec<WinType>,

    /// Leave marking to the players instead of marking drawn balls automatically
    #[arg(long, env = "BINGO_NO_AUTO_MARK", default_value_t = false)]
    pub no_auto_mark: bool,

    /// Milliseconds to wait between draws
    #[arg(long, env = "BINGO_BALL_INTERVAL_MS", default_value_t = 0)]
    pub ball_interval_ms: u64,

    /// RNG seed for a reproducible game
    #[arg(long, env = "BINGO_SEED")]
    pub seed: Option<u64>,

    /// SQLite database file; rooms are kept in memory when omitted
    #[arg(long, env = "BINGO_DB")]
    pub database: Option<PathBuf>,

    /// Store rooms in the default data directory database
    #[arg(long, conflicts_with = "database", default_value_t = false)]
    pub persist: bool,

    /// Toggle structured (JSON) logs
    #[arg(long, env = "BINGO_LOG_JSON", default_value_t = false)]
    pub json: bool,
}

impl Args {
    /// Room settings described by these arguments.
    pub fn settings(&self) -> Result<RoomSettings, Precondition> {
        if self.cards_per_player > self.max_cards {
            return Err(Precondition::InvalidSettings(format!(
                "{} cards per player exceeds the maximum of {}",
                self.cards_per_player, self.max_cards
            )));
        }
        let win_conditions: WinConditions = self.win_conditions.iter().copied().collect();
        let settings = RoomSettings {
            format: self.format,
            max_cards_per_player: self.max_cards,
            win_conditions,
            auto_mark: !self.no_auto_mark,
            ball_interval: Duration::from_millis(self.ball_interval_ms),
        };
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("bingo-hall").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_flags_map_to_settings() {
        let args = parse(&[
            "--format", "75", "--win", "corners,line", "--max-cards", "6", "--cards-per-player",
            "3", "--no-auto-mark", "--ball-interval-ms", "250",
        ]);
        let settings = args.settings().unwrap();
        assert_eq!(settings.format, Format::Ball75);
        assert_eq!(settings.max_cards_per_player, 6);
        assert_eq!(
            settings.win_conditions.into_iter().collect::<Vec<_>>(),
            vec![WinType::Line, WinType::Corners]
        );
        assert!(!settings.auto_mark);
        assert_eq!(settings.ball_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_more_cards_than_allowed_rejected() {
        let args = parse(&["--cards-per-player", "5", "--max-cards", "4"]);
        assert!(matches!(
            args.settings(),
            Err(Precondition::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_ninety_ball_needs_full_house() {
        let args = parse(&["--format", "90", "--win", "line"]);
        assert!(args.settings().is_err());
        let args = parse(&["--format", "90", "--win", "full-house"]);
        assert!(args.settings().is_ok());
    }

    #[test]
    fn test_bad_values_rejected_by_parser() {
        let bad: [&[&str]; 3] = [&["--format", "80"], &["--win", "bingo"], &["--players", "0"]];
        for args in bad {
            let result = Args::try_parse_from(std::iter::once("bingo-hall").chain(args.iter().copied()));
            assert!(result.is_err());
        }
    }
}
