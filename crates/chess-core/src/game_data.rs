use serde::{Deserialize, Serialize};
use shakmaty::Color;
use std::fmt;

use crate::error::ChessCoreError;
use crate::pgn;

/// Result code from the `Result` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    #[serde(rename = "1-0")]
    WhiteWon,
    #[serde(rename = "0-1")]
    BlackWon,
    #[serde(rename = "1/2-1/2")]
    Draw,
    #[serde(rename = "*")]
    Unfinished,
}

impl GameResult {
    /// Parse a result code. Anything unrecognised counts as unfinished.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1-0" => GameResult::WhiteWon,
            "0-1" => GameResult::BlackWon,
            "1/2-1/2" => GameResult::Draw,
            _ => GameResult::Unfinished,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameResult::WhiteWon => "1-0",
            GameResult::BlackWon => "0-1",
            GameResult::Draw => "1/2-1/2",
            GameResult::Unfinished => "*",
        }
    }

    pub fn winner(&self) -> Option<Color> {
        match self {
            GameResult::WhiteWon => Some(Color::White),
            GameResult::BlackWon => Some(Color::Black),
            GameResult::Draw | GameResult::Unfinished => None,
        }
    }

    pub fn is_draw(&self) -> bool {
        *self == GameResult::Draw
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: GameResult,
    pub date: Option<String>,
    pub time_control: Option<String>, // "600", "180+2", "1/259200"
    pub eco: Option<String>,
    pub event: Option<String>,
    pub link: Option<String>,
}

impl GameMetadata {
    /// Base time in seconds, taken from the part before any `+`.
    pub fn base_seconds(&self) -> Option<f64> {
        let tc = self.time_control.as_deref()?;
        parse_time_control(tc).ok().map(|(base, _)| base)
    }

    /// Daily/correspondence games: a `/` in the time control or more than an hour of base time.
    pub fn is_daily(&self) -> bool {
        match self.time_control.as_deref() {
            Some(tc) if tc.contains('/') => true,
            Some(_) => self.base_seconds().is_some_and(|base| base > 3600.0),
            None => false,
        }
    }
}

/// One completed game. Built once by the producer and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub metadata: GameMetadata,
    pub moves: Vec<String>, // SAN, one entry per ply
    pub pgn: String,        // raw text, headers and clock comments included
}

impl GameRecord {
    /// Side played by `username` (case-insensitive), if any.
    pub fn user_color(&self, username: &str) -> Option<Color> {
        let username = username.to_lowercase();
        if self.metadata.white.to_lowercase() == username {
            Some(Color::White)
        } else if self.metadata.black.to_lowercase() == username {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn ply_count(&self) -> usize {
        self.moves.len()
    }

    pub fn last_move(&self) -> Option<&str> {
        self.moves.last().map(String::as_str)
    }

    /// The last move carries a mate marker.
    pub fn ends_in_checkmate(&self) -> bool {
        self.last_move().is_some_and(|m| m.contains('#'))
    }

    pub fn won_by(&self, color: Color) -> bool {
        self.metadata.result.winner() == Some(color)
    }

    pub fn lost_by(&self, color: Color) -> bool {
        self.metadata.result.winner() == Some(!color)
    }

    /// The final ply was played by `color`.
    pub fn last_move_by(&self, color: Color) -> bool {
        let plies = self.moves.len();
        plies > 0 && mover_of_ply(plies) == color
    }

    pub fn header(&self, name: &str) -> Option<String> {
        pgn::extract_header(&self.pgn, name)
    }

    pub fn header_int(&self, name: &str) -> Option<i32> {
        pgn::extract_header_int(&self.pgn, name)
    }

    pub fn rating(&self, color: Color) -> Option<i32> {
        self.header_int(color.fold_wb("WhiteElo", "BlackElo"))
    }

    pub fn termination(&self) -> Option<String> {
        self.header("Termination")
    }

    /// Termination header mentions `needle`, case-insensitively.
    pub fn terminated_by(&self, needle: &str) -> bool {
        self.termination()
            .is_some_and(|t| t.to_lowercase().contains(&needle.to_lowercase()))
    }
}

/// Split a `base` or `base+increment` time control into seconds.
pub fn parse_time_control(tc: &str) -> Result<(f64, f64), ChessCoreError> {
    let malformed = || ChessCoreError::MalformedTimeControl(tc.to_string());
    let (base, increment) = match tc.split_once('+') {
        Some((base, inc)) => (base, Some(inc)),
        None => (tc, None),
    };
    let base = base.trim().parse::<f64>().map_err(|_| malformed())?;
    let increment = match increment {
        Some(inc) => inc.trim().parse::<f64>().map_err(|_| malformed())?,
        None => 0.0,
    };
    Ok((base, increment))
}

/// Side that plays the 1-indexed `ply`.
pub fn mover_of_ply(ply: usize) -> Color {
    if ply % 2 == 1 {
        Color::White
    } else {
        Color::Black
    }
}

/// Full-move number containing the 1-indexed `ply`.
pub fn full_moves(ply: usize) -> usize {
    (ply + 1) / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(result: &str, moves: &[&str], time_control: Option<&str>) -> GameRecord {
        GameRecord {
            metadata: GameMetadata {
                white: "Alice".to_string(),
                black: "bob".to_string(),
                result: GameResult::from_code(result),
                date: None,
                time_control: time_control.map(str::to_string),
                eco: None,
                event: None,
                link: None,
            },
            moves: moves.iter().map(|m| m.to_string()).collect(),
            pgn: "[Termination \"bob won by Resignation\"]\n[WhiteElo \"1510\"]".to_string(),
        }
    }

    #[test]
    fn test_user_color_is_case_insensitive() {
        let game = record("1-0", &["e4"], None);
        assert_eq!(game.user_color("alice"), Some(Color::White));
        assert_eq!(game.user_color("BOB"), Some(Color::Black));
        assert_eq!(game.user_color("carol"), None);
    }

    #[test]
    fn test_result_helpers() {
        let game = record("0-1", &["f3", "e5", "g4", "Qh4#"], None);
        assert!(game.won_by(Color::Black));
        assert!(game.lost_by(Color::White));
        assert!(game.ends_in_checkmate());
        assert!(game.last_move_by(Color::Black));
        assert!(!game.last_move_by(Color::White));
    }

    #[test]
    fn test_time_control_parsing() {
        assert_eq!(record("*", &[], Some("180+2")).metadata.base_seconds(), Some(180.0));
        assert_eq!(record("*", &[], Some("30")).metadata.base_seconds(), Some(30.0));
        assert_eq!(record("*", &[], Some("-")).metadata.base_seconds(), None);
        assert!(record("*", &[], Some("1/259200")).metadata.is_daily());
        assert!(record("*", &[], Some("7200")).metadata.is_daily());
        assert!(!record("*", &[], Some("600+5")).metadata.is_daily());

        assert_eq!(parse_time_control("180+2"), Ok((180.0, 2.0)));
        assert_eq!(
            parse_time_control("1/259200"),
            Err(ChessCoreError::MalformedTimeControl("1/259200".to_string()))
        );
    }

    #[test]
    fn test_header_lookups() {
        let game = record("0-1", &[], None);
        assert_eq!(game.rating(Color::White), Some(1510));
        assert_eq!(game.rating(Color::Black), None);
        assert!(game.terminated_by("resignation"));
        assert!(!game.terminated_by("time"));
    }

    #[test]
    fn test_ply_arithmetic() {
        assert_eq!(mover_of_ply(1), Color::White);
        assert_eq!(mover_of_ply(4), Color::Black);
        assert_eq!(full_moves(1), 1);
        assert_eq!(full_moves(2), 1);
        assert_eq!(full_moves(9), 5);
    }
}
