//! Hydrated output records.

use std::collections::BTreeMap;

use chess_core::position::fen_after;
use chess_core::GameRecord;
use serde::Serialize;
use serde_json::Value;
use shakmaty::Color;

use crate::candidate::{color_name, Candidate};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub motif: &'static str,
    pub display_name: String,
    pub game: FindingGame,
    pub replay: ReplayWindow,
    pub position_link: Option<String>,
    pub result_data: BTreeMap<&'static str, ResultValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FindingGame {
    pub white: String,
    pub black: String,
    pub result: String,
    pub date: Option<String>,
    pub link: Option<String>,
    pub white_elo: Option<i32>,
    pub black_elo: Option<i32>,
    pub user_color: &'static str,
    pub pgn: String,
}

/// Minimal replay window: every move, the key position and its FEN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayWindow {
    pub all_moves: Vec<String>,
    pub key_position_index: usize,
    pub fen: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultValue {
    pub value: Value,
    pub label: &'static str,
}

/// Everything `hydrate` needs besides the game record.
pub struct Hydration<'a> {
    pub motif: &'static str,
    pub display_name: &'a str,
    pub user_color: Color,
    /// Requested key position. Clamped to the move list.
    pub key_ply: i64,
    /// Ply appended to the game link, if any.
    pub link_move: Option<usize>,
}

impl<'a> Hydration<'a> {
    /// Anchored on a candidate: key position `candidate.ply + offset`, link at
    /// the candidate's ply.
    pub fn at(
        motif: &'static str,
        display_name: &'a str,
        candidate: &Candidate,
        offset: i64,
    ) -> Self {
        Self {
            motif,
            display_name,
            user_color: candidate.user_color,
            key_ply: candidate.ply as i64 + offset,
            link_move: Some(candidate.ply),
        }
    }
}

/// Build a finding from a game record. Pure; ratings, FEN and the replay
/// window are only computed here.
pub fn hydrate(game: &GameRecord, h: Hydration<'_>) -> Finding {
    let max_index = game.moves.len().saturating_sub(1) as i64;
    let key = h.key_ply.clamp(0, max_index) as usize;
    let fen = fen_after(&game.moves, key);

    let position_link = match (&game.metadata.link, h.link_move) {
        (Some(link), Some(mv)) => Some(format!("{link}?move={mv}")),
        _ => None,
    };

    Finding {
        motif: h.motif,
        display_name: h.display_name.to_string(),
        game: FindingGame {
            white: game.metadata.white.clone(),
            black: game.metadata.black.clone(),
            result: game.metadata.result.to_string(),
            date: game.metadata.date.clone(),
            link: game.metadata.link.clone(),
            white_elo: game.rating(Color::White),
            black_elo: game.rating(Color::Black),
            user_color: color_name(h.user_color),
            pgn: game.pgn.clone(),
        },
        replay: ReplayWindow {
            all_moves: game.moves.clone(),
            key_position_index: key,
            fen,
        },
        position_link,
        result_data: BTreeMap::new(),
    }
}

impl Finding {
    pub fn with_value(mut self, key: &'static str, label: &'static str, value: impl Into<Value>) -> Self {
        self.result_data.insert(
            key,
            ResultValue {
                value: value.into(),
                label,
            },
        );
        self
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.result_data.get(key).map(|v| &v.value)
    }
}

/// Round to one decimal place for presentation.
pub fn one_decimal(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::pgn::parse_pgn;
    use chess_core::position::STARTING_FEN;

    const PGN: &str = r#"[White "alice"]
[Black "bob"]
[Result "1-0"]
[WhiteElo "1400"]
[Link "https://example.org/game/1"]

1. e4 e5 2. Nf3 Nc6 1-0"#;

    #[test]
    fn test_hydrate_clamps_and_links() {
        let game = parse_pgn(PGN).unwrap();
        let finding = hydrate(
            &game,
            Hydration {
                motif: "longest_game",
                display_name: "Longest Game",
                user_color: Color::White,
                key_ply: 99,
                link_move: Some(2),
            },
        );
        assert_eq!(finding.replay.key_position_index, 3);
        assert_eq!(finding.game.white_elo, Some(1400));
        assert_eq!(finding.game.black_elo, None);
        assert_eq!(finding.game.user_color, "white");
        assert_eq!(
            finding.position_link.as_deref(),
            Some("https://example.org/game/1?move=2")
        );
    }

    #[test]
    fn test_hydrate_negative_key_is_start() {
        let game = parse_pgn(PGN).unwrap();
        let finding = hydrate(
            &game,
            Hydration {
                motif: "x",
                display_name: "X",
                user_color: Color::Black,
                key_ply: -4,
                link_move: None,
            },
        )
        .with_value("total", "Total", 3);
        assert_eq!(finding.replay.key_position_index, 0);
        assert_eq!(finding.replay.fen, STARTING_FEN);
        assert_eq!(finding.position_link, None);
        assert_eq!(finding.value("total"), Some(&Value::from(3)));
    }

    #[test]
    fn test_one_decimal() {
        assert_eq!(one_decimal(66.666), 66.7);
        assert_eq!(one_decimal(0.04), 0.0);
    }
}
