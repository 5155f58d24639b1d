//! Board replay and FEN helpers built on shakmaty.

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move, Position};

use crate::error::ChessCoreError;
use crate::game_data::GameRecord;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Resolve one SAN string against `pos`. `ply` is only used for the error.
pub fn parse_san_move(pos: &Chess, san: &str, ply: usize) -> Result<Move, ChessCoreError> {
    let parsed: SanPlus = san.parse().map_err(|_| ChessCoreError::InvalidSan {
        ply,
        san: san.to_string(),
    })?;
    parsed.san.to_move(pos).map_err(|_| ChessCoreError::IllegalMove {
        ply,
        san: san.to_string(),
    })
}

/// Decode a SAN move list from the starting position.
pub fn decode_moves(moves: &[String]) -> Result<Vec<Move>, ChessCoreError> {
    let mut pos = Chess::default();
    let mut decoded = Vec::with_capacity(moves.len());
    for (i, san) in moves.iter().enumerate() {
        let mv = parse_san_move(&pos, san, i + 1)?;
        pos.play_unchecked(mv);
        decoded.push(mv);
    }
    Ok(decoded)
}

/// Position after the first `plies` moves.
pub fn position_after(moves: &[String], plies: usize) -> Result<Chess, ChessCoreError> {
    let mut pos = Chess::default();
    for (i, san) in moves.iter().take(plies).enumerate() {
        let mv = parse_san_move(&pos, san, i + 1)?;
        pos.play_unchecked(mv);
    }
    Ok(pos)
}

pub fn position_from_fen(fen: &str) -> Result<Chess, ChessCoreError> {
    let parsed: Fen = fen
        .parse()
        .map_err(|_| ChessCoreError::InvalidFen(fen.to_string()))?;
    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|_| ChessCoreError::InvalidFen(fen.to_string()))
}

pub fn to_fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Final position of a game: the embedded `CurrentPosition` header when it
/// parses, otherwise `replayed`, otherwise a full replay. `None` if all fail.
pub fn final_position(game: &GameRecord, replayed: Option<&Chess>) -> Option<Chess> {
    if let Some(fen) = game.header("CurrentPosition") {
        if let Ok(pos) = position_from_fen(&fen) {
            return Some(pos);
        }
    }
    match replayed {
        Some(pos) => Some(pos.clone()),
        None => position_after(&game.moves, game.moves.len()).ok(),
    }
}

/// FEN after `plies` moves, falling back to the starting position when the
/// move list cannot be replayed that far.
pub fn fen_after(moves: &[String], plies: usize) -> String {
    position_after(moves, plies)
        .map(|pos| to_fen(&pos))
        .unwrap_or_else(|_| STARTING_FEN.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pgn::parse_pgn;

    fn moves(list: &[&str]) -> Vec<String> {
        list.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_decode_moves_with_markers() {
        let decoded = decode_moves(&moves(&["f3", "e5", "g4", "Qh4#"])).unwrap();
        assert_eq!(decoded.len(), 4);
        let pos = position_after(&moves(&["f3", "e5", "g4", "Qh4#"]), 4).unwrap();
        assert!(pos.is_checkmate());
    }

    #[test]
    fn test_illegal_move_reports_ply() {
        let err = decode_moves(&moves(&["e4", "e5", "Ke3"])).unwrap_err();
        assert_eq!(
            err,
            ChessCoreError::IllegalMove {
                ply: 3,
                san: "Ke3".to_string()
            }
        );
        let err = decode_moves(&moves(&["e4", "??"])).unwrap_err();
        assert!(matches!(err, ChessCoreError::InvalidSan { ply: 2, .. }));
    }

    #[test]
    fn test_fen_round_trip() {
        let pos = position_after(&moves(&["e4"]), 1).unwrap();
        let fen = to_fen(&pos);
        assert_eq!(fen, "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
        assert_eq!(to_fen(&position_from_fen(&fen).unwrap()), fen);
        assert!(position_from_fen("not a fen").is_err());
    }

    #[test]
    fn test_fen_after_falls_back_to_start() {
        assert_eq!(fen_after(&moves(&["e4", "Ke7?"]), 2), STARTING_FEN);
        assert_eq!(fen_after(&[], 0), STARTING_FEN);
    }

    #[test]
    fn test_final_position_prefers_header() {
        let pgn = r#"[White "a"]
[Black "b"]
[Result "0-1"]
[CurrentPosition "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3"]

1. f3 e5 2. g4 Qh4# 0-1"#;
        let game = parse_pgn(pgn).unwrap();
        let pos = final_position(&game, Some(&Chess::default())).unwrap();
        assert!(pos.is_checkmate());

        let mut without_header = game.clone();
        without_header.pgn = "1. f3 e5 2. g4 Qh4# 0-1".to_string();
        assert_eq!(to_fen(&final_position(&without_header, None).unwrap()), to_fen(&pos));
    }

    #[test]
    fn test_final_position_uses_replayed_board_without_header() {
        let mut game = parse_pgn("[White \"a\"]\n[Black \"b\"]\n[Result \"0-1\"]\n\n1. f3 e5 2. g4 Qh4# 0-1").unwrap();
        game.moves.push("Zz9".to_string());
        let replayed = position_after(&game.moves, 4).unwrap();
        let pos = final_position(&game, Some(&replayed)).unwrap();
        assert!(pos.is_checkmate());
        assert!(final_position(&game, None).is_none());
    }
}
