#![allow(dead_code)]

use chess_core::pgn::parse_pgn;
use chess_core::GameRecord;

pub const USER: &str = "alice";

/// 1. e4 e5 2. Bc4 Nc6 3. Qh5 Nf6 4. Qxf7#
pub const SCHOLARS_MATE: &str = "1. e4 e5 2. Bc4 Nc6 3. Qh5 Nf6 4. Qxf7#";
/// 1. f3 e5 2. g4 Qh4#
pub const FOOLS_MATE: &str = "1. f3 e5 2. g4 Qh4#";
/// A quiet draw by agreement.
pub const SHORT_DRAW: &str = "1. e4 e5 2. Nf3 Nc6 3. Bb5 a6";
/// Exchanges on d5, then White resigns.
pub const SCANDINAVIAN: &str = "1. e4 d5 2. exd5 Qxd5 3. Nc3 Qa5";

/// Build a game record through the PGN reader, as the runner does.
pub fn game(white: &str, black: &str, result: &str, movetext: &str, extra_headers: &str) -> GameRecord {
    let pgn = format!(
        "[Event \"Live Chess\"]\n[White \"{white}\"]\n[Black \"{black}\"]\n[Result \"{result}\"]\n[TimeControl \"600\"]\n[Link \"https://example.org/game/{white}-{black}\"]\n{extra_headers}\n\n{movetext} {result}\n"
    );
    parse_pgn(&pgn).expect("fixture parses")
}

/// A small mixed batch for `alice`: a Scholar's mate win, a Fool's mate win
/// as Black, a loss, a draw and a game she did not play.
pub fn mixed_batch() -> Vec<GameRecord> {
    vec![
        game(USER, "bob", "1-0", SCHOLARS_MATE, "[WhiteElo \"1500\"]\n[BlackElo \"1450\"]"),
        game("bob", USER, "0-1", FOOLS_MATE, "[WhiteElo \"1400\"]\n[BlackElo \"1520\"]"),
        game(USER, "carol", "0-1", SCANDINAVIAN, "[Termination \"carol won by resignation\"]"),
        game("carol", USER, "1/2-1/2", SHORT_DRAW, ""),
        game("bob", "carol", "1-0", SCHOLARS_MATE, ""),
    ]
}
