//! Motif detectors.
//!
//! Three families share the [`Detector`](crate::detector::Detector) trait:
//! final-position classifiers (the mates), move-sequence state machines
//! (sacrifices, hung queen, windmill, knight fork) and batch-record trackers
//! that keep a single best game.

pub mod back_rank_mate;
pub mod biggest_comeback;
pub mod capture_sequence;
pub mod castle_mate;
pub mod clutch_win;
pub mod en_passant_mate;
pub mod hung_queen;
pub mod king_mate;
pub mod king_walk;
pub mod knight_bishop_mate;
pub mod knight_fork;
pub mod knight_promotion_mate;
pub mod longest_game;
pub mod pawn_mate;
pub mod promotion_mate;
pub mod quickest_mate;
pub mod sacrifice;
pub mod smothered_mate;
pub mod stalemate;
pub mod windmill;

use chess_core::GameRecord;
use shakmaty::{Chess, Color, Position};

use crate::candidate::Candidate;

/// `end` when the user won by delivering mate on the last ply. The mate
/// marker is only a hint; the position itself must be checkmate.
pub(crate) fn user_mate_position<'a>(
    game: &GameRecord,
    user_color: Color,
    end: Option<&'a Chess>,
) -> Option<&'a Chess> {
    if !game.won_by(user_color) || !game.ends_in_checkmate() || !game.last_move_by(user_color) {
        return None;
    }
    end.filter(|pos| pos.is_checkmate() && pos.turn() == !user_color)
}

/// Earliest candidate by ply, ties to the earlier game.
pub(crate) fn earliest(acc: &[Candidate]) -> Option<&Candidate> {
    acc.iter().min_by_key(|c| (c.ply, c.game))
}

/// Time forfeits and low-rated wins do not count for sacrifice-style motifs.
pub(crate) fn is_tactical_win(game: &GameRecord, user_color: Color, min_rating: f64) -> bool {
    if !game.won_by(user_color) || game.terminated_by("time") {
        return false;
    }
    match game.rating(user_color) {
        Some(rating) => f64::from(rating) >= min_rating,
        None => true,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chess_core::game_data::{GameMetadata, GameResult};
    use chess_core::pgn::parse_pgn;
    use chess_core::position::{final_position, parse_san_move, position_from_fen};
    use chess_core::GameRecord;
    use shakmaty::{Chess, Color, Position};

    use crate::candidate::Candidate;
    use crate::detector::{Detector, MoveContext};

    /// Build a record from movetext with `alice` as White and `bob` as Black.
    pub fn game(result: &str, movetext: &str, extra_headers: &str) -> GameRecord {
        let pgn = format!(
            "[White \"alice\"]\n[Black \"bob\"]\n[Result \"{result}\"]\n[TimeControl \"600\"]\n{extra_headers}\n\n{movetext} {result}"
        );
        parse_pgn(&pgn).expect("fixture parses")
    }

    /// Record with `alice` as White and `bob` as Black built straight from a
    /// move list. The moves are not replayed.
    pub fn record(result: &str, moves: &[impl AsRef<str>], headers: &str) -> GameRecord {
        GameRecord {
            metadata: GameMetadata {
                white: "alice".to_string(),
                black: "bob".to_string(),
                result: GameResult::from_code(result),
                date: None,
                time_control: Some("600".to_string()),
                eco: None,
                event: None,
                link: Some("https://example.org/game".to_string()),
            },
            moves: moves.iter().map(|m| m.as_ref().to_string()).collect(),
            pgn: format!("[Result \"{result}\"]\n{headers}"),
        }
    }

    /// `n` filler plies followed by `last`.
    pub fn plies_ending(n: usize, last: &str) -> Vec<String> {
        let filler = ["Nf3", "Nf6", "Ng1", "Ng8"];
        let mut moves: Vec<String> = (0..n).map(|i| filler[i % 4].to_string()).collect();
        moves.push(last.to_string());
        moves
    }

    /// Feed a single move played from `fen` at `ply`.
    pub fn step(
        detector: &mut dyn Detector,
        game: &GameRecord,
        user_color: Color,
        fen: &str,
        san: &str,
        ply: usize,
    ) {
        let board = position_from_fen(fen).expect("fixture fen");
        let mv = parse_san_move(&board, san, ply).expect("fixture move");
        let ctx = MoveContext {
            mv: &mv,
            ply,
            board: &board,
            san,
            is_user_move: board.turn() == user_color,
            user_color,
            game,
        };
        detector.process_move(&ctx);
    }

    /// Drive one detector through a game the way the engine does.
    pub fn run(detector: &mut dyn Detector, game: &GameRecord, user_color: Color) -> Vec<Candidate> {
        detector.start_game(game, user_color);
        let moves = chess_core::position::decode_moves(&game.moves).expect("fixture replays");
        let mut pos = Chess::default();
        for (i, mv) in moves.iter().enumerate() {
            let ctx = MoveContext {
                mv,
                ply: i + 1,
                board: &pos,
                san: &game.moves[i],
                is_user_move: pos.turn() == user_color,
                user_color,
                game,
            };
            detector.process_move(&ctx);
            pos.play_unchecked(mv.clone());
        }
        let end = final_position(game, Some(&pos));
        detector.finish_game(game, end.as_ref())
    }

    /// Finish a game without replaying it. The final position comes from
    /// the `CurrentPosition` header or a fresh replay.
    pub fn finish(detector: &mut dyn Detector, game: &GameRecord) -> Vec<Candidate> {
        let end = final_position(game, None);
        detector.finish_game(game, end.as_ref())
    }

    /// Start and finish every game without replaying moves, folding the
    /// candidates the way the engine does.
    pub fn finish_batch(
        detector: &mut dyn Detector,
        games: &[(GameRecord, Color)],
    ) -> Vec<Candidate> {
        let mut acc = Vec::new();
        for (index, (game, color)) in games.iter().enumerate() {
            detector.start_game(game, *color);
            for mut candidate in finish(detector, game) {
                candidate.game = index;
                detector.retain(&mut acc, candidate);
            }
        }
        acc
    }

    /// Run a batch through one detector, stamping game indices and folding
    /// with the detector's retention rule.
    pub fn run_batch(
        detector: &mut dyn Detector,
        games: &[(GameRecord, Color)],
    ) -> Vec<Candidate> {
        let mut acc = Vec::new();
        for (index, (game, color)) in games.iter().enumerate() {
            for mut candidate in run(detector, game, *color) {
                candidate.game = index;
                detector.retain(&mut acc, candidate);
            }
        }
        acc
    }
}
