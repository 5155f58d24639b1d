use chess_core::game_data::full_moves;
use chess_core::GameRecord;
use shakmaty::{Chess, Color};

use crate::candidate::{Candidate, Detail};
use crate::detector::{retain_best, Detector};
use crate::finding::{hydrate, Finding, Hydration};

/// Tracks the won game with the most plies across the batch.
pub struct LongestGameDetector {
    user_color: Color,
}

impl LongestGameDetector {
    pub fn new() -> Self {
        Self {
            user_color: Color::White,
        }
    }
}

impl Default for LongestGameDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn plies_of(candidate: &Candidate) -> usize {
    match candidate.detail {
        Detail::Length { plies } => plies,
        _ => 0,
    }
}

fn user_result(game: &GameRecord, user_color: Color) -> &'static str {
    if game.won_by(user_color) {
        "Won"
    } else if game.lost_by(user_color) {
        "Lost"
    } else {
        "Draw"
    }
}

impl Detector for LongestGameDetector {
    fn name(&self) -> &'static str {
        "longest_game"
    }

    fn start_game(&mut self, _game: &GameRecord, user_color: Color) {
        self.user_color = user_color;
    }

    fn finish_game(&mut self, game: &GameRecord, _end: Option<&Chess>) -> Vec<Candidate> {
        let plies = game.ply_count();
        if plies == 0 || !game.won_by(self.user_color) {
            return Vec::new();
        }
        vec![Candidate::new(self.user_color, plies, Detail::Length { plies })]
    }

    fn retain(&self, acc: &mut Vec<Candidate>, candidate: Candidate) {
        retain_best(acc, candidate, |new, best| plies_of(new) > plies_of(best));
    }

    fn select(&self, acc: &[Candidate], games: &[GameRecord]) -> Vec<Finding> {
        let Some(best) = acc.first() else {
            return Vec::new();
        };
        let Some(game) = games.get(best.game) else {
            return Vec::new();
        };

        let finding = hydrate(
            game,
            Hydration {
                motif: self.name(),
                display_name: "Longest Game",
                user_color: best.user_color,
                key_ply: 0,
                link_move: None,
            },
        )
        .with_value("total_moves", "Total Moves", full_moves(plies_of(best)))
        .with_value("result", "Result", user_result(game, best.user_color));
        vec![finding]
    }
}
