use chess_core::GameRecord;
use shakmaty::{Chess, Color};

use crate::candidate::{Candidate, Detail};
use crate::config::ScoringConfig;
use crate::detector::Detector;
use crate::detectors::{earliest, user_mate_position};
use crate::finding::{hydrate, Finding, Hydration};

/// Detects checkmate delivered by a pawn move that is not a promotion.
pub struct PawnMateDetector {
    user_color: Color,
    found: bool,
}

impl PawnMateDetector {
    pub fn new() -> Self {
        Self {
            user_color: Color::White,
            found: false,
        }
    }

    fn is_pawn_move(san: &str) -> bool {
        san.starts_with(|c: char| ('a'..='h').contains(&c)) && !san.contains('=')
    }
}

impl Default for PawnMateDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for PawnMateDetector {
    fn name(&self) -> &'static str {
        "pawn_mate"
    }

    fn start_game(&mut self, _game: &GameRecord, user_color: Color) {
        self.user_color = user_color;
        self.found = false;
    }

    fn finish_game(&mut self, game: &GameRecord, end: Option<&Chess>) -> Vec<Candidate> {
        let Some(last) = game.last_move() else {
            return Vec::new();
        };
        if !Self::is_pawn_move(last) || user_mate_position(game, self.user_color, end).is_none() {
            return Vec::new();
        }

        self.found = true;
        vec![Candidate::new(
            self.user_color,
            game.ply_count(),
            Detail::MateMove {
                mate_move: last.to_string(),
            },
        )]
    }

    fn score_for_game(&self, config: &ScoringConfig) -> i32 {
        if self.found {
            config.points("pawn_mate", 40)
        } else {
            0
        }
    }

    fn select(&self, acc: &[Candidate], games: &[GameRecord]) -> Vec<Finding> {
        let Some(best) = earliest(acc) else {
            return Vec::new();
        };
        let Some(game) = games.get(best.game) else {
            return Vec::new();
        };
        let Detail::MateMove { mate_move } = &best.detail else {
            return Vec::new();
        };

        let finding = hydrate(game, Hydration::at(self.name(), "Pawn Mate", best, 0))
            .with_value("mate_move", "Mate Move", mate_move.as_str())
            .with_value("total_pawn_mates", "Total Pawn Mates", acc.len());
        vec![finding]
    }
}
