use chess_core::GameRecord;
use shakmaty::{Chess, Color, Position, Role};

use crate::board::is_smothered;
use crate::candidate::{Candidate, Detail};
use crate::config::ScoringConfig;
use crate::detector::Detector;
use crate::detectors::{earliest, user_mate_position};
use crate::finding::{hydrate, Finding, Hydration};

/// Detects smothered mate: the user's knight mates a king whose every
/// neighbouring square is occupied by its own pieces.
pub struct SmotheredMateDetector {
    user_color: Color,
    found: bool,
}

impl SmotheredMateDetector {
    pub fn new() -> Self {
        Self {
            user_color: Color::White,
            found: false,
        }
    }
}

impl Default for SmotheredMateDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for SmotheredMateDetector {
    fn name(&self) -> &'static str {
        "smothered_mate"
    }

    fn start_game(&mut self, _game: &GameRecord, user_color: Color) {
        self.user_color = user_color;
        self.found = false;
    }

    fn finish_game(&mut self, game: &GameRecord, end: Option<&Chess>) -> Vec<Candidate> {
        let Some(last) = game.last_move() else {
            return Vec::new();
        };
        if !last.starts_with('N') {
            return Vec::new();
        }
        let Some(pos) = user_mate_position(game, self.user_color, end) else {
            return Vec::new();
        };

        let mated = !self.user_color;
        let board = pos.board();
        let Some(king) = board.king_of(mated) else {
            return Vec::new();
        };
        let knight_checks = pos.checkers().into_iter().all(|sq| {
            board
                .piece_at(sq)
                .is_some_and(|p| p.role == Role::Knight && p.color == self.user_color)
        });
        if !knight_checks || !is_smothered(board, king, mated) {
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
            config.points("smothered_mate", 50)
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

        let finding = hydrate(game, Hydration::at(self.name(), "Smothered Mate", best, -3))
            .with_value("mate_move", "Mate Move", mate_move.as_str())
            .with_value("total_smothered_mates", "Total Smothered Mates", acc.len());
        vec![finding]
    }
}
