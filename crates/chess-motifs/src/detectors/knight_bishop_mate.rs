use chess_core::GameRecord;
use shakmaty::{Chess, Color, Position, Role};

use crate::candidate::{Candidate, Detail};
use crate::config::ScoringConfig;
use crate::detector::Detector;
use crate::detectors::{earliest, user_mate_position};
use crate::finding::{hydrate, Finding, Hydration};

/// Detects the knight and bishop endgame mate: the final board holds the
/// two kings, one knight and one bishop, nothing else.
pub struct KnightBishopMateDetector {
    user_color: Color,
    found: bool,
}

impl KnightBishopMateDetector {
    pub fn new() -> Self {
        Self {
            user_color: Color::White,
            found: false,
        }
    }
}

impl Default for KnightBishopMateDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for KnightBishopMateDetector {
    fn name(&self) -> &'static str {
        "knight_bishop_mate"
    }

    fn start_game(&mut self, _game: &GameRecord, user_color: Color) {
        self.user_color = user_color;
        self.found = false;
    }

    fn finish_game(&mut self, game: &GameRecord, end: Option<&Chess>) -> Vec<Candidate> {
        let Some(last) = game.last_move() else {
            return Vec::new();
        };
        let Some(pos) = user_mate_position(game, self.user_color, end) else {
            return Vec::new();
        };

        let board = pos.board();
        let count = |role: Role| (board.by_role(role) & board.by_color(self.user_color)).count();
        let material_ok = board.occupied().count() == 4
            && board.kings().count() == 2
            && count(Role::Knight) == 1
            && count(Role::Bishop) == 1;
        if !material_ok {
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
            config.points("knight_bishop_mate", 50)
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

        let finding = hydrate(
            game,
            Hydration::at(self.name(), "Knight and Bishop Mate", best, 0),
        )
        .with_value("mate_move", "Mate Move", mate_move.as_str())
        .with_value(
            "total_knight_bishop_mates",
            "Total Knight and Bishop Mates",
            acc.len(),
        );
        vec![finding]
    }
}
