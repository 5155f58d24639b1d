use chess_core::GameRecord;
use shakmaty::{Chess, Color, Role};

use crate::candidate::{Candidate, Detail};
use crate::config::ScoringConfig;
use crate::detector::Detector;
use crate::detectors::promotion_mate::promoted_piece_on_board;
use crate::detectors::user_mate_position;
use crate::finding::{hydrate, Finding, Hydration};

/// Detects underpromotion to a knight that mates on the spot.
pub struct KnightPromotionMateDetector {
    user_color: Color,
    found: bool,
}

impl KnightPromotionMateDetector {
    pub fn new() -> Self {
        Self {
            user_color: Color::White,
            found: false,
        }
    }
}

impl Default for KnightPromotionMateDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for KnightPromotionMateDetector {
    fn name(&self) -> &'static str {
        "knight_promotion_mate"
    }

    fn start_game(&mut self, _game: &GameRecord, user_color: Color) {
        self.user_color = user_color;
        self.found = false;
    }

    fn finish_game(&mut self, game: &GameRecord, end: Option<&Chess>) -> Vec<Candidate> {
        let Some(last) = game.last_move() else {
            return Vec::new();
        };
        if !last.contains("=N") {
            return Vec::new();
        }
        let Some(pos) = user_mate_position(game, self.user_color, end) else {
            return Vec::new();
        };
        if promoted_piece_on_board(pos, last, self.user_color) != Some(Role::Knight) {
            return Vec::new();
        }

        self.found = true;
        vec![Candidate::new(
            self.user_color,
            game.ply_count(),
            Detail::Promotion {
                mate_move: last.to_string(),
                promoted_to: Role::Knight,
                capture: last.contains('x'),
            },
        )]
    }

    fn score_for_game(&self, config: &ScoringConfig) -> i32 {
        if self.found {
            config.points("knight_promotion_mate", 50)
        } else {
            0
        }
    }

    fn select(&self, acc: &[Candidate], games: &[GameRecord]) -> Vec<Finding> {
        // Latest mate ply wins; ties to the earlier game.
        let best = acc
            .iter()
            .max_by_key(|c| (c.ply, std::cmp::Reverse(c.game)));
        let Some(best) = best else {
            return Vec::new();
        };
        let Some(game) = games.get(best.game) else {
            return Vec::new();
        };
        let Detail::Promotion {
            mate_move, capture, ..
        } = &best.detail
        else {
            return Vec::new();
        };

        let finding = hydrate(
            game,
            Hydration::at(self.name(), "Knight Promotion Mate", best, 0),
        )
        .with_value("mate_move", "Mate Move", mate_move.as_str())
        .with_value("was_capture", "Capture", *capture)
        .with_value(
            "total_knight_promotion_mates",
            "Total Knight Promotion Mates",
            acc.len(),
        );
        vec![finding]
    }
}
