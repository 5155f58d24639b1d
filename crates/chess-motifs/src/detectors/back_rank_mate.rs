use chess_core::GameRecord;
use shakmaty::{Chess, Color, Position, Role};

use crate::board::{forward_escape_squares, home_rank, material};
use crate::candidate::{Candidate, Detail};
use crate::config::ScoringConfig;
use crate::detector::Detector;
use crate::detectors::user_mate_position;
use crate::finding::{hydrate, Finding, Hydration};

/// Detects back rank mate: a rook or queen mates the opponent's king on its
/// home rank while the king's forward squares are blocked by its own pieces.
/// One empty forward square is tolerated.
pub struct BackRankMateDetector {
    user_color: Color,
    found: bool,
}

impl BackRankMateDetector {
    pub fn new() -> Self {
        Self {
            user_color: Color::White,
            found: false,
        }
    }
}

impl Default for BackRankMateDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for BackRankMateDetector {
    fn name(&self) -> &'static str {
        "back_rank_mate"
    }

    fn start_game(&mut self, _game: &GameRecord, user_color: Color) {
        self.user_color = user_color;
        self.found = false;
    }

    fn finish_game(&mut self, game: &GameRecord, end: Option<&Chess>) -> Vec<Candidate> {
        let Some(last) = game.last_move() else {
            return Vec::new();
        };
        if !(last.starts_with('R') || last.starts_with('Q')) {
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
        let back_rank = home_rank(mated);
        if king.rank() != back_rank {
            return Vec::new();
        }

        let heavy_checker_on_rank = pos.checkers().into_iter().any(|sq| {
            sq.rank() == back_rank
                && board
                    .piece_at(sq)
                    .is_some_and(|p| matches!(p.role, Role::Rook | Role::Queen))
        });
        if !heavy_checker_on_rank {
            return Vec::new();
        }

        let escapes = forward_escape_squares(king, mated);
        let blocked = escapes
            .iter()
            .filter(|&&sq| board.by_color(mated).contains(sq))
            .count();
        if escapes.is_empty() || blocked + 1 < escapes.len() {
            return Vec::new();
        }

        self.found = true;
        vec![Candidate::new(
            self.user_color,
            game.ply_count(),
            Detail::BackRank {
                mate_move: last.to_string(),
                rook_mate: last.starts_with('R'),
                enemy_material: material(board, mated),
            },
        )]
    }

    fn score_for_game(&self, config: &ScoringConfig) -> i32 {
        if self.found {
            config.points("back_rank_mate", 35)
        } else {
            0
        }
    }

    fn select(&self, acc: &[Candidate], games: &[GameRecord]) -> Vec<Finding> {
        // Rook mates first, then more surviving enemy material, then earliest.
        let best = acc.iter().min_by_key(|c| match &c.detail {
            Detail::BackRank {
                rook_mate,
                enemy_material,
                ..
            } => (!rook_mate, -enemy_material, c.ply, c.game),
            _ => (true, 0, c.ply, c.game),
        });
        let Some(best) = best else {
            return Vec::new();
        };
        let Some(game) = games.get(best.game) else {
            return Vec::new();
        };
        let Detail::BackRank { mate_move, .. } = &best.detail else {
            return Vec::new();
        };

        let finding = hydrate(game, Hydration::at(self.name(), "Back Rank Mate", best, 0))
            .with_value("mate_move", "Mate Move", mate_move.as_str())
            .with_value("total_back_rank_mates", "Total Back Rank Mates", acc.len());
        vec![finding]
    }
}
