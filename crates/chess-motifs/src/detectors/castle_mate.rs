use chess_core::GameRecord;
use shakmaty::{CastlingSide, Chess, Color, File, Position, Role, Square};

use crate::board::home_rank;
use crate::candidate::{castling_label, Candidate, Detail};
use crate::config::ScoringConfig;
use crate::detector::Detector;
use crate::detectors::{earliest, user_mate_position};
use crate::finding::{hydrate, Finding, Hydration};

/// Detects checkmate delivered by castling.
pub struct CastleMateDetector {
    user_color: Color,
    found: bool,
}

impl CastleMateDetector {
    pub fn new() -> Self {
        Self {
            user_color: Color::White,
            found: false,
        }
    }

    fn side_of(san: &str) -> Option<CastlingSide> {
        if san.starts_with("O-O-O") {
            Some(CastlingSide::QueenSide)
        } else if san.starts_with("O-O") {
            Some(CastlingSide::KingSide)
        } else {
            None
        }
    }
}

impl Default for CastleMateDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for CastleMateDetector {
    fn name(&self) -> &'static str {
        "castle_mate"
    }

    fn start_game(&mut self, _game: &GameRecord, user_color: Color) {
        self.user_color = user_color;
        self.found = false;
    }

    fn finish_game(&mut self, game: &GameRecord, end: Option<&Chess>) -> Vec<Candidate> {
        let Some(last) = game.last_move() else {
            return Vec::new();
        };
        let Some(side) = Self::side_of(last) else {
            return Vec::new();
        };
        let Some(pos) = user_mate_position(game, self.user_color, end) else {
            return Vec::new();
        };

        // King and rook must stand on their castled squares.
        let rank = home_rank(self.user_color);
        let (king_file, rook_file) = match side {
            CastlingSide::KingSide => (File::G, File::F),
            CastlingSide::QueenSide => (File::C, File::D),
        };
        let board = pos.board();
        let rook_sq = Square::from_coords(rook_file, rank);
        let castled = board.king_of(self.user_color) == Some(Square::from_coords(king_file, rank))
            && board
                .piece_at(rook_sq)
                .is_some_and(|p| p.role == Role::Rook && p.color == self.user_color);
        if !castled {
            return Vec::new();
        }

        self.found = true;
        vec![Candidate::new(
            self.user_color,
            game.ply_count(),
            Detail::Castle {
                mate_move: last.to_string(),
                side,
            },
        )]
    }

    fn score_for_game(&self, config: &ScoringConfig) -> i32 {
        if self.found {
            config.points("castle_mate", 50)
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
        let Detail::Castle { mate_move, side } = &best.detail else {
            return Vec::new();
        };

        let finding = hydrate(game, Hydration::at(self.name(), "Castle Mate", best, 0))
            .with_value("castle_type", "Castle Type", castling_label(*side))
            .with_value("final_move", "Final Move", mate_move.as_str())
            .with_value("total_castle_mates", "Total Castle Mates", acc.len());
        vec![finding]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::{self, plies_ending, record};

    fn finish(last: &str, fen: &str) -> Vec<Candidate> {
        let game = record(
            "1-0",
            &plies_ending(40, last),
            &format!("[CurrentPosition \"{fen}\"]"),
        );
        let mut detector = CastleMateDetector::new();
        detector.start_game(&game, Color::White);
        test_support::finish(&mut detector, &game)
    }

    #[test]
    fn test_short_castle_mate() {
        let found = finish("O-O#", "4rkr1/4p1p1/8/8/8/8/8/5RK1 b - - 0 1");
        assert_eq!(found.len(), 1);
        assert!(matches!(
            found[0].detail,
            Detail::Castle { side: CastlingSide::KingSide, .. }
        ));
    }

    #[test]
    fn test_long_castle_mate() {
        let found = finish("O-O-O#", "2rkr3/2p1p3/8/8/8/8/8/2KR4 b - - 0 1");
        assert_eq!(found.len(), 1);
        assert!(matches!(
            found[0].detail,
            Detail::Castle { side: CastlingSide::QueenSide, .. }
        ));
    }

    #[test]
    fn test_king_not_on_castled_square() {
        // Mate on the board, but the rook delivered it from the back rank.
        assert!(finish("O-O#", "3R2k1/5ppp/8/8/8/8/5PPP/6K1 b - - 1 30").is_empty());
        assert!(finish("Rd8#", "4rkr1/4p1p1/8/8/8/8/8/5RK1 b - - 0 1").is_empty());
    }
}
