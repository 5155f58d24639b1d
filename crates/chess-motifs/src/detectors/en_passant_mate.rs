use std::sync::LazyLock;

use chess_core::GameRecord;
use regex::Regex;
use shakmaty::{Chess, Color};

use crate::candidate::{Candidate, Detail};
use crate::config::ScoringConfig;
use crate::detector::{Detector, MoveContext};
use crate::detectors::{earliest, user_mate_position};
use crate::finding::{hydrate, Finding, Hydration};

static EN_PASSANT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-h])x([a-h])([36])#$").expect("valid en passant regex"));

/// Detects checkmate delivered by an en passant capture. The notation only
/// nominates a candidate; the replayed move must be en passant.
pub struct EnPassantMateDetector {
    user_color: Color,
    last_move_en_passant: bool,
    found: bool,
}

impl EnPassantMateDetector {
    pub fn new() -> Self {
        Self {
            user_color: Color::White,
            last_move_en_passant: false,
            found: false,
        }
    }

    fn notation_matches(san: &str, user_color: Color) -> bool {
        let Some(cap) = EN_PASSANT_RE.captures(san) else {
            return false;
        };
        let from = cap[1].as_bytes()[0];
        let to = cap[2].as_bytes()[0];
        if from.abs_diff(to) != 1 {
            return false;
        }
        &cap[3] == user_color.fold_wb("6", "3")
    }
}

impl Default for EnPassantMateDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for EnPassantMateDetector {
    fn name(&self) -> &'static str {
        "en_passant_mate"
    }

    fn start_game(&mut self, _game: &GameRecord, user_color: Color) {
        self.user_color = user_color;
        self.last_move_en_passant = false;
        self.found = false;
    }

    fn process_move(&mut self, ctx: &MoveContext) {
        if ctx.ply == ctx.game.ply_count() {
            self.last_move_en_passant = ctx.is_user_move && ctx.mv.is_en_passant();
        }
    }

    fn finish_game(&mut self, game: &GameRecord, end: Option<&Chess>) -> Vec<Candidate> {
        let Some(last) = game.last_move() else {
            return Vec::new();
        };
        if !self.last_move_en_passant
            || !Self::notation_matches(last, self.user_color)
            || user_mate_position(game, self.user_color, end).is_none()
        {
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
            config.points("en_passant_mate", 55)
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

        let finding = hydrate(game, Hydration::at(self.name(), "En Passant Mate", best, 0))
            .with_value("mate_move", "Mate Move", mate_move.as_str())
            .with_value("total_en_passant_mates", "Total En Passant Mates", acc.len());
        vec![finding]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::{finish, plies_ending, record, step};

    const BEFORE: &str = "3brb2/4kp2/4pn2/2PpP3/B7/8/8/7K w - d6 0 1";
    const AFTER: &str = "3brb2/4kp2/3Ppn2/2P5/B7/8/8/7K b - - 0 1";

    fn mate_game() -> GameRecord {
        record(
            "1-0",
            &plies_ending(30, "exd6#"),
            &format!("[CurrentPosition \"{AFTER}\"]"),
        )
    }

    #[test]
    fn test_notation_shape() {
        assert!(EnPassantMateDetector::notation_matches("exd6#", Color::White));
        assert!(!EnPassantMateDetector::notation_matches("exd6#", Color::Black));
        assert!(EnPassantMateDetector::notation_matches("dxe3#", Color::Black));
        assert!(!EnPassantMateDetector::notation_matches("axc6#", Color::White));
        assert!(!EnPassantMateDetector::notation_matches("exd6+", Color::White));
    }

    #[test]
    fn test_en_passant_mate_confirmed_by_replay() {
        let game = mate_game();
        let mut detector = EnPassantMateDetector::new();
        detector.start_game(&game, Color::White);
        step(&mut detector, &game, Color::White, BEFORE, "exd6#", 31);
        let found = finish(&mut detector, &game);
        assert_eq!(found.len(), 1);
        assert_eq!(detector.score_for_game(&ScoringConfig::default()), 55);
    }

    #[test]
    fn test_notation_alone_is_not_enough() {
        let game = mate_game();
        let mut detector = EnPassantMateDetector::new();
        detector.start_game(&game, Color::White);
        assert!(finish(&mut detector, &game).is_empty());
    }
}
