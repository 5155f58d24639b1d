use std::sync::LazyLock;

use chess_core::GameRecord;
use regex::Regex;
use shakmaty::{Chess, Color, Position, Role, Square};

use crate::candidate::{role_name, Candidate, Detail};
use crate::config::ScoringConfig;
use crate::detector::Detector;
use crate::detectors::{earliest, user_mate_position};
use crate::finding::{hydrate, Finding, Hydration};

static PROMOTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-h][18])=([NBRQ])").expect("valid promotion regex"));

/// Role the SAN promotes to, if that piece of `color` stands on the
/// promotion square in `pos`.
pub(crate) fn promoted_piece_on_board(pos: &Chess, san: &str, color: Color) -> Option<Role> {
    let cap = PROMOTION_RE.captures(san)?;
    let square: Square = cap[1].parse().ok()?;
    let role = Role::from_char(cap[2].chars().next()?.to_ascii_lowercase())?;
    let piece = pos.board().piece_at(square)?;
    (piece.color == color && piece.role == role).then_some(role)
}

/// Detects checkmate delivered by promoting a pawn, to any piece.
pub struct PromotionMateDetector {
    user_color: Color,
    found: bool,
}

impl PromotionMateDetector {
    pub fn new() -> Self {
        Self {
            user_color: Color::White,
            found: false,
        }
    }
}

impl Default for PromotionMateDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for PromotionMateDetector {
    fn name(&self) -> &'static str {
        "promotion_mate"
    }

    fn start_game(&mut self, _game: &GameRecord, user_color: Color) {
        self.user_color = user_color;
        self.found = false;
    }

    fn finish_game(&mut self, game: &GameRecord, end: Option<&Chess>) -> Vec<Candidate> {
        let Some(last) = game.last_move() else {
            return Vec::new();
        };
        if !last.contains('=') {
            return Vec::new();
        }
        let Some(pos) = user_mate_position(game, self.user_color, end) else {
            return Vec::new();
        };
        let Some(role) = promoted_piece_on_board(pos, last, self.user_color) else {
            return Vec::new();
        };

        self.found = true;
        vec![Candidate::new(
            self.user_color,
            game.ply_count(),
            Detail::Promotion {
                mate_move: last.to_string(),
                promoted_to: role,
                capture: last.contains('x'),
            },
        )]
    }

    fn score_for_game(&self, config: &ScoringConfig) -> i32 {
        if self.found {
            config.points("promotion_mate", 40)
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
        let Detail::Promotion {
            mate_move,
            promoted_to,
            ..
        } = &best.detail
        else {
            return Vec::new();
        };

        let finding = hydrate(game, Hydration::at(self.name(), "Promotion Mate", best, 0))
            .with_value("mate_move", "Mate Move", mate_move.as_str())
            .with_value("promoted_to", "Promoted To", role_name(*promoted_to))
            .with_value("total_promotion_mates", "Total Promotion Mates", acc.len());
        vec![finding]
    }
}
