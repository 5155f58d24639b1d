use chess_core::game_data::full_moves;
use chess_core::GameRecord;
use shakmaty::{Chess, Color};

use crate::candidate::{Candidate, Detail};
use crate::detector::{retain_best, Detector};
use crate::finding::{hydrate, Finding, Hydration};

/// Tracks the user's fastest checkmate win. Queen mates on f7 or f2 are the
/// scholar's-mate family and never count.
pub struct QuickestMateDetector {
    user_color: Color,
}

impl QuickestMateDetector {
    pub fn new() -> Self {
        Self {
            user_color: Color::White,
        }
    }
}

impl Default for QuickestMateDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn is_scholars_pattern(mate_move: &str) -> bool {
    mate_move.starts_with('Q') && (mate_move.contains("f7") || mate_move.contains("f2"))
}

fn plies_of(candidate: &Candidate) -> usize {
    match candidate.detail {
        Detail::Length { plies } => plies,
        _ => usize::MAX,
    }
}

impl Detector for QuickestMateDetector {
    fn name(&self) -> &'static str {
        "quickest_mate"
    }

    fn start_game(&mut self, _game: &GameRecord, user_color: Color) {
        self.user_color = user_color;
    }

    fn finish_game(&mut self, game: &GameRecord, _end: Option<&Chess>) -> Vec<Candidate> {
        let Some(last) = game.last_move() else {
            return Vec::new();
        };
        if !game.won_by(self.user_color) || !game.ends_in_checkmate() || is_scholars_pattern(last) {
            return Vec::new();
        }
        let plies = game.ply_count();
        vec![Candidate::new(self.user_color, plies, Detail::Length { plies })]
    }

    fn retain(&self, acc: &mut Vec<Candidate>, candidate: Candidate) {
        retain_best(acc, candidate, |new, best| plies_of(new) < plies_of(best));
    }

    fn select(&self, acc: &[Candidate], games: &[GameRecord]) -> Vec<Finding> {
        let Some(best) = acc.first() else {
            return Vec::new();
        };
        let Some(game) = games.get(best.game) else {
            return Vec::new();
        };

        let plies = plies_of(best);
        let finding = hydrate(
            game,
            Hydration {
                motif: self.name(),
                display_name: "Quickest Mate",
                user_color: best.user_color,
                key_ply: 0,
                link_move: Some(plies.saturating_sub(1)),
            },
        )
        .with_value("move_count", "Moves to Mate", full_moves(plies));
        vec![finding]
    }
}
