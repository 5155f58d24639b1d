use chess_core::GameRecord;
use shakmaty::{Chess, Color, Position};

use crate::board::material;
use crate::candidate::{Candidate, Detail};
use crate::detector::{retain_best, Detector};
use crate::finding::{hydrate, Finding, Hydration};

/// Tracks the drawn game where the user got stalemated with the most
/// material left on the board.
pub struct StalemateDetector {
    user_color: Color,
}

impl StalemateDetector {
    pub fn new() -> Self {
        Self {
            user_color: Color::White,
        }
    }
}

impl Default for StalemateDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn material_of(candidate: &Candidate) -> i32 {
    match candidate.detail {
        Detail::Stalemate { total_material } => total_material,
        _ => 0,
    }
}

impl Detector for StalemateDetector {
    fn name(&self) -> &'static str {
        "stalemate"
    }

    fn start_game(&mut self, _game: &GameRecord, user_color: Color) {
        self.user_color = user_color;
    }

    fn finish_game(&mut self, game: &GameRecord, end: Option<&Chess>) -> Vec<Candidate> {
        if !game.metadata.result.is_draw() || !game.terminated_by("stalemate") {
            return Vec::new();
        }
        let Some(pos) = end else {
            return Vec::new();
        };
        if pos.turn() != self.user_color || !pos.is_stalemate() {
            return Vec::new();
        }

        let board = pos.board();
        let total_material = material(board, Color::White) + material(board, Color::Black);
        if total_material <= 0 {
            return Vec::new();
        }
        vec![Candidate::new(
            self.user_color,
            game.ply_count(),
            Detail::Stalemate { total_material },
        )]
    }

    fn retain(&self, acc: &mut Vec<Candidate>, candidate: Candidate) {
        retain_best(acc, candidate, |new, best| material_of(new) > material_of(best));
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
            Hydration::at(self.name(), "Stalemate with Most Material", best, 0),
        )
        .with_value("total_material", "Total Material", material_of(best));
        vec![finding]
    }
}
