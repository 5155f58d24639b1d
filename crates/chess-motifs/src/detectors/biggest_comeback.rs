use chess_core::GameRecord;
use shakmaty::{Chess, Color, Position};

use crate::board::material_balance;
use crate::candidate::{Candidate, Detail};
use crate::config::ScoringConfig;
use crate::detector::{retain_best, Detector, Signals};
use crate::finding::{hydrate, Finding, Hydration};

/// Tracks the checkmate win with the largest material deficit on the final
/// board. Also feeds the deficit to the best-game scorer.
pub struct BiggestComebackDetector {
    user_color: Color,
    deficit: i32,
}

impl BiggestComebackDetector {
    pub fn new() -> Self {
        Self {
            user_color: Color::White,
            deficit: 0,
        }
    }
}

impl Default for BiggestComebackDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn deficit_of(candidate: &Candidate) -> i32 {
    match candidate.detail {
        Detail::Comeback { deficit } => deficit,
        _ => 0,
    }
}

impl Detector for BiggestComebackDetector {
    fn name(&self) -> &'static str {
        "biggest_comeback"
    }

    fn start_game(&mut self, _game: &GameRecord, user_color: Color) {
        self.user_color = user_color;
        self.deficit = 0;
    }

    fn finish_game(&mut self, game: &GameRecord, end: Option<&Chess>) -> Vec<Candidate> {
        if !game.won_by(self.user_color) || !game.ends_in_checkmate() {
            return Vec::new();
        }
        let Some(pos) = end else {
            return Vec::new();
        };

        let deficit = -material_balance(pos.board(), self.user_color);
        self.deficit = deficit.max(0);
        if deficit <= 0 {
            return Vec::new();
        }
        vec![Candidate::new(
            self.user_color,
            game.ply_count(),
            Detail::Comeback { deficit },
        )]
    }

    fn score_for_game(&self, config: &ScoringConfig) -> i32 {
        if self.deficit <= 0 {
            return 0;
        }
        config
            .table(self.name())
            .and_then(|table| table.highest_reached(self.deficit))
            .unwrap_or(0)
    }

    fn signals(&self) -> Signals {
        Signals {
            sacrifice_found: false,
            material_deficit: self.deficit,
        }
    }

    fn retain(&self, acc: &mut Vec<Candidate>, candidate: Candidate) {
        retain_best(acc, candidate, |new, best| deficit_of(new) > deficit_of(best));
    }

    fn select(&self, acc: &[Candidate], games: &[GameRecord]) -> Vec<Finding> {
        let Some(best) = acc.first() else {
            return Vec::new();
        };
        let Some(game) = games.get(best.game) else {
            return Vec::new();
        };

        let finding = hydrate(game, Hydration::at(self.name(), "Biggest Comeback", best, -6))
            .with_value("material_deficit", "Material Deficit", deficit_of(best));
        vec![finding]
    }
}
