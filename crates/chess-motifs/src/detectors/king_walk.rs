//! King walks: mates delivered after hunting the enemy king far from home
//! with a run of checks.
//!
//! `score = square value × move multiplier × (checks × per-check multiplier)
//! × material multiplier`, all weights coming from [`KingWalkConfig`].

use chess_core::game_data::full_moves;
use chess_core::GameRecord;
use shakmaty::{Chess, Color, Position};

use crate::board::{material, relative_rank};
use crate::candidate::{Candidate, Detail};
use crate::config::{KingWalkConfig, ScoringConfig};
use crate::detector::{retain_best, Detector, MoveContext};
use crate::finding::{hydrate, one_decimal, Finding, Hydration};

/// The hunt is measured over the last ten full moves.
const HUNT_WINDOW: usize = 20;

pub struct KingWalkDetector {
    config: KingWalkConfig,
    user_color: Color,
    /// Opponent material on the board before the first check of the hunt.
    hunt_material: Option<i32>,
    score: f64,
}

impl KingWalkDetector {
    pub fn new(config: KingWalkConfig) -> Self {
        Self {
            config,
            user_color: Color::White,
            hunt_material: None,
            score: 0.0,
        }
    }

    fn is_check(san: &str) -> bool {
        san.contains(['+', '#'])
    }

    /// Opponent material when the hunt starts, over the configured base.
    /// A game whose moves were not seen counts as full strength.
    fn material_multiplier(&self) -> f64 {
        if !self.config.material_multiplier_enabled {
            return 1.0;
        }
        match self.hunt_material {
            Some(material) => f64::from(material) / self.config.material_multiplier_base,
            None => 1.0,
        }
    }

    fn evaluate(&self, game: &GameRecord, end: Option<&Chess>) -> Option<Detail> {
        let moves = &game.moves;
        let full = full_moves(moves.len());
        if !game.won_by(self.user_color) || !game.ends_in_checkmate() || full > self.config.max_moves {
            return None;
        }

        let pos = end?;
        if !pos.is_checkmate() {
            return None;
        }
        let king_square = pos.board().king_of(!self.user_color)?;
        let square_value = self.config.square_value(relative_rank(king_square, self.user_color));
        if square_value == 0.0 {
            return None;
        }

        let window_start = moves.len().saturating_sub(HUNT_WINDOW);
        let checks = moves[window_start..].iter().filter(|m| Self::is_check(m)).count();
        let hunt = checks as f64 * self.config.hunt_multiplier_per_check;
        if hunt == 0.0 {
            return None;
        }
        let material = self.material_multiplier();
        if material < self.config.material_minimum {
            return None;
        }

        let score = square_value * self.config.move_multiplier(full) * hunt * material;
        if score < self.config.score_minimum {
            return None;
        }
        Some(Detail::KingWalk { king_square, score })
    }
}

impl Default for KingWalkDetector {
    fn default() -> Self {
        Self::new(KingWalkConfig::default())
    }
}

fn score_of(candidate: &Candidate) -> f64 {
    match candidate.detail {
        Detail::KingWalk { score, .. } => score,
        _ => 0.0,
    }
}

impl Detector for KingWalkDetector {
    fn name(&self) -> &'static str {
        "king_walk"
    }

    fn start_game(&mut self, _game: &GameRecord, user_color: Color) {
        self.user_color = user_color;
        self.hunt_material = None;
        self.score = 0.0;
    }

    fn process_move(&mut self, ctx: &MoveContext) {
        if self.hunt_material.is_some() || !Self::is_check(ctx.san) {
            return;
        }
        let window_start = ctx.game.ply_count().saturating_sub(HUNT_WINDOW);
        if ctx.ply > window_start {
            self.hunt_material = Some(material(ctx.board.board(), !self.user_color));
        }
    }

    fn finish_game(&mut self, game: &GameRecord, end: Option<&Chess>) -> Vec<Candidate> {
        let Some(detail) = self.evaluate(game, end) else {
            return Vec::new();
        };
        if let Detail::KingWalk { score, .. } = detail {
            self.score = score;
        }
        vec![Candidate::new(self.user_color, game.ply_count(), detail)]
    }

    fn score_for_game(&self, _config: &ScoringConfig) -> i32 {
        self.score.round() as i32
    }

    fn retain(&self, acc: &mut Vec<Candidate>, candidate: Candidate) {
        retain_best(acc, candidate, |new, best| score_of(new) > score_of(best));
    }

    fn select(&self, acc: &[Candidate], games: &[GameRecord]) -> Vec<Finding> {
        let Some(best) = acc.first() else {
            return Vec::new();
        };
        let Some(game) = games.get(best.game) else {
            return Vec::new();
        };
        let Detail::KingWalk { king_square, score } = &best.detail else {
            return Vec::new();
        };

        let finding = hydrate(game, Hydration::at(self.name(), "King Walk", best, -(HUNT_WINDOW as i64)))
            .with_value("king_square", "King Mated On", king_square.to_string())
            .with_value("score", "King Walk Score", one_decimal(*score));
        vec![finding]
    }
}
