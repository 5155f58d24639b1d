//! Base trait and types for motif detectors.

use chess_core::GameRecord;
use shakmaty::{Chess, Color, Move, Position};

use crate::candidate::Candidate;
use crate::config::ScoringConfig;
use crate::finding::Finding;

/// Context available to detectors at each move.
pub struct MoveContext<'a> {
    pub mv: &'a Move,
    pub ply: usize,       // 1-indexed half-move number
    pub board: &'a Chess, // Board state BEFORE the move
    pub san: &'a str,
    pub is_user_move: bool,
    pub user_color: Color,
    pub game: &'a GameRecord,
}

impl MoveContext<'_> {
    pub fn is_opponent_move(&self) -> bool {
        !self.is_user_move
    }

    /// Board after this move is played.
    pub fn position_after(&self) -> Chess {
        let mut pos = self.board.clone();
        pos.play_unchecked(self.mv.clone());
        pos
    }
}

/// Static facts about a game, computed once by the engine before replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameFacts {
    pub ends_in_mate: bool,
    pub user_won: bool,
    pub user_lost: bool,
    pub drawn: bool,
}

impl GameFacts {
    pub fn of(game: &GameRecord, user_color: Color) -> Self {
        Self {
            ends_in_mate: game.ends_in_checkmate(),
            user_won: game.won_by(user_color),
            user_lost: game.lost_by(user_color),
            drawn: game.metadata.result.is_draw(),
        }
    }
}

/// Cheap predicate deciding whether a detector sees a game's moves at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Mate,
    Win,
    Draw,
    Loss,
}

impl Gate {
    pub fn admits(self, facts: &GameFacts) -> bool {
        match self {
            Gate::Mate => facts.ends_in_mate,
            Gate::Win => facts.user_won,
            Gate::Draw => facts.drawn,
            Gate::Loss => facts.user_lost,
        }
    }
}

/// Auxiliary signals the scorer reads for the game just finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    pub sacrifice_found: bool,
    pub material_deficit: i32,
}

/// One detector's typed contribution to the best-game score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contribution {
    pub key: Option<&'static str>,
    pub points: i32,
    pub signals: Signals,
}

/// Trait that all detectors implement.
///
/// A detector is idle between games. `start_game` must reset every per-game
/// field. Candidates leave the detector through `finish_game`; the engine
/// owns the cross-game accumulator and hands it back to `select`.
pub trait Detector: Send {
    /// Registry identifier.
    fn name(&self) -> &'static str;

    /// Initialize state for a new game.
    fn start_game(&mut self, game: &GameRecord, user_color: Color);

    /// Process a single move. Only called for games the detector's gates admit.
    fn process_move(&mut self, _ctx: &MoveContext) {}

    /// Finalize the game and return its candidates. Called for every game,
    /// including ones this detector was gated out of. `end` is the final
    /// position resolved once by the engine; `None` when the moves did not
    /// replay.
    fn finish_game(&mut self, game: &GameRecord, end: Option<&Chess>) -> Vec<Candidate>;

    /// Points earned by the game just finished.
    fn score_for_game(&self, _config: &ScoringConfig) -> i32 {
        0
    }

    fn signals(&self) -> Signals {
        Signals::default()
    }

    /// Fold a new candidate into the batch accumulator.
    fn retain(&self, acc: &mut Vec<Candidate>, candidate: Candidate) {
        acc.push(candidate);
    }

    /// Pick and hydrate findings from the whole batch. Must not mutate state.
    fn select(&self, acc: &[Candidate], games: &[GameRecord]) -> Vec<Finding>;
}

/// Keep `candidate` only when it beats the current best. Ties keep the
/// earlier game.
pub fn retain_best<F>(acc: &mut Vec<Candidate>, candidate: Candidate, better: F)
where
    F: Fn(&Candidate, &Candidate) -> bool,
{
    match acc.first() {
        Some(best) if !better(&candidate, best) => {}
        _ => {
            acc.clear();
            acc.push(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Detail;

    fn length(game: usize, plies: usize) -> Candidate {
        Candidate {
            game,
            user_color: Color::White,
            ply: plies,
            detail: Detail::Length { plies },
        }
    }

    #[test]
    fn test_retain_best_is_strict() {
        let longer = |a: &Candidate, b: &Candidate| a.ply > b.ply;
        let mut acc = Vec::new();
        retain_best(&mut acc, length(0, 40), longer);
        retain_best(&mut acc, length(1, 40), longer);
        assert_eq!(acc.len(), 1);
        assert_eq!(acc[0].game, 0);
        retain_best(&mut acc, length(2, 41), longer);
        assert_eq!(acc[0].game, 2);
    }

    #[test]
    fn test_gates() {
        let facts = GameFacts {
            ends_in_mate: true,
            user_won: false,
            user_lost: true,
            drawn: false,
        };
        assert!(Gate::Mate.admits(&facts));
        assert!(!Gate::Win.admits(&facts));
        assert!(Gate::Loss.admits(&facts));
        assert!(!Gate::Draw.admits(&facts));
    }
}
