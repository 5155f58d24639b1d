use chess_core::GameRecord;
use shakmaty::{attacks, Chess, Color, Position, Role};

use crate::board::fork_value;
use crate::candidate::{role_name, Candidate, Detail};
use crate::config::ScoringConfig;
use crate::detector::{Detector, MoveContext};
use crate::detectors::is_tactical_win;
use crate::finding::{hydrate, Finding, Hydration};

const MIN_RATING: f64 = 600.0;
const MIN_TARGETS: usize = 2;
/// King plus rook, queen plus anything, two rooks.
const MIN_FORK_VALUE: i32 = 8;

/// Detects the first knight move per game that attacks two or more valuable
/// enemy pieces at once.
pub struct KnightForkDetector {
    user_color: Color,
    eligible: bool,
    found: Option<Candidate>,
}

impl KnightForkDetector {
    pub fn new() -> Self {
        Self {
            user_color: Color::White,
            eligible: false,
            found: None,
        }
    }

    /// Value of the fork that counts towards points; the king only qualifies it.
    fn scored_value(detail: &Detail) -> i32 {
        match detail {
            Detail::KnightFork { royal, value, .. } => {
                if *royal {
                    value - fork_value(Role::King)
                } else {
                    *value
                }
            }
            _ => 0,
        }
    }
}

impl Default for KnightForkDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for KnightForkDetector {
    fn name(&self) -> &'static str {
        "knight_fork"
    }

    fn start_game(&mut self, game: &GameRecord, user_color: Color) {
        self.user_color = user_color;
        self.eligible = is_tactical_win(game, user_color, MIN_RATING);
        self.found = None;
    }

    fn process_move(&mut self, ctx: &MoveContext) {
        if !self.eligible || !ctx.is_user_move || self.found.is_some() {
            return;
        }
        if ctx.mv.role() != Role::Knight {
            return;
        }

        let after = ctx.position_after();
        let board = after.board();
        let knight_square = ctx.mv.to();
        let targets = attacks::knight_attacks(knight_square) & board.by_color(!self.user_color);
        if targets.count() < MIN_TARGETS {
            return;
        }

        let roles: Vec<Role> = targets
            .into_iter()
            .filter_map(|sq| board.piece_at(sq).map(|piece| piece.role))
            .collect();
        let value: i32 = roles.iter().map(|&role| fork_value(role)).sum();
        if value < MIN_FORK_VALUE {
            return;
        }

        self.found = Some(Candidate::new(
            self.user_color,
            ctx.ply,
            Detail::KnightFork {
                royal: roles.contains(&Role::King),
                knight_square,
                forked: roles.iter().map(|&role| role_name(role).to_string()).collect(),
                value,
            },
        ));
    }

    fn finish_game(&mut self, _game: &GameRecord, _end: Option<&Chess>) -> Vec<Candidate> {
        self.found.clone().into_iter().collect()
    }

    fn score_for_game(&self, config: &ScoringConfig) -> i32 {
        let Some(found) = &self.found else {
            return 0;
        };
        let (base_points, per_piece_value) = config.scaled("knight_fork", 15, 2);
        base_points + per_piece_value * Self::scored_value(&found.detail)
    }

    fn select(&self, acc: &[Candidate], games: &[GameRecord]) -> Vec<Finding> {
        let mut ordered: Vec<&Candidate> = acc.iter().collect();
        ordered.sort_by_key(|c| (c.game, c.ply));

        ordered
            .into_iter()
            .filter_map(|candidate| {
                let game = games.get(candidate.game)?;
                let Detail::KnightFork {
                    royal,
                    knight_square,
                    forked,
                    value,
                } = &candidate.detail
                else {
                    return None;
                };
                let display_name = if *royal { "Royal Knight Fork" } else { "Knight Fork" };
                let fork_move = game.moves.get(candidate.ply - 1).cloned().unwrap_or_default();

                let finding = hydrate(game, Hydration::at(self.name(), display_name, candidate, -1))
                    .with_value("fork_move", "Fork Move", fork_move)
                    .with_value("forked_pieces", "Forked Pieces", forked.join(" & "))
                    .with_value("knight_square", "Knight Square", knight_square.to_string())
                    .with_value("total_value", "Total Value", *value)
                    .with_value("total_knight_forks", "Total Knight Forks", acc.len());
                Some(finding)
            })
            .collect()
    }
}
