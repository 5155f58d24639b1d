//! Windmill: a rook alternating direct and discovered checks against a
//! king that can only shuffle, picking up material on the way.

use std::sync::LazyLock;

use chess_core::GameRecord;
use regex::Regex;
use shakmaty::{Chess, Color, Position, Role};

use crate::candidate::{Candidate, Detail};
use crate::config::ScoringConfig;
use crate::detector::{Detector, MoveContext};
use crate::finding::{hydrate, Finding, Hydration};

static ROOK_CHECK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"R[a-h]?[1-8]?x?[a-h][1-8]\+").expect("valid rook check regex"));

const MIN_ROOK_CHECKS_IN_PGN: usize = 3;
const MAX_REPLIES: usize = 2;
const MIN_RUN: usize = 3;
const MIN_ROOK_MOVES: usize = 2;
const MIN_CAPTURES: usize = 2;
const MIN_DISCOVERED: usize = 1;

#[derive(Debug, Clone, Copy)]
struct RunStep {
    ply: usize,
    rook_move: bool,
    capture: bool,
    discovered: bool,
}

pub struct WindmillDetector {
    user_color: Color,
    skip_game: bool,
    run: Vec<RunStep>,
    found: Option<Candidate>,
}

impl WindmillDetector {
    pub fn new() -> Self {
        Self {
            user_color: Color::White,
            skip_game: true,
            run: Vec::new(),
            found: None,
        }
    }

    fn rook_check(&mut self, ctx: &MoveContext) {
        let after = ctx.position_after();
        if after.legal_moves().len() > MAX_REPLIES {
            self.close_run();
            return;
        }
        let discovered = after.checkers().into_iter().any(|sq| sq != ctx.mv.to());
        self.run.push(RunStep {
            ply: ctx.ply,
            rook_move: true,
            capture: ctx.mv.is_capture(),
            discovered,
        });
    }

    fn close_run(&mut self) {
        let run = std::mem::take(&mut self.run);
        if self.found.is_some() || run.len() < MIN_RUN {
            return;
        }
        let rook_moves: Vec<&RunStep> = run.iter().filter(|s| s.rook_move).collect();
        let captures = rook_moves.iter().filter(|s| s.capture).count();
        let discovered = rook_moves.iter().filter(|s| s.discovered).count();
        if rook_moves.len() < MIN_ROOK_MOVES || captures < MIN_CAPTURES || discovered < MIN_DISCOVERED {
            return;
        }
        self.found = Some(Candidate::new(
            self.user_color,
            run[0].ply,
            Detail::Windmill {
                captures,
                checks: rook_moves.len(),
            },
        ));
    }
}

impl Default for WindmillDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for WindmillDetector {
    fn name(&self) -> &'static str {
        "windmill"
    }

    fn start_game(&mut self, game: &GameRecord, user_color: Color) {
        self.user_color = user_color;
        self.skip_game = ROOK_CHECK_RE.find_iter(&game.pgn).count() < MIN_ROOK_CHECKS_IN_PGN;
        self.run.clear();
        self.found = None;
    }

    fn process_move(&mut self, ctx: &MoveContext) {
        if self.skip_game || self.found.is_some() {
            return;
        }

        if ctx.is_user_move && ctx.mv.role() == Role::Rook && ctx.position_after().is_check() {
            self.rook_check(ctx);
            return;
        }
        if ctx.is_opponent_move() && ctx.mv.role() == Role::King && !self.run.is_empty() {
            self.run.push(RunStep {
                ply: ctx.ply,
                rook_move: false,
                capture: ctx.mv.is_capture(),
                discovered: false,
            });
            return;
        }
        if !self.run.is_empty() {
            self.close_run();
        }
    }

    fn finish_game(&mut self, _game: &GameRecord, _end: Option<&Chess>) -> Vec<Candidate> {
        self.close_run();
        self.found.clone().into_iter().collect()
    }

    fn score_for_game(&self, config: &ScoringConfig) -> i32 {
        if self.found.is_some() {
            config.points("windmill", 25)
        } else {
            0
        }
    }

    fn select(&self, acc: &[Candidate], games: &[GameRecord]) -> Vec<Finding> {
        let captures_of = |c: &Candidate| match c.detail {
            Detail::Windmill { captures, .. } => captures,
            _ => 0,
        };
        let best = acc
            .iter()
            .min_by_key(|c| (std::cmp::Reverse(captures_of(c)), c.game, c.ply));
        let Some(best) = best else {
            return Vec::new();
        };
        let Some(game) = games.get(best.game) else {
            return Vec::new();
        };

        let finding = hydrate(game, Hydration::at(self.name(), "Windmill Tactic", best, -1))
            .with_value("captures", "Captures", captures_of(best))
            .with_value("total_windmills", "Total Windmills", acc.len());
        vec![finding]
    }
}
