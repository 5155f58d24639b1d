//! Hung queens: the opponent takes the user's queen for free in a game the
//! user went on to lose.

use chess_core::game_data::{full_moves, mover_of_ply};
use chess_core::GameRecord;
use shakmaty::{Bitboard, Chess, Color, Position, Role, Square};

use crate::board::pins_queen_to_king;
use crate::candidate::{Candidate, Detail};
use crate::config::ScoringConfig;
use crate::detector::{Detector, MoveContext};
use crate::finding::{hydrate, one_decimal, Finding, Hydration};

/// Plies after the capture in which winning the opponent's queen back
/// turns the loss into a trade.
const TRADE_WINDOW: usize = 4;
/// A resignation this close to the capture counts as resigning over it.
const RESIGN_WINDOW: usize = 2;

pub struct HungQueenDetector {
    user_color: Color,
    active: bool,
    done: bool,
    queen_just_landed: Option<Square>,
    opponent_gave_check: bool,
    capture_ply: Option<usize>,
}

impl HungQueenDetector {
    pub fn new() -> Self {
        Self {
            user_color: Color::White,
            active: false,
            done: false,
            queen_just_landed: None,
            opponent_gave_check: false,
            capture_ply: None,
        }
    }

    /// The capture has an explanation other than a blunder.
    fn is_excused(&self, ctx: &MoveContext, landed: Option<Square>, after_check: bool) -> bool {
        let board = ctx.board.board();
        let to = ctx.mv.to();

        if ctx.mv.role() == Role::Queen || after_check || landed == Some(to) {
            return true;
        }

        let opponent_queens = board.by_color(!self.user_color) & board.by_role(Role::Queen);
        if opponent_queens.is_empty() || self.queen_won_back(ctx.game, ctx.ply, opponent_queens) {
            return true;
        }

        match (ctx.mv.from(), board.king_of(self.user_color)) {
            (Some(from), Some(king)) => {
                pins_queen_to_king(ctx.mv.role(), from, to, king, board.occupied())
            }
            _ => false,
        }
    }

    /// The user captures on an opponent queen square within the next few plies.
    fn queen_won_back(&self, game: &GameRecord, ply: usize, queens: Bitboard) -> bool {
        let targets: Vec<String> = queens.into_iter().map(|sq| format!("x{sq}")).collect();
        (ply + 1..=ply + TRADE_WINDOW)
            .filter(|&p| mover_of_ply(p) == self.user_color)
            .filter_map(|p| game.moves.get(p - 1))
            .any(|san| targets.iter().any(|t| san.contains(t.as_str())))
    }
}

impl Default for HungQueenDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for HungQueenDetector {
    fn name(&self) -> &'static str {
        "hung_queen"
    }

    fn start_game(&mut self, game: &GameRecord, user_color: Color) {
        self.user_color = user_color;
        self.active = game.lost_by(user_color);
        self.done = false;
        self.queen_just_landed = None;
        self.opponent_gave_check = false;
        self.capture_ply = None;
    }

    fn process_move(&mut self, ctx: &MoveContext) {
        if !self.active || self.done {
            return;
        }
        if ctx.is_user_move {
            self.queen_just_landed = (ctx.mv.role() == Role::Queen).then(|| ctx.mv.to());
            return;
        }

        let landed = self.queen_just_landed.take();
        let after_check = std::mem::replace(
            &mut self.opponent_gave_check,
            ctx.san.contains(['+', '#']),
        );
        if ctx.mv.capture() != Some(Role::Queen) {
            return;
        }

        // Only the first capture of the user's queen is judged.
        self.done = true;
        if !self.is_excused(ctx, landed, after_check) {
            self.capture_ply = Some(ctx.ply);
        }
    }

    fn finish_game(&mut self, game: &GameRecord, _end: Option<&Chess>) -> Vec<Candidate> {
        self.queen_just_landed = None;
        let Some(ply) = self.capture_ply else {
            return Vec::new();
        };
        let Some(capture_move) = game.moves.get(ply - 1) else {
            return Vec::new();
        };

        let resigned_after = game.terminated_by("resign")
            && game.ply_count().saturating_sub(ply) <= RESIGN_WINDOW;
        vec![Candidate::new(
            self.user_color,
            ply,
            Detail::HungQueen {
                move_number: full_moves(ply),
                resigned_after,
                capture_move: capture_move.clone(),
            },
        )]
    }

    fn score_for_game(&self, config: &ScoringConfig) -> i32 {
        if self.capture_ply.is_some() {
            config.points("hung_queen", -5)
        } else {
            0
        }
    }

    fn select(&self, acc: &[Candidate], games: &[GameRecord]) -> Vec<Finding> {
        let rank = |c: &Candidate| match &c.detail {
            Detail::HungQueen {
                move_number,
                resigned_after,
                ..
            } => (!resigned_after, *move_number, c.game),
            _ => (true, usize::MAX, c.game),
        };
        let Some(best) = acc.iter().min_by_key(|c| rank(c)) else {
            return Vec::new();
        };
        let Some(game) = games.get(best.game) else {
            return Vec::new();
        };

        let resigned = acc
            .iter()
            .filter(|c| matches!(c.detail, Detail::HungQueen { resigned_after: true, .. }))
            .count();
        let percentage = one_decimal(resigned as f64 * 100.0 / acc.len() as f64);

        let finding = hydrate(game, Hydration::at(self.name(), "Hung Queen", best, -2))
            .with_value("total_hung_queens", "Total Hung Queens", acc.len())
            .with_value("resignation_percentage", "Resigned After (%)", percentage);
        vec![finding]
    }
}
