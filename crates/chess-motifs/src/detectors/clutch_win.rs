use chess_core::pgn::clock_annotations;
use chess_core::GameRecord;
use shakmaty::{Chess, Color};

use crate::candidate::{Candidate, Detail};
use crate::detector::{retain_best, Detector};
use crate::finding::{hydrate, Finding, Hydration};

const MAX_SECONDS: f64 = 0.5;
/// Full moves of context shown before the final position.
const CONTEXT_MOVES: i64 = 5;

/// Tracks the checkmate win finished with the least time on the user's clock.
pub struct ClutchWinDetector {
    user_color: Color,
}

impl ClutchWinDetector {
    pub fn new() -> Self {
        Self {
            user_color: Color::White,
        }
    }
}

impl Default for ClutchWinDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// The user's last clock reading. White's readings are the even entries.
fn final_clock(pgn: &str, user_color: Color) -> Option<f64> {
    let parity = user_color.fold_wb(0, 1);
    clock_annotations(pgn)
        .into_iter()
        .enumerate()
        .filter(|(i, _)| i % 2 == parity)
        .last()
        .and_then(|(_, clock)| clock)
}

fn seconds_of(candidate: &Candidate) -> f64 {
    match candidate.detail {
        Detail::Clutch { seconds } => seconds,
        _ => f64::INFINITY,
    }
}

fn format_time(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{seconds:.1} seconds")
    } else {
        let minutes = (seconds / 60.0).floor();
        format!("{}:{:05.2}", minutes as u64, seconds - minutes * 60.0)
    }
}

impl Detector for ClutchWinDetector {
    fn name(&self) -> &'static str {
        "clutch_win"
    }

    fn start_game(&mut self, _game: &GameRecord, user_color: Color) {
        self.user_color = user_color;
    }

    fn finish_game(&mut self, game: &GameRecord, _end: Option<&Chess>) -> Vec<Candidate> {
        if game.metadata.is_daily() || !game.won_by(self.user_color) || !game.ends_in_checkmate() {
            return Vec::new();
        }
        let Some(seconds) = final_clock(&game.pgn, self.user_color) else {
            return Vec::new();
        };
        if seconds > MAX_SECONDS {
            return Vec::new();
        }
        vec![Candidate::new(
            self.user_color,
            game.ply_count(),
            Detail::Clutch { seconds },
        )]
    }

    fn retain(&self, acc: &mut Vec<Candidate>, candidate: Candidate) {
        retain_best(acc, candidate, |new, best| seconds_of(new) < seconds_of(best));
    }

    fn select(&self, acc: &[Candidate], games: &[GameRecord]) -> Vec<Finding> {
        let Some(best) = acc.first() else {
            return Vec::new();
        };
        let Some(game) = games.get(best.game) else {
            return Vec::new();
        };

        // Anchored on the last move index, not the ply count.
        let last_index = game.ply_count().saturating_sub(1);
        let finding = hydrate(
            game,
            Hydration {
                motif: self.name(),
                display_name: "Clutch Win",
                user_color: best.user_color,
                key_ply: last_index as i64 - CONTEXT_MOVES * 2,
                link_move: Some(last_index),
            },
        )
        .with_value(
            "time_remaining_display",
            "Time Remaining",
            format_time(seconds_of(best)),
        );
        vec![finding]
    }
}
