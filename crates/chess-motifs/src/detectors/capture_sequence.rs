use chess_core::GameRecord;
use shakmaty::{Chess, Color};

use crate::candidate::{Candidate, Detail};
use crate::config::ScoringConfig;
use crate::detector::{retain_best, Detector};
use crate::finding::{hydrate, Finding, Hydration};

/// Longest run of consecutive capture plies, by either side. Works on the
/// notation alone.
pub struct CaptureSequenceDetector {
    user_color: Color,
    length: usize,
}

impl CaptureSequenceDetector {
    pub fn new() -> Self {
        Self {
            user_color: Color::White,
            length: 0,
        }
    }
}

impl Default for CaptureSequenceDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// `(start_ply, length)` of the first longest capture run.
fn longest_run(moves: &[String]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    let mut current: Option<(usize, usize)> = None;

    for (i, san) in moves.iter().enumerate() {
        if san.contains('x') {
            let (start, len) = current.unwrap_or((i + 1, 0));
            current = Some((start, len + 1));
        } else {
            current = None;
        }
        if let Some(run) = current {
            if best.is_none_or(|(_, len)| run.1 > len) {
                best = Some(run);
            }
        }
    }
    best
}

fn length_of(candidate: &Candidate) -> usize {
    match candidate.detail {
        Detail::CaptureRun { length, .. } => length,
        _ => 0,
    }
}

impl Detector for CaptureSequenceDetector {
    fn name(&self) -> &'static str {
        "capture_sequence"
    }

    fn start_game(&mut self, _game: &GameRecord, user_color: Color) {
        self.user_color = user_color;
        self.length = 0;
    }

    fn finish_game(&mut self, game: &GameRecord, _end: Option<&Chess>) -> Vec<Candidate> {
        let Some((start_ply, length)) = longest_run(&game.moves) else {
            return Vec::new();
        };
        self.length = length;
        let moves = game.moves[start_ply - 1..start_ply - 1 + length].to_vec();
        vec![Candidate::new(
            self.user_color,
            start_ply,
            Detail::CaptureRun {
                start_ply,
                length,
                moves,
            },
        )]
    }

    fn score_for_game(&self, config: &ScoringConfig) -> i32 {
        if self.length == 0 {
            return 0;
        }
        let (base_points, per_capture) = config.scaled(self.name(), 10, 2);
        base_points + per_capture * self.length as i32
    }

    fn retain(&self, acc: &mut Vec<Candidate>, candidate: Candidate) {
        retain_best(acc, candidate, |new, best| length_of(new) > length_of(best));
    }

    fn select(&self, acc: &[Candidate], games: &[GameRecord]) -> Vec<Finding> {
        let Some(best) = acc.first() else {
            return Vec::new();
        };
        let Some(game) = games.get(best.game) else {
            return Vec::new();
        };
        let Detail::CaptureRun { length, moves, .. } = &best.detail else {
            return Vec::new();
        };

        let finding = hydrate(
            game,
            Hydration::at(self.name(), "Longest Capture Sequence", best, -1),
        )
        .with_value("length", "Consecutive Captures", *length)
        .with_value("capture_moves", "Captures", moves.join(" "));
        vec![finding]
    }
}
