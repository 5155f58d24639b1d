//! Queen and rook sacrifices.
//!
//! One state machine serves both pieces. The user's piece either captures
//! anything but its own counterpart or gives a quiet check, the opponent takes it on the very
//! next ply with a different piece type, and the user's following move does
//! not win back the opponent's piece of the same kind.

use chess_core::game_data::full_moves;
use chess_core::GameRecord;
use shakmaty::{Chess, Color, Position, Role, Square};

use crate::board::{is_pinned, material_balance};
use crate::candidate::{Candidate, Detail};
use crate::config::ScoringConfig;
use crate::detector::{Detector, MoveContext, Signals};
use crate::detectors::is_tactical_win;
use crate::finding::{hydrate, Finding, Hydration};

const MIN_RATING: f64 = 600.0;
const MAX_ADVANTAGE: i32 = 5;
const MATE_WINDOW: std::ops::RangeInclusive<usize> = 1..=5;

#[derive(Debug, Clone)]
struct Pending {
    ply: usize,
    san: String,
    square: Square,
    material_advantage: i32,
    pinned: bool,
    taken: bool,
}

#[derive(Debug, Clone)]
struct Recorded {
    ply: usize,
    san: String,
    material_advantage: i32,
}

pub struct SacrificeDetector {
    role: Role,
    name: &'static str,
    display_name: &'static str,
    default_points: i32,
    user_color: Color,
    eligible: bool,
    pending: Option<Pending>,
    recorded: Option<Recorded>,
}

impl SacrificeDetector {
    pub fn queen() -> Self {
        Self::new(Role::Queen, "queen_sacrifice", "Queen Sacrifice", 30)
    }

    pub fn rook() -> Self {
        Self::new(Role::Rook, "rook_sacrifice", "Rook Sacrifice", 20)
    }

    fn new(role: Role, name: &'static str, display_name: &'static str, default_points: i32) -> Self {
        Self {
            role,
            name,
            display_name,
            default_points,
            user_color: Color::White,
            eligible: false,
            pending: None,
            recorded: None,
        }
    }

    fn user_move(&mut self, ctx: &MoveContext) {
        if let Some(pending) = self.pending.take() {
            if pending.taken && ctx.ply == pending.ply + 2 {
                // Winning back the same piece is a trade.
                if ctx.mv.capture() != Some(self.role) {
                    self.record(pending);
                }
                return;
            }
        }

        if ctx.mv.role() != self.role {
            return;
        }
        let from = ctx.mv.from();
        let pinned = from.is_some_and(|sq| is_pinned(ctx.board.board(), ctx.user_color, sq));
        let material_advantage = material_balance(ctx.board.board(), ctx.user_color);

        let triggered = match ctx.mv.capture() {
            Some(captured) => captured != self.role,
            None => ctx.position_after().is_check(),
        };
        if triggered {
            self.pending = Some(Pending {
                ply: ctx.ply,
                san: ctx.san.to_string(),
                square: ctx.mv.to(),
                material_advantage,
                pinned,
                taken: false,
            });
        }
    }

    fn opponent_move(&mut self, ctx: &MoveContext) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        let takes_it = ctx.ply == pending.ply + 1
            && !pending.taken
            && ctx.mv.is_capture()
            && ctx.mv.to() == pending.square
            && ctx.mv.role() != self.role;
        if takes_it {
            pending.taken = true;
        } else {
            self.pending = None;
        }
    }

    fn record(&mut self, pending: Pending) {
        if pending.material_advantage >= MAX_ADVANTAGE || pending.pinned {
            return;
        }
        self.recorded = Some(Recorded {
            ply: pending.ply,
            san: pending.san,
            material_advantage: pending.material_advantage,
        });
    }

    /// Full moves from the sacrifice to the user's mate, when inside the
    /// 1 to 5 move window.
    fn moves_to_mate(&self, game: &GameRecord, sacrifice_ply: usize) -> Option<u32> {
        let user_mated = game.won_by(self.user_color)
            && game.ends_in_checkmate()
            && game.last_move_by(self.user_color);
        if !user_mated {
            return None;
        }
        let gap = full_moves(game.ply_count()).checked_sub(full_moves(sacrifice_ply))?;
        MATE_WINDOW.contains(&gap).then_some(gap as u32)
    }
}

impl Detector for SacrificeDetector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn start_game(&mut self, game: &GameRecord, user_color: Color) {
        self.user_color = user_color;
        self.eligible = is_tactical_win(game, user_color, MIN_RATING);
        self.pending = None;
        self.recorded = None;
    }

    fn process_move(&mut self, ctx: &MoveContext) {
        if !self.eligible || self.recorded.is_some() {
            return;
        }
        if ctx.is_user_move {
            self.user_move(ctx);
        } else {
            self.opponent_move(ctx);
        }
    }

    fn finish_game(&mut self, game: &GameRecord, _end: Option<&Chess>) -> Vec<Candidate> {
        self.pending = None;
        let Some(recorded) = self.recorded.as_ref() else {
            return Vec::new();
        };
        vec![Candidate::new(
            self.user_color,
            recorded.ply,
            Detail::Sacrifice {
                role: self.role,
                sacrifice_move: recorded.san.clone(),
                moves_to_mate: self.moves_to_mate(game, recorded.ply),
                material_advantage: recorded.material_advantage,
            },
        )]
    }

    fn score_for_game(&self, config: &ScoringConfig) -> i32 {
        if self.recorded.is_some() {
            config.points(self.name, self.default_points)
        } else {
            0
        }
    }

    fn signals(&self) -> Signals {
        Signals {
            sacrifice_found: self.recorded.is_some(),
            material_deficit: 0,
        }
    }

    fn select(&self, acc: &[Candidate], games: &[GameRecord]) -> Vec<Finding> {
        let mut ordered: Vec<&Candidate> = acc.iter().collect();
        ordered.sort_by_key(|c| c.game);

        ordered
            .into_iter()
            .filter_map(|candidate| {
                let game = games.get(candidate.game)?;
                let Detail::Sacrifice {
                    sacrifice_move,
                    moves_to_mate,
                    ..
                } = &candidate.detail
                else {
                    return None;
                };
                let mut finding = hydrate(
                    game,
                    Hydration::at(self.name, self.display_name, candidate, -1),
                )
                .with_value("sacrifice_move", "Sacrifice Move", sacrifice_move.as_str())
                .with_value("total_sacrifices", "Total Sacrifices", acc.len());
                if let Some(moves) = moves_to_mate {
                    finding = finding.with_value("moves_to_mate", "Moves to Mate", *moves);
                }
                Some(finding)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::{finish, plies_ending, record, step};

    const SAC: &str = "1r4k1/1p3ppp/8/3Q4/8/8/5PPP/6K1 w - - 0 1";
    const TAKEN: &str = "1r4k1/1Q3ppp/8/8/8/8/5PPP/6K1 b - - 0 1";
    const AFTER: &str = "6k1/1r3ppp/8/8/8/8/5PPP/6K1 w - - 0 1";

    fn won_by_mate(total_plies: usize) -> GameRecord {
        record("1-0", &plies_ending(total_plies - 1, "Qg7#"), "")
    }

    fn play(detector: &mut SacrificeDetector, game: &GameRecord, moves: &[(&str, &str)]) -> Vec<Candidate> {
        detector.start_game(game, Color::White);
        for (offset, (fen, san)) in moves.iter().enumerate() {
            step(detector, game, Color::White, fen, san, 21 + offset);
        }
        finish(detector, game)
    }

    #[test]
    fn test_queen_sacrifice_with_mate_five_moves_later() {
        let game = won_by_mate(31);
        let mut detector = SacrificeDetector::queen();
        let found = play(
            &mut detector,
            &game,
            &[(SAC, "Qxb7"), (TAKEN, "Rxb7"), (AFTER, "h3")],
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].ply, 21);
        assert!(matches!(
            found[0].detail,
            Detail::Sacrifice { moves_to_mate: Some(5), material_advantage: 3, .. }
        ));
        assert!(detector.signals().sacrifice_found);
        assert_eq!(detector.score_for_game(&ScoringConfig::default()), 30);
    }

    #[test]
    fn test_mate_six_moves_later_leaves_window_unset() {
        let game = won_by_mate(33);
        let mut detector = SacrificeDetector::queen();
        let found = play(
            &mut detector,
            &game,
            &[(SAC, "Qxb7"), (TAKEN, "Rxb7"), (AFTER, "h3")],
        );
        assert!(matches!(
            found[0].detail,
            Detail::Sacrifice { moves_to_mate: None, .. }
        ));
    }

    #[test]
    fn test_queen_for_queen_is_never_a_sacrifice() {
        let game = won_by_mate(31);
        let mut detector = SacrificeDetector::queen();
        let found = play(
            &mut detector,
            &game,
            &[
                ("3q1rk1/6pp/8/8/8/8/6PP/3Q2K1 w - - 0 1", "Qxd8"),
                ("3Q1rk1/6pp/8/8/8/8/6PP/6K1 b - - 0 1", "Rxd8"),
                ("3r2k1/6pp/8/8/8/8/6PP/6K1 w - - 0 1", "h3"),
            ],
        );
        assert!(found.is_empty());
        assert!(!detector.signals().sacrifice_found);
    }

    #[test]
    fn test_large_material_advantage_voids() {
        let game = won_by_mate(31);
        let mut detector = SacrificeDetector::queen();
        let found = play(
            &mut detector,
            &game,
            &[
                ("1r4k1/1p3ppp/8/3Q4/8/8/PPPP1PPP/RN4K1 w - - 0 1", "Qxb7"),
                ("1r4k1/1Q3ppp/8/8/8/8/PPPP1PPP/RN4K1 b - - 0 1", "Rxb7"),
                ("6k1/1r3ppp/8/8/8/8/PPPP1PPP/RN4K1 w - - 0 1", "h3"),
            ],
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_pinned_queen_voids() {
        let game = won_by_mate(31);
        let mut detector = SacrificeDetector::queen();
        let found = play(
            &mut detector,
            &game,
            &[
                ("4rk2/8/8/8/8/8/4Q3/4K3 w - - 0 1", "Qxe8+"),
                ("4Qk2/8/8/8/8/8/8/4K3 b - - 0 1", "Kxe8"),
                ("4k3/8/8/8/8/8/8/4K3 w - - 0 1", "Kd2"),
            ],
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_declined_sacrifice_is_cleared() {
        let game = won_by_mate(31);
        let mut detector = SacrificeDetector::queen();
        let found = play(
            &mut detector,
            &game,
            &[
                (SAC, "Qxb7"),
                (TAKEN, "h6"),
                ("1r4k1/1Q3pp1/7p/8/8/8/5PPP/6K1 w - - 0 1", "h3"),
            ],
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_time_forfeit_wins_are_ignored() {
        let mut game = won_by_mate(31);
        game.pgn.push_str("\n[Termination \"alice won on time\"]");
        let mut detector = SacrificeDetector::queen();
        let found = play(
            &mut detector,
            &game,
            &[(SAC, "Qxb7"), (TAKEN, "Rxb7"), (AFTER, "h3")],
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_rook_sacrifice_and_rook_trade() {
        let game = won_by_mate(31);
        let mut detector = SacrificeDetector::rook();
        let found = play(
            &mut detector,
            &game,
            &[
                ("6k1/5ppp/8/8/8/8/6PP/5RK1 w - - 0 1", "Rxf7"),
                ("6k1/5Rpp/8/8/8/8/6PP/6K1 b - - 0 1", "Kxf7"),
                ("8/5kpp/8/8/8/8/6PP/6K1 w - - 0 1", "h3"),
            ],
        );
        assert_eq!(found.len(), 1);
        assert!(matches!(found[0].detail, Detail::Sacrifice { role: Role::Rook, .. }));

        let found = play(
            &mut detector,
            &game,
            &[
                ("1r4k1/1p3ppp/8/8/8/8/5PPP/1R4K1 w - - 0 1", "Rxb7"),
                ("1r4k1/1R3ppp/8/8/8/8/5PPP/6K1 b - - 0 1", "Rxb7"),
                ("6k1/1r3ppp/8/8/8/8/5PPP/6K1 w - - 0 1", "h3"),
            ],
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_rook_takes_queen_and_is_recaptured() {
        let game = won_by_mate(31);
        let mut detector = SacrificeDetector::rook();
        let found = play(
            &mut detector,
            &game,
            &[
                ("3q2k1/4bppp/8/8/8/8/5PPP/3R2K1 w - - 0 1", "Rxd8+"),
                ("3R2k1/4bppp/8/8/8/8/5PPP/6K1 b - - 0 1", "Bxd8"),
                ("3b2k1/5ppp/8/8/8/8/5PPP/6K1 w - - 0 1", "h3"),
            ],
        );
        assert_eq!(found.len(), 1);
        assert!(matches!(
            &found[0].detail,
            Detail::Sacrifice { role: Role::Rook, sacrifice_move, .. } if sacrifice_move == "Rxd8+"
        ));
        assert_eq!(detector.score_for_game(&ScoringConfig::default()), 20);
    }

    #[test]
    fn test_findings_in_game_order() {
        let detector = SacrificeDetector::queen();
        let games = vec![won_by_mate(31), won_by_mate(41)];
        let detail = |m: Option<u32>| Detail::Sacrifice {
            role: Role::Queen,
            sacrifice_move: "Qxb7".into(),
            moves_to_mate: m,
            material_advantage: 0,
        };
        let acc = vec![
            Candidate { game: 1, ..Candidate::new(Color::White, 21, detail(None)) },
            Candidate { game: 0, ..Candidate::new(Color::White, 21, detail(Some(5))) },
        ];
        let findings = detector.select(&acc, &games);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].replay.all_moves.len(), 31);
        assert_eq!(findings[0].value("moves_to_mate"), Some(&serde_json::Value::from(5)));
        assert_eq!(findings[1].value("moves_to_mate"), None);
        assert_eq!(findings[0].replay.key_position_index, 20);
    }
}
