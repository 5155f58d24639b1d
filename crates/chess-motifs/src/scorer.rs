//! Best-game scoring.
//!
//! After every detector has finished a game, the scorer sums their typed
//! contributions with the game-level bonuses and penalties and keeps every
//! game's breakdown so the batch can be rescored with the fallback table
//! without replaying anything.

use std::collections::BTreeMap;

use chess_core::game_data::full_moves;
use chess_core::GameRecord;
use serde_json::{Map, Value};
use shakmaty::Color;

use crate::config::ScoringConfig;
use crate::detector::Contribution;
use crate::finding::{hydrate, Finding, Hydration};

/// Score of one analyzed game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameScore {
    pub game: usize,
    pub user_color: Color,
    pub total_points: i32,
    pub breakdown: BTreeMap<&'static str, i32>,
}

impl GameScore {
    fn add(&mut self, key: &'static str, points: i32) {
        self.total_points += points;
        self.breakdown.insert(key, points);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scorer {
    scores: Vec<GameScore>,
    best: Option<usize>,
    sacrifice_found: bool,
}

/// Config key of the piece that delivered mate, read from the first letter
/// of the mating move. Pawns, kings and castling have their own detectors.
fn mating_piece(san: &str) -> Option<&'static str> {
    match san.chars().next()? {
        'N' => Some("knight"),
        'B' => Some("bishop"),
        'R' => Some("rook"),
        'Q' => Some("queen"),
        _ => None,
    }
}

impl Scorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score the game just finished. Only wins are scored.
    pub fn score_game(
        &mut self,
        index: usize,
        game: &GameRecord,
        user_color: Color,
        config: &ScoringConfig,
        contributions: &[Contribution],
    ) {
        let sacrifice_found = contributions.iter().any(|c| c.signals.sacrifice_found);
        self.sacrifice_found |= sacrifice_found;
        if !game.won_by(user_color) {
            return;
        }

        let mut score = GameScore {
            game: index,
            user_color,
            total_points: 0,
            breakdown: BTreeMap::new(),
        };

        for contribution in contributions {
            if let Some(key) = contribution.key {
                if contribution.points != 0 {
                    score.add(key, contribution.points);
                }
            }
        }

        let mated = game.ends_in_checkmate();
        if mated {
            if let Some(bonus) = config.checkmate_win.filter(|&b| b != 0) {
                score.add("checkmate_win", bonus);
            }
        }

        if let Some(table) = &config.game_ends_before_moves {
            if let Some(bonus) = table.first_below(full_moves(game.ply_count()) as i32) {
                score.add("game_speed", bonus);
            }
        }

        let bullet = &config.bullet_penalty;
        if bullet.enabled
            && game
                .metadata
                .base_seconds()
                .is_some_and(|base| base <= bullet.max_base_time_seconds)
        {
            score.add("bullet_penalty", bullet.points);
        }

        if let (true, Some(bonus)) = (mated, &config.mating_piece_bonus) {
            let points = match game.last_move().and_then(mating_piece) {
                Some("knight") => bonus.knight,
                Some("bishop") => bonus.bishop,
                Some("rook") => bonus.rook,
                Some("queen") => bonus.queen,
                _ => 0,
            };
            if points != 0 {
                score.add("mating_piece_bonus", points);
            }
        }

        let deficit = contributions
            .iter()
            .map(|c| c.signals.material_deficit)
            .max()
            .unwrap_or(0);
        if deficit > 0 {
            if sacrifice_found {
                let bonus = config
                    .sacrifice_comeback_bonus
                    .as_ref()
                    .and_then(|table| table.highest_reached(deficit))
                    .unwrap_or(0);
                if bonus > 0 {
                    score.add("sacrifice_comeback", bonus);
                }
            } else if let Some(penalty) = &config.material_deficit_penalty {
                if deficit >= penalty.threshold && penalty.points != 0 {
                    score.add("material_deficit_penalty", penalty.points);
                }
            }
        }

        self.push(score);
    }

    fn push(&mut self, score: GameScore) {
        let better = match self.best {
            Some(best) => score.total_points > self.scores[best].total_points,
            None => true,
        };
        self.scores.push(score);
        if better {
            self.best = Some(self.scores.len() - 1);
        }
    }

    /// Append the scores of a later shard.
    pub fn merge(&mut self, other: Scorer) {
        self.sacrifice_found |= other.sacrifice_found;
        for score in other.scores {
            self.push(score);
        }
    }

    pub fn sacrifice_found(&self) -> bool {
        self.sacrifice_found
    }

    pub fn best(&self) -> Option<&GameScore> {
        self.best.map(|i| &self.scores[i])
    }

    pub fn scores(&self) -> &[GameScore] {
        &self.scores
    }

    /// Rescore every stored breakdown with the fallback table's flat values.
    /// A zero stays zero and a penalty stays negative; table-valued and
    /// unknown keys keep their points.
    pub fn rescored(&self, fallback: &ScoringConfig) -> Scorer {
        let mut rescored = Scorer {
            sacrifice_found: self.sacrifice_found,
            ..Scorer::default()
        };
        for score in &self.scores {
            let mut next = GameScore {
                breakdown: BTreeMap::new(),
                total_points: 0,
                ..score.clone()
            };
            for (&key, &original) in &score.breakdown {
                let points = match fallback.flat_points(key) {
                    Some(_) if original == 0 => 0,
                    Some(value) if original < 0 => -value.abs(),
                    Some(value) => value,
                    None => original,
                };
                next.add(key, points);
            }
            rescored.push(next);
        }
        rescored
    }

    /// The best game as a finding, keyed one ply in.
    pub fn select(&self, games: &[GameRecord]) -> Option<Finding> {
        let best = self.best()?;
        let game = games.get(best.game)?;

        let breakdown: Map<String, Value> = best
            .breakdown
            .iter()
            .map(|(key, points)| (key.to_string(), Value::from(*points)))
            .collect();
        let finding = hydrate(
            game,
            Hydration {
                motif: "best_game",
                display_name: "Best Game",
                user_color: best.user_color,
                key_ply: game.ply_count().min(1) as i64,
                link_move: Some(1),
            },
        )
        .with_value("total_points", "Total Points", best.total_points)
        .with_value("breakdown", "Score Breakdown", Value::Object(breakdown));
        Some(finding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BulletPenalty, DeficitPenalty, MatingPieceBonus, PointValue, Threshold, ThresholdTable};
    use crate::detector::Signals;
    use crate::detectors::test_support::{plies_ending, record};

    fn contribution(key: &'static str, points: i32) -> Contribution {
        Contribution {
            key: Some(key),
            points,
            signals: Signals::default(),
        }
    }

    fn mate_in(plies: usize, last: &str) -> GameRecord {
        record("1-0", &plies_ending(plies - 1, last), "")
    }

    #[test]
    fn test_only_wins_scored() {
        let mut scorer = Scorer::new();
        let loss = record("0-1", &plies_ending(20, "Nf3"), "");
        scorer.score_game(0, &loss, Color::White, &ScoringConfig::default(), &[contribution("hung_queen", -5)]);
        assert!(scorer.best().is_none());
        assert!(scorer.scores().is_empty());
    }

    #[test]
    fn test_game_level_bonuses() {
        let config = ScoringConfig {
            checkmate_win: Some(10),
            game_ends_before_moves: Some(ThresholdTable {
                thresholds: vec![
                    Threshold { boundary: 30, points: 5 },
                    Threshold { boundary: 20, points: 15 },
                ],
            }),
            bullet_penalty: BulletPenalty {
                enabled: true,
                ..BulletPenalty::default()
            },
            mating_piece_bonus: Some(MatingPieceBonus {
                knight: 7,
                ..MatingPieceBonus::default()
            }),
            ..ScoringConfig::default()
        };
        let mut scorer = Scorer::new();
        // 25 plies is 13 full moves.
        let game = mate_in(25, "Nf7#");
        scorer.score_game(0, &game, Color::White, &config, &[contribution("smothered_mate", 50), contribution("windmill", 0)]);

        let best = scorer.best().unwrap();
        assert_eq!(best.breakdown.get("smothered_mate"), Some(&50));
        assert_eq!(best.breakdown.get("windmill"), None);
        assert_eq!(best.breakdown.get("checkmate_win"), Some(&10));
        assert_eq!(best.breakdown.get("game_speed"), Some(&15));
        assert_eq!(best.breakdown.get("mating_piece_bonus"), Some(&7));
        // 600 seconds of base time is not bullet.
        assert_eq!(best.breakdown.get("bullet_penalty"), None);
        assert_eq!(best.total_points, 82);
    }

    #[test]
    fn test_sacrifice_and_deficit_rules() {
        let config = ScoringConfig {
            sacrifice_comeback_bonus: Some(ThresholdTable {
                thresholds: vec![
                    Threshold { boundary: 3, points: 10 },
                    Threshold { boundary: 6, points: 25 },
                ],
            }),
            material_deficit_penalty: Some(DeficitPenalty { threshold: 3, points: -15 }),
            ..ScoringConfig::default()
        };
        let sacrifice = Contribution {
            key: Some("queen_sacrifice"),
            points: 30,
            signals: Signals {
                sacrifice_found: true,
                material_deficit: 0,
            },
        };
        let deficit = |d| Contribution {
            key: Some("biggest_comeback"),
            points: 0,
            signals: Signals {
                sacrifice_found: false,
                material_deficit: d,
            },
        };

        let mut scorer = Scorer::new();
        let game = mate_in(40, "Qg7#");
        scorer.score_game(0, &game, Color::White, &config, &[sacrifice, deficit(7)]);
        scorer.score_game(1, &game, Color::White, &config, &[deficit(4)]);

        assert_eq!(scorer.scores()[0].total_points, 55);
        assert_eq!(scorer.scores()[0].breakdown.get("sacrifice_comeback"), Some(&25));
        assert_eq!(scorer.scores()[1].total_points, -15);
        assert_eq!(scorer.scores()[1].breakdown.get("material_deficit_penalty"), Some(&-15));
        assert!(scorer.sacrifice_found());
    }

    #[test]
    fn test_ties_keep_first_game() {
        let mut scorer = Scorer::new();
        let game = mate_in(30, "Kf2#");
        for index in 0..3 {
            scorer.score_game(index, &game, Color::White, &ScoringConfig::default(), &[contribution("king_mate", 40)]);
        }
        assert_eq!(scorer.best().unwrap().game, 0);
    }

    #[test]
    fn test_fallback_changes_flat_keys_only() {
        let mut scorer = Scorer::new();
        let game = mate_in(30, "Qg7#");
        let primary = ScoringConfig {
            game_ends_before_moves: Some(ThresholdTable {
                thresholds: vec![Threshold { boundary: 40, points: 12 }],
            }),
            ..ScoringConfig::default()
        };
        scorer.score_game(
            0,
            &game,
            Color::White,
            &primary,
            &[contribution("knight_fork", 41), contribution("king_mate", 40)],
        );
        scorer.score_game(1, &game, Color::White, &primary, &[contribution("windmill", 25), contribution("hung_queen", -5)]);
        assert_eq!(scorer.best().unwrap().game, 0);

        let mut fallback = ScoringConfig::default();
        fallback.detectors.insert("king_mate".to_string(), PointValue::Flat(5));
        fallback.detectors.insert("windmill".to_string(), PointValue::Flat(80));
        fallback.detectors.insert("hung_queen".to_string(), PointValue::Flat(10));

        let rescored = scorer.rescored(&fallback);
        let first = &rescored.scores()[0];
        // knight_fork is scaled in the fallback table, game_speed absent.
        assert_eq!(first.breakdown.get("knight_fork"), Some(&41));
        assert_eq!(first.breakdown.get("game_speed"), Some(&12));
        assert_eq!(first.breakdown.get("king_mate"), Some(&5));
        assert_eq!(first.total_points, 58);

        let second = &rescored.scores()[1];
        assert_eq!(second.breakdown.get("hung_queen"), Some(&-10));
        assert_eq!(second.total_points, 82);
        assert_eq!(rescored.best().unwrap().game, 1);

        // Rescoring reads the stored originals, so it is repeatable.
        assert_eq!(scorer.rescored(&fallback), rescored);
    }

    #[test]
    fn test_select_best_game() {
        let mut scorer = Scorer::new();
        let game = mate_in(30, "Kf2#");
        scorer.score_game(0, &game, Color::White, &ScoringConfig::default(), &[contribution("king_mate", 40)]);

        let finding = scorer.select(&[game]).unwrap();
        assert_eq!(finding.motif, "best_game");
        assert_eq!(finding.replay.key_position_index, 1);
        assert_eq!(finding.value("total_points"), Some(&Value::from(40)));
        assert_eq!(
            finding.value("breakdown"),
            Some(&serde_json::json!({"king_mate": 40}))
        );
        assert_eq!(finding.position_link.as_deref(), Some("https://example.org/game?move=1"));
    }
}
