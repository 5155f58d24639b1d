//! Single-pass dispatch engine.
//!
//! Each game is replayed once. Every detector is started and finished for
//! every game the user played; only the detectors whose gates admit the game
//! see its moves. Candidates are folded into engine-owned accumulators and
//! the scorer runs once all detectors have finished the game.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chess_core::position::{decode_moves, final_position};
use chess_core::GameRecord;
use serde::Serialize;
use shakmaty::{Chess, Color, Position};
use tracing::{debug, info, warn};

use crate::candidate::Candidate;
use crate::config::{ScoringConfig, ScoringTables};
use crate::detector::{Contribution, Detector, GameFacts, MoveContext};
use crate::finding::Finding;
use crate::registry::{DetectorEntry, REGISTRY};
use crate::scorer::Scorer;

/// Games with less base time than this are not analyzed.
const HYPER_BULLET_SECONDS: f64 = 60.0;

/// Shared stop signal, checked between games.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub games_seen: usize,
    pub analyzed: usize,
    pub skipped_not_user: usize,
    pub skipped_hyper_bullet: usize,
    pub skipped_malformed: usize,
}

impl BatchStats {
    fn absorb(&mut self, other: BatchStats) {
        self.games_seen += other.games_seen;
        self.analyzed += other.analyzed;
        self.skipped_not_user += other.skipped_not_user;
        self.skipped_hyper_bullet += other.skipped_hyper_bullet;
        self.skipped_malformed += other.skipped_malformed;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    /// Findings per detector; detectors with nothing to report are absent.
    pub findings: BTreeMap<&'static str, Vec<Finding>>,
    pub best_game: Option<Finding>,
    pub stats: BatchStats,
    pub cancelled: bool,
}

struct Slot {
    entry: &'static DetectorEntry,
    detector: Box<dyn Detector>,
    acc: Vec<Candidate>,
    active: bool,
}

pub struct Engine {
    username: String,
    slots: Vec<Slot>,
    config: ScoringConfig,
    fallback: Option<ScoringConfig>,
    scorer: Scorer,
    stats: BatchStats,
    cancel: CancellationFlag,
    cancelled: bool,
}

fn is_hyper_bullet(game: &GameRecord) -> bool {
    game.metadata
        .base_seconds()
        .is_some_and(|base| base < HYPER_BULLET_SECONDS)
}

impl Engine {
    /// Build every registered detector. `average_rating` picks the scoring
    /// table and decides whether the fallback table may apply.
    pub fn new(username: &str, tables: &ScoringTables, average_rating: Option<f64>) -> Self {
        let slots = REGISTRY
            .iter()
            .map(|entry| Slot {
                entry,
                detector: (entry.build)(tables),
                acc: Vec::new(),
                active: false,
            })
            .collect();

        Self {
            username: username.to_string(),
            slots,
            config: tables.for_rating(average_rating).clone(),
            fallback: tables.fallback_for(average_rating).cloned(),
            scorer: Scorer::new(),
            stats: BatchStats::default(),
            cancel: CancellationFlag::new(),
            cancelled: false,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    pub fn process(&mut self, games: &[GameRecord]) {
        self.process_from(0, games);
    }

    /// Process `games`, numbering them from `offset` in the whole batch.
    pub fn process_from(&mut self, offset: usize, games: &[GameRecord]) {
        for (i, game) in games.iter().enumerate() {
            if self.cancel.is_cancelled() {
                self.cancelled = true;
                info!(processed = i, remaining = games.len() - i, "Analysis cancelled");
                break;
            }
            self.process_game(offset + i, game);
        }
    }

    fn process_game(&mut self, index: usize, game: &GameRecord) {
        self.stats.games_seen += 1;

        let Some(user_color) = game.user_color(&self.username) else {
            self.stats.skipped_not_user += 1;
            return;
        };
        if is_hyper_bullet(game) {
            self.stats.skipped_hyper_bullet += 1;
            debug!(game = index, time_control = ?game.metadata.time_control, "Skipping hyper-bullet game");
            return;
        }

        let facts = GameFacts::of(game, user_color);
        for slot in &mut self.slots {
            slot.detector.start_game(game, user_color);
            slot.active = slot.entry.admits(&facts);
        }

        let moves = match decode_moves(&game.moves) {
            Ok(moves) => moves,
            Err(e) => {
                warn!(game = index, link = ?game.metadata.link, error = %e, "Skipping game with unreadable moves");
                for slot in &mut self.slots {
                    slot.detector.finish_game(game, None);
                }
                self.stats.skipped_malformed += 1;
                return;
            }
        };

        let replayed = self.replay(game, &moves, user_color);
        let end = final_position(game, Some(&replayed));

        let mut found = 0;
        for slot in &mut self.slots {
            let candidates = slot.detector.finish_game(game, end.as_ref());
            if !slot.active {
                continue;
            }
            for mut candidate in candidates {
                candidate.game = index;
                found += 1;
                slot.detector.retain(&mut slot.acc, candidate);
            }
        }

        let contributions: Vec<Contribution> = self
            .slots
            .iter()
            .map(|slot| Contribution {
                key: slot.entry.config_key,
                points: match slot.entry.config_key {
                    Some(_) => slot.detector.score_for_game(&self.config),
                    None => 0,
                },
                signals: slot.detector.signals(),
            })
            .collect();
        self.scorer
            .score_game(index, game, user_color, &self.config, &contributions);

        self.stats.analyzed += 1;
        debug!(game = index, plies = moves.len(), candidates = found, "Game analyzed");
    }

    /// Feed every move to the active detectors and return the final board.
    fn replay(&mut self, game: &GameRecord, moves: &[shakmaty::Move], user_color: Color) -> Chess {
        let mut pos = Chess::default();
        for (i, mv) in moves.iter().enumerate() {
            let ctx = MoveContext {
                mv,
                ply: i + 1,
                board: &pos,
                san: &game.moves[i],
                is_user_move: pos.turn() == user_color,
                user_color,
                game,
            };
            for slot in self.slots.iter_mut().filter(|slot| slot.active) {
                slot.detector.process_move(&ctx);
            }
            pos.play_unchecked(mv.clone());
        }
        pos
    }

    /// Fold in an engine that processed the games after this one's.
    pub fn merge(&mut self, other: Engine) {
        for (slot, theirs) in self.slots.iter_mut().zip(other.slots) {
            for candidate in theirs.acc {
                slot.detector.retain(&mut slot.acc, candidate);
            }
        }
        self.scorer.merge(other.scorer);
        self.stats.absorb(other.stats);
        self.cancelled |= other.cancelled;
    }

    /// Select findings for the whole batch. `games` is the full batch the
    /// candidate indices refer to. Does not change the engine.
    pub fn finish(&self, games: &[GameRecord]) -> BatchReport {
        let mut findings = BTreeMap::new();
        for slot in &self.slots {
            let selected = slot.detector.select(&slot.acc, games);
            if !selected.is_empty() {
                findings.insert(slot.entry.name, selected);
            }
        }

        let best_game = match &self.fallback {
            Some(fallback) if !self.scorer.sacrifice_found() => {
                info!("No sacrifices in batch, rescoring with fallback table");
                self.scorer.rescored(fallback).select(games)
            }
            _ => self.scorer.select(games),
        };

        info!(
            games = self.stats.games_seen,
            analyzed = self.stats.analyzed,
            not_user = self.stats.skipped_not_user,
            hyper_bullet = self.stats.skipped_hyper_bullet,
            malformed = self.stats.skipped_malformed,
            motifs = findings.len(),
            cancelled = self.cancelled,
            "Batch analysis complete"
        );

        BatchReport {
            findings,
            best_game,
            stats: self.stats,
            cancelled: self.cancelled,
        }
    }
}
