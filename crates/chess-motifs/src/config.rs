//! Scoring configuration documents.
//!
//! Every document is optional. A missing file falls back to the built-in
//! table; a present file replaces it wholesale. The directory comes from the
//! caller or from `MOTIF_CONFIG_DIR`.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::MotifError;

pub const PRIMARY_FILE: &str = "game_scoring_config.json";
pub const LOW_RATING_FILE: &str = "game_scoring_config_low_elo.json";
pub const FALLBACK_FILE: &str = "game_scoring_config_fallback.json";
pub const KING_WALK_FILE: &str = "king_walk_config.json";

const DEFAULT_ELO_THRESHOLD: f64 = 600.0;

/// One `{boundary, points}` row. Documents spell the boundary `moves` or `deficit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threshold {
    #[serde(alias = "moves", alias = "deficit")]
    pub boundary: i32,
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThresholdTable {
    pub thresholds: Vec<Threshold>,
}

impl ThresholdTable {
    /// Ascending scan: the first row whose boundary is strictly above `value`.
    pub fn first_below(&self, value: i32) -> Option<i32> {
        let mut rows = self.thresholds.clone();
        rows.sort_by_key(|t| t.boundary);
        rows.iter().find(|t| value < t.boundary).map(|t| t.points)
    }

    /// Descending scan: the highest row whose boundary `value` reaches.
    pub fn highest_reached(&self, value: i32) -> Option<i32> {
        let mut rows = self.thresholds.clone();
        rows.sort_by_key(|t| std::cmp::Reverse(t.boundary));
        rows.iter().find(|t| value >= t.boundary).map(|t| t.points)
    }
}

/// Value stored under a detector's config key. Variants are tried in order;
/// `Table` needs a `thresholds` field, so it must come before `Scaled`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointValue {
    Flat(i32),
    Table(ThresholdTable),
    Scaled {
        #[serde(default)]
        base_points: i32,
        #[serde(alias = "per_piece_value", alias = "per_capture", default)]
        per_unit: i32,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletPenalty {
    pub enabled: bool,
    pub max_base_time_seconds: f64,
    pub points: i32,
}

impl Default for BulletPenalty {
    fn default() -> Self {
        Self {
            enabled: false,
            max_base_time_seconds: 179.0,
            points: -20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatingPieceBonus {
    pub knight: i32,
    pub bishop: i32,
    pub rook: i32,
    pub queen: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeficitPenalty {
    pub threshold: i32,
    pub points: i32,
}

impl Default for DeficitPenalty {
    fn default() -> Self {
        Self {
            threshold: 3,
            points: 0,
        }
    }
}

/// Point-value table used by the best-game scorer and by each detector's
/// per-game contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub elo_threshold: f64,
    pub checkmate_win: Option<i32>,
    #[serde(alias = "checkmate_before_moves")]
    pub game_ends_before_moves: Option<ThresholdTable>,
    pub bullet_penalty: BulletPenalty,
    pub mating_piece_bonus: Option<MatingPieceBonus>,
    pub sacrifice_comeback_bonus: Option<ThresholdTable>,
    pub material_deficit_penalty: Option<DeficitPenalty>,
    #[serde(flatten)]
    pub detectors: BTreeMap<String, PointValue>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let detectors = [
            ("rook_sacrifice", PointValue::Flat(20)),
            ("queen_sacrifice", PointValue::Flat(30)),
            ("smothered_mate", PointValue::Flat(50)),
            ("castle_mate", PointValue::Flat(50)),
            ("king_mate", PointValue::Flat(40)),
            ("pawn_mate", PointValue::Flat(40)),
            ("windmill", PointValue::Flat(25)),
            (
                "knight_fork",
                PointValue::Scaled {
                    base_points: 15,
                    per_unit: 2,
                },
            ),
            (
                "capture_sequence",
                PointValue::Scaled {
                    base_points: 10,
                    per_unit: 2,
                },
            ),
            ("hung_queen", PointValue::Flat(-5)),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();

        Self {
            elo_threshold: DEFAULT_ELO_THRESHOLD,
            checkmate_win: None,
            game_ends_before_moves: None,
            bullet_penalty: BulletPenalty::default(),
            mating_piece_bonus: None,
            sacrifice_comeback_bonus: None,
            material_deficit_penalty: None,
            detectors,
        }
    }
}

impl ScoringConfig {
    /// Flat points under `key`, or `default` when the key is absent or not flat.
    pub fn points(&self, key: &str, default: i32) -> i32 {
        match self.detectors.get(key) {
            Some(PointValue::Flat(points)) => *points,
            _ => default,
        }
    }

    /// `(base_points, per_unit)` under `key`. A flat entry means no per-unit part.
    pub fn scaled(&self, key: &str, default_base: i32, default_unit: i32) -> (i32, i32) {
        match self.detectors.get(key) {
            Some(PointValue::Scaled {
                base_points,
                per_unit,
            }) => (*base_points, *per_unit),
            Some(PointValue::Flat(points)) => (*points, 0),
            _ => (default_base, default_unit),
        }
    }

    pub fn table(&self, key: &str) -> Option<&ThresholdTable> {
        match self.detectors.get(key) {
            Some(PointValue::Table(table)) => Some(table),
            _ => None,
        }
    }

    /// Plain numeric value a fallback document assigns to a breakdown key.
    /// Table-valued and absent keys return `None`.
    pub fn flat_points(&self, key: &str) -> Option<i32> {
        if key == "checkmate_win" {
            return self.checkmate_win;
        }
        match self.detectors.get(key) {
            Some(PointValue::Flat(points)) => Some(*points),
            _ => None,
        }
    }
}

/// Multiplier tables for the king-walk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KingWalkConfig {
    /// Effective rank ("1".."8") from the hunter's side to base value.
    pub square_values: BTreeMap<String, f64>,
    /// Inclusive full-move ranges ("20-30") to multiplier.
    pub move_multipliers: BTreeMap<String, f64>,
    pub hunt_multiplier_per_check: f64,
    pub max_moves: usize,
    pub material_minimum: f64,
    pub score_minimum: f64,
    pub material_multiplier_enabled: bool,
    pub material_multiplier_base: f64,
}

impl Default for KingWalkConfig {
    fn default() -> Self {
        let square_values = [
            ("1", 100.0),
            ("2", 95.0),
            ("3", 90.0),
            ("4", 80.0),
            ("5", 60.0),
            ("6", 0.0),
            ("7", 0.0),
            ("8", 0.0),
        ];
        let move_multipliers = [
            ("1-14", 0.5),
            ("15-19", 0.75),
            ("20-30", 1.0),
            ("31-35", 0.75),
        ];
        Self {
            square_values: square_values
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            move_multipliers: move_multipliers
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            hunt_multiplier_per_check: 0.1,
            max_moves: 35,
            material_minimum: 0.0,
            score_minimum: 0.0,
            material_multiplier_enabled: true,
            material_multiplier_base: 39.0,
        }
    }
}

impl KingWalkConfig {
    pub fn square_value(&self, effective_rank: u32) -> f64 {
        self.square_values
            .get(&effective_rank.to_string())
            .copied()
            .unwrap_or(0.0)
    }

    /// Multiplier for the range containing `full_moves`; 0.75 when none does.
    pub fn move_multiplier(&self, full_moves: usize) -> f64 {
        self.move_multipliers
            .iter()
            .find_map(|(range, mult)| {
                let (low, high) = range.split_once('-')?;
                let low: usize = low.trim().parse().ok()?;
                let high: usize = high.trim().parse().ok()?;
                (low..=high).contains(&full_moves).then_some(*mult)
            })
            .unwrap_or(0.75)
    }
}

/// Every configuration document the analyzers read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringTables {
    pub primary: ScoringConfig,
    pub low_rating: Option<ScoringConfig>,
    pub fallback: Option<ScoringConfig>,
    pub king_walk: KingWalkConfig,
}

impl ScoringTables {
    /// Load documents from `dir`; each missing file keeps its default.
    pub fn load_dir(dir: &Path) -> Result<Self, MotifError> {
        let primary = read_optional(&dir.join(PRIMARY_FILE))?.unwrap_or_default();
        let low_rating = read_optional(&dir.join(LOW_RATING_FILE))?;
        let fallback = read_optional(&dir.join(FALLBACK_FILE))?;
        let king_walk = read_optional(&dir.join(KING_WALK_FILE))?.unwrap_or_default();

        info!(
            dir = %dir.display(),
            low_rating = low_rating.is_some(),
            fallback = fallback.is_some(),
            "Scoring configuration loaded"
        );

        Ok(Self {
            primary,
            low_rating,
            fallback,
            king_walk,
        })
    }

    /// Load from `MOTIF_CONFIG_DIR`, or the built-in tables when it is unset.
    pub fn from_env() -> Result<Self, MotifError> {
        match env::var("MOTIF_CONFIG_DIR") {
            Ok(dir) if !dir.trim().is_empty() => Self::load_dir(&PathBuf::from(dir)),
            Ok(_) => Err(MotifError::Config("MOTIF_CONFIG_DIR is empty".to_string())),
            Err(_) => {
                info!("MOTIF_CONFIG_DIR not set, using built-in scoring tables");
                Ok(Self::default())
            }
        }
    }

    /// Table for a player with the given average rating. The low-rating
    /// table applies strictly below its own threshold.
    pub fn for_rating(&self, average_rating: Option<f64>) -> &ScoringConfig {
        match (&self.low_rating, average_rating) {
            (Some(low), Some(avg)) if avg < low.elo_threshold => low,
            _ => &self.primary,
        }
    }

    /// Fallback table, when it should be applied for this rating.
    pub fn fallback_for(&self, average_rating: Option<f64>) -> Option<&ScoringConfig> {
        let fallback = self.fallback.as_ref()?;
        match average_rating {
            Some(avg) if avg < fallback.elo_threshold => None,
            _ => Some(fallback),
        }
    }
}

fn read_optional<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, MotifError> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path).map_err(|source| MotifError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(serde_json::from_str(&text)?))
}
