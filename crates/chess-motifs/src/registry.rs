//! Static detector table.
//!
//! Every detector the engine runs is listed here with its gates and the key
//! the best-game scorer sums it under. Detectors without a key still run and
//! report findings; they just do not add to the game score.

use crate::config::ScoringTables;
use crate::detector::{Detector, Gate};
use crate::detectors::{
    back_rank_mate::BackRankMateDetector, biggest_comeback::BiggestComebackDetector,
    capture_sequence::CaptureSequenceDetector, castle_mate::CastleMateDetector,
    clutch_win::ClutchWinDetector, en_passant_mate::EnPassantMateDetector,
    hung_queen::HungQueenDetector, king_mate::KingMateDetector, king_walk::KingWalkDetector,
    knight_bishop_mate::KnightBishopMateDetector, knight_fork::KnightForkDetector,
    knight_promotion_mate::KnightPromotionMateDetector, longest_game::LongestGameDetector,
    pawn_mate::PawnMateDetector, promotion_mate::PromotionMateDetector,
    quickest_mate::QuickestMateDetector, sacrifice::SacrificeDetector,
    smothered_mate::SmotheredMateDetector, stalemate::StalemateDetector,
    windmill::WindmillDetector,
};

pub struct DetectorEntry {
    pub name: &'static str,
    pub display_name: &'static str,
    /// All gates must admit a game before its moves reach the detector.
    pub gates: &'static [Gate],
    pub config_key: Option<&'static str>,
    pub build: fn(&ScoringTables) -> Box<dyn Detector>,
}

impl DetectorEntry {
    pub fn admits(&self, facts: &crate::detector::GameFacts) -> bool {
        self.gates.iter().all(|gate| gate.admits(facts))
    }
}

const MATE: &[Gate] = &[Gate::Mate];
const WIN: &[Gate] = &[Gate::Win];
const MATING_WIN: &[Gate] = &[Gate::Mate, Gate::Win];
const DRAW: &[Gate] = &[Gate::Draw];
const LOSS: &[Gate] = &[Gate::Loss];

pub static REGISTRY: &[DetectorEntry] = &[
    DetectorEntry {
        name: "queen_sacrifice",
        display_name: "Queen Sacrifice",
        gates: WIN,
        config_key: Some("queen_sacrifice"),
        build: |_| Box::new(SacrificeDetector::queen()),
    },
    DetectorEntry {
        name: "knight_fork",
        display_name: "Knight Fork",
        gates: WIN,
        config_key: Some("knight_fork"),
        build: |_| Box::new(KnightForkDetector::new()),
    },
    DetectorEntry {
        name: "rook_sacrifice",
        display_name: "Rook Sacrifice",
        gates: WIN,
        config_key: Some("rook_sacrifice"),
        build: |_| Box::new(SacrificeDetector::rook()),
    },
    DetectorEntry {
        name: "back_rank_mate",
        display_name: "Back Rank Mate",
        gates: MATE,
        config_key: None,
        build: |_| Box::new(BackRankMateDetector::new()),
    },
    DetectorEntry {
        name: "smothered_mate",
        display_name: "Smothered Mate",
        gates: MATE,
        config_key: Some("smothered_mate"),
        build: |_| Box::new(SmotheredMateDetector::new()),
    },
    DetectorEntry {
        name: "king_mate",
        display_name: "King Mate",
        gates: MATE,
        config_key: Some("king_mate"),
        build: |_| Box::new(KingMateDetector::new()),
    },
    DetectorEntry {
        name: "castle_mate",
        display_name: "Castle Mate",
        gates: MATE,
        config_key: Some("castle_mate"),
        build: |_| Box::new(CastleMateDetector::new()),
    },
    DetectorEntry {
        name: "pawn_mate",
        display_name: "Pawn Mate",
        gates: MATE,
        config_key: Some("pawn_mate"),
        build: |_| Box::new(PawnMateDetector::new()),
    },
    DetectorEntry {
        name: "knight_promotion_mate",
        display_name: "Knight Promotion Mate",
        gates: MATE,
        config_key: Some("knight_promotion_mate"),
        build: |_| Box::new(KnightPromotionMateDetector::new()),
    },
    DetectorEntry {
        name: "promotion_mate",
        display_name: "Promotion Mate",
        gates: MATE,
        config_key: Some("promotion_mate"),
        build: |_| Box::new(PromotionMateDetector::new()),
    },
    DetectorEntry {
        name: "quickest_mate",
        display_name: "Quickest Mate",
        gates: MATING_WIN,
        config_key: None,
        build: |_| Box::new(QuickestMateDetector::new()),
    },
    DetectorEntry {
        name: "en_passant_mate",
        display_name: "En Passant Mate",
        gates: MATE,
        config_key: Some("en_passant_mate"),
        build: |_| Box::new(EnPassantMateDetector::new()),
    },
    DetectorEntry {
        name: "knight_bishop_mate",
        display_name: "Knight Bishop Mate",
        gates: MATE,
        config_key: None,
        build: |_| Box::new(KnightBishopMateDetector::new()),
    },
    DetectorEntry {
        name: "king_walk",
        display_name: "King Walk",
        gates: MATING_WIN,
        config_key: Some("king_walk"),
        build: |tables| Box::new(KingWalkDetector::new(tables.king_walk.clone())),
    },
    DetectorEntry {
        name: "biggest_comeback",
        display_name: "Biggest Comeback",
        gates: WIN,
        config_key: Some("biggest_comeback"),
        build: |_| Box::new(BiggestComebackDetector::new()),
    },
    DetectorEntry {
        name: "clutch_win",
        display_name: "Clutch Win",
        gates: WIN,
        config_key: None,
        build: |_| Box::new(ClutchWinDetector::new()),
    },
    DetectorEntry {
        name: "longest_game",
        display_name: "Longest Game",
        gates: WIN,
        config_key: None,
        build: |_| Box::new(LongestGameDetector::new()),
    },
    DetectorEntry {
        name: "hung_queen",
        display_name: "Hung Queen",
        gates: LOSS,
        config_key: Some("hung_queen"),
        build: |_| Box::new(HungQueenDetector::new()),
    },
    DetectorEntry {
        name: "capture_sequence",
        display_name: "Capture Sequence",
        gates: &[],
        config_key: Some("capture_sequence"),
        build: |_| Box::new(CaptureSequenceDetector::new()),
    },
    DetectorEntry {
        name: "stalemate",
        display_name: "Stalemate",
        gates: DRAW,
        config_key: None,
        build: |_| Box::new(StalemateDetector::new()),
    },
    DetectorEntry {
        name: "windmill",
        display_name: "Windmill",
        gates: WIN,
        config_key: Some("windmill"),
        build: |_| Box::new(WindmillDetector::new()),
    },
];

pub fn entry(name: &str) -> Option<&'static DetectorEntry> {
    REGISTRY.iter().find(|entry| entry.name == name)
}
