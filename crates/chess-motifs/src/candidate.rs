//! Cheap per-event records kept across a batch.
//!
//! A candidate never carries a board, a FEN or a rating. Those are rebuilt
//! from the game record by [`crate::finding::hydrate`] for the few candidates
//! that are actually selected.

use shakmaty::{CastlingSide, Color, Role, Square};

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Index of the game in the batch. Stamped by the engine.
    pub game: usize,
    pub user_color: Color,
    /// 1-indexed ply the event is anchored to.
    pub ply: usize,
    pub detail: Detail,
}

impl Candidate {
    /// A candidate for the game currently being finished; the engine fills in
    /// the batch index.
    pub fn new(user_color: Color, ply: usize, detail: Detail) -> Self {
        Self {
            game: 0,
            user_color,
            ply,
            detail,
        }
    }
}

/// Per-detector payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Detail {
    MateMove {
        mate_move: String,
    },
    BackRank {
        mate_move: String,
        rook_mate: bool,
        enemy_material: i32,
    },
    Castle {
        mate_move: String,
        side: CastlingSide,
    },
    Promotion {
        mate_move: String,
        promoted_to: Role,
        capture: bool,
    },
    Sacrifice {
        role: Role,
        sacrifice_move: String,
        moves_to_mate: Option<u32>,
        material_advantage: i32,
    },
    HungQueen {
        move_number: usize,
        resigned_after: bool,
        capture_move: String,
    },
    Windmill {
        captures: usize,
        checks: usize,
    },
    KnightFork {
        royal: bool,
        knight_square: Square,
        forked: Vec<String>,
        value: i32,
    },
    Length {
        plies: usize,
    },
    Comeback {
        deficit: i32,
    },
    Clutch {
        seconds: f64,
    },
    Stalemate {
        total_material: i32,
    },
    KingWalk {
        king_square: Square,
        score: f64,
    },
    CaptureRun {
        start_ply: usize,
        length: usize,
        moves: Vec<String>,
    },
}

pub fn color_name(color: Color) -> &'static str {
    color.fold_wb("white", "black")
}

pub fn castling_label(side: CastlingSide) -> &'static str {
    match side {
        CastlingSide::KingSide => "short",
        CastlingSide::QueenSide => "long",
    }
}

pub fn role_name(role: Role) -> &'static str {
    match role {
        Role::Pawn => "pawn",
        Role::Knight => "knight",
        Role::Bishop => "bishop",
        Role::Rook => "rook",
        Role::Queen => "queen",
        Role::King => "king",
    }
}
