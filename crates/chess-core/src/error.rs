//! Core error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessCoreError {
    #[error("Unparsable move at ply {ply}: {san}")]
    InvalidSan { ply: usize, san: String },

    #[error("Illegal move at ply {ply}: {san}")]
    IllegalMove { ply: usize, san: String },

    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("Malformed time control: {0}")]
    MalformedTimeControl(String),
}
