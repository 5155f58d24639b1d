//! Shared chess primitives for the motif analyzers.
//!
//! `game_data` holds the immutable per-game record, `pgn` the regex-based
//! header and movetext helpers, and `position` everything that needs a real
//! board: SAN replay, FEN round-trips and final-position lookup.

pub mod error;
pub mod game_data;
pub mod pgn;
pub mod position;

pub use error::ChessCoreError;
pub use game_data::{GameMetadata, GameRecord, GameResult};
