//! Chess motif detection over batches of finished games.
//!
//! Each game is replayed once with shakmaty; every registered detector sees
//! the same move stream and hands back cheap candidates. After the batch,
//! each detector selects its findings and the scorer picks the best game.
//! The main entry point is [`analyze_batch`].

pub mod board;
pub mod candidate;
pub mod config;
pub mod detector;
pub mod detectors;
pub mod engine;
pub mod error;
pub mod finding;
pub mod registry;
pub mod scorer;

use chess_core::GameRecord;

pub use config::ScoringTables;
pub use engine::{BatchReport, BatchStats, CancellationFlag, Engine};
pub use error::MotifError;
pub use finding::Finding;

/// Run every detector over `games` for `username` and select the findings.
pub fn analyze_batch(
    username: &str,
    games: &[GameRecord],
    tables: &ScoringTables,
    average_rating: Option<f64>,
) -> BatchReport {
    let mut engine = Engine::new(username, tables, average_rating);
    engine.process(games);
    engine.finish(games)
}

/// Mean of the user's rating across the games that carry one.
pub fn average_rating(username: &str, games: &[GameRecord]) -> Option<f64> {
    let ratings: Vec<i32> = games
        .iter()
        .filter_map(|game| game.rating(game.user_color(username)?))
        .collect();
    if ratings.is_empty() {
        return None;
    }
    Some(ratings.iter().map(|&r| f64::from(r)).sum::<f64>() / ratings.len() as f64)
}
