//! Motif scanner
//!
//! Runs every detector over a batch of games and prints the JSON report.
//!
//! Usage: motif-scan --user NAME --games FILE [--config-dir DIR] [--workers N]
//!
//! FILE is a JSON array of game records or a PGN file with one or more games.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use chess_core::pgn::{parse_pgn, split_games};
use chess_core::GameRecord;
use chess_motifs::{average_rating, CancellationFlag, Engine, ScoringTables};
use tracing::{debug, info, warn};

struct Args {
    user: String,
    games: PathBuf,
    config_dir: Option<PathBuf>,
    workers: usize,
}

/// Value following `flag`, if present.
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_args() -> anyhow::Result<Args> {
    let args: Vec<String> = std::env::args().collect();
    let Some(user) = flag_value(&args, "--user") else {
        bail!("usage: motif-scan --user NAME --games FILE [--config-dir DIR] [--workers N]");
    };
    let Some(games) = flag_value(&args, "--games") else {
        bail!("missing --games FILE");
    };
    let workers = match flag_value(&args, "--workers") {
        Some(n) => n.parse().context("--workers must be a positive number")?,
        None => num_cpus::get(),
    };

    Ok(Args {
        user,
        games: PathBuf::from(games),
        config_dir: flag_value(&args, "--config-dir").map(PathBuf::from),
        workers: workers.max(1),
    })
}

/// Report how loading `.env` went. Returns the file that was loaded.
fn log_dotenv(result: Result<PathBuf, dotenvy::Error>) -> Option<PathBuf> {
    match result {
        Ok(path) => {
            debug!(path = %path.display(), "Loaded .env file");
            Some(path)
        }
        Err(e) if e.not_found() => {
            debug!("No .env file found");
            None
        }
        Err(e) => {
            warn!(error = %e, "Failed to load .env file");
            None
        }
    }
}

fn load_games(path: &Path) -> anyhow::Result<Vec<GameRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "json") {
        return serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse game records from {}", path.display()));
    }

    let chunks = split_games(&text);
    let total = chunks.len();
    let games: Vec<GameRecord> = chunks.iter().filter_map(|pgn| parse_pgn(pgn)).collect();
    if games.len() < total {
        warn!(skipped = total - games.len(), "Dropped PGN games without a standard mainline");
    }
    Ok(games)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    log_dotenv(dotenvy::dotenv());

    let args = parse_args()?;
    let tables = match &args.config_dir {
        Some(dir) => ScoringTables::load_dir(dir)?,
        None => ScoringTables::from_env()?,
    };

    let games = Arc::new(load_games(&args.games)?);
    let rating = average_rating(&args.user, &games);
    info!(
        games = games.len(),
        workers = args.workers,
        average_rating = ?rating,
        "Starting motif scan"
    );

    let cancel = CancellationFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Received Ctrl-C, stopping after the current games");
                cancel.cancel();
            }
        });
    }

    // One engine per contiguous shard, merged back in order.
    let shard_size = games.len().div_ceil(args.workers).max(1);
    let mut handles = Vec::new();
    for start in (0..games.len()).step_by(shard_size) {
        let end = (start + shard_size).min(games.len());
        let games = games.clone();
        let mut engine =
            Engine::new(&args.user, &tables, rating).with_cancellation(cancel.clone());
        handles.push(tokio::task::spawn_blocking(move || {
            engine.process_from(start, &games[start..end]);
            engine
        }));
    }

    let mut merged = Engine::new(&args.user, &tables, rating);
    for handle in handles {
        let engine = handle.await.context("Shard worker panicked")?;
        merged.merge(engine);
    }

    let report = merged.finish(&games);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_file_is_not_fatal() {
        let missing = std::env::temp_dir().join("motif-scan-missing.env");
        assert_eq!(log_dotenv(dotenvy::from_path(&missing).map(|()| missing.clone())), None);
    }

    #[test]
    fn test_env_file_loaded() {
        let path = std::env::temp_dir().join(format!("motif-scan-{}.env", std::process::id()));
        std::fs::write(&path, "MOTIF_SCAN_ENV_FILE_LOADED=1\n").unwrap();
        let loaded = log_dotenv(dotenvy::from_path(&path).map(|()| path.clone()));
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, Some(path));
        assert_eq!(std::env::var("MOTIF_SCAN_ENV_FILE_LOADED").as_deref(), Ok("1"));
    }
}
