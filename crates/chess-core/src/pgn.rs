//! PGN helpers: a lightweight regex-based reader and header lookup.
//!
//! Full notation parsing belongs to the upstream importer; this module only
//! reads what the analyzers need: tag pairs, the SAN mainline and `%clk`
//! annotations.

use std::sync::LazyLock;

use regex::Regex;

use crate::game_data::{GameMetadata, GameRecord, GameResult};

const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("valid header regex"));
static HEADER_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("valid header block regex"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}").expect("valid comment regex"));
static VARIATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("valid variation regex"));
static SAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|(?:O-O-O|O-O)[+#]?")
        .expect("valid SAN regex")
});
static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[%clk ([0-9:.]+)\]").expect("valid clock regex"));

/// Parse a single PGN game into a `GameRecord`.
///
/// Returns `None` for games without moves or games that start from a custom
/// position.
pub fn parse_pgn(pgn: &str) -> Option<GameRecord> {
    let mut white = "Unknown".to_string();
    let mut black = "Unknown".to_string();
    let mut result = GameResult::Unfinished;
    let mut date = None;
    let mut time_control = None;
    let mut eco = None;
    let mut event = None;
    let mut link = None;
    let mut setup = None;
    let mut fen = None;

    for cap in HEADER_RE.captures_iter(pgn) {
        let key = &cap[1];
        let value = cap[2].to_string();
        match key {
            "White" => white = value,
            "Black" => black = value,
            "Result" => result = GameResult::from_code(&value),
            "Date" => date = Some(value),
            "TimeControl" => time_control = Some(value),
            "ECO" => eco = Some(value),
            "Event" => event = Some(value),
            "Link" => link = Some(value),
            "SetUp" => setup = Some(value),
            "FEN" => fen = Some(value),
            _ => {}
        }
    }

    // Filter non-standard positions
    if setup.as_deref() == Some("1") {
        if let Some(ref f) = fen {
            if f != STANDARD_START_FEN {
                return None;
            }
        }
    }

    let moves = extract_moves(pgn);
    if moves.is_empty() {
        return None;
    }

    Some(GameRecord {
        metadata: GameMetadata {
            white,
            black,
            result,
            date,
            time_control,
            eco,
            event,
            link,
        },
        moves,
        pgn: pgn.to_string(),
    })
}

/// Split a multi-game PGN file into single-game chunks.
///
/// A new game starts at every tag section that follows movetext.
pub fn split_games(text: &str) -> Vec<String> {
    let mut games = Vec::new();
    let mut current = String::new();
    let mut in_movetext = false;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') && in_movetext {
            games.push(std::mem::take(&mut current));
            in_movetext = false;
        }
        if !trimmed.is_empty() && !trimmed.starts_with('[') {
            in_movetext = true;
        }
        current.push_str(line);
        current.push('\n');
    }

    if !current.trim().is_empty() {
        games.push(current);
    }
    games
}

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
fn extract_moves(pgn: &str) -> Vec<String> {
    let no_headers = HEADER_BLOCK_RE.replace_all(pgn, "");
    let no_comments = COMMENT_RE.replace_all(&no_headers, "");
    let no_variations = VARIATION_RE.replace_all(&no_comments, "");

    SAN_RE
        .find_iter(&no_variations)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Extract a string value from a PGN header (e.g. Termination, CurrentPosition).
pub fn extract_header(pgn: &str, header_name: &str) -> Option<String> {
    let cap = HEADER_RE
        .captures_iter(pgn)
        .find(|cap| &cap[1] == header_name)?;
    let value = &cap[2];
    if value.is_empty() { None } else { Some(value.to_string()) }
}

/// Extract an integer value from a PGN header.
pub fn extract_header_int(pgn: &str, header_name: &str) -> Option<i32> {
    extract_header(pgn, header_name)?.parse().ok()
}

/// Every `[%clk ...]` annotation in movetext order, in seconds.
///
/// Annotations that fail to parse are kept as `None` so that the
/// white/black alternation of the remaining entries is preserved.
pub fn clock_annotations(pgn: &str) -> Vec<Option<f64>> {
    CLOCK_RE
        .captures_iter(pgn)
        .map(|cap| parse_clock(&cap[1]))
        .collect()
}

/// Parse `H:MM:SS(.s)` or `M:SS(.s)` into seconds.
pub fn parse_clock(text: &str) -> Option<f64> {
    let parts: Vec<&str> = text.split(':').collect();
    match parts.as_slice() {
        [h, m, s] => {
            let h: f64 = h.parse().ok()?;
            let m: f64 = m.parse().ok()?;
            let s: f64 = s.parse().ok()?;
            Some(h * 3600.0 + m * 60.0 + s)
        }
        [m, s] => {
            let m: f64 = m.parse().ok()?;
            let s: f64 = s.parse().ok()?;
            Some(m * 60.0 + s)
        }
        _ => None,
    }
}
