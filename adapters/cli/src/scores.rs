use std::{fmt::Write as _, fs, io::ErrorKind, path::Path};

use anyhow::{Context, Result};
use temporal_bot_core::GameResult;
use temporal_bot_level::LevelPack;
use temporal_bot_system_scoring::{format_time, LevelGoals, ScoreBook};
use tracing::info;

/// Reads the score book, treating a missing file as an empty book.
pub(crate) fn load(path: &Path) -> Result<ScoreBook> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(ScoreBook::default()),
        Err(error) => {
            return Err(error).with_context(|| format!("failed to read scores {}", path.display()))
        }
    };
    toml::from_str(&contents).with_context(|| format!("invalid score file {}", path.display()))
}

/// Folds a result into the persisted book. Returns whether the record improved.
pub(crate) fn record(path: &Path, level: u32, result: &GameResult) -> Result<bool> {
    let mut book = load(path)?;
    if !book.record(level, result) {
        return Ok(false);
    }

    let contents = toml::to_string(&book).context("failed to serialize scores")?;
    fs::write(path, contents).with_context(|| format!("failed to write scores {}", path.display()))?;
    info!(level, path = %path.display(), "new best score saved");
    Ok(true)
}

/// Table of every level in the pack with its best score and goal status.
pub(crate) fn report(pack: &LevelPack, book: &ScoreBook) -> String {
    let mut out = String::new();
    for level in pack.levels() {
        let best = book.get(level.id());
        let goals = LevelGoals::new(level.target_time(), level.target_robots()).evaluate(&best);
        let (time, robots) = if best.completed() {
            (format_time(best.time()), best.robots().to_string())
        } else {
            ("-".to_owned(), "-".to_owned())
        };
        let _ = writeln!(
            out,
            "{:>3}  {:<20} {:>9} {:>3}   time goal {:<6} robot goal {}",
            level.id(),
            level.name(),
            time,
            robots,
            mark(goals.time_met),
            mark(goals.robots_met),
        );
    }
    out
}

fn mark(met: bool) -> &'static str {
    if met {
        "met"
    } else {
        "missed"
    }
}
