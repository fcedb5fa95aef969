#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Best-score bookkeeping for completed levels.
//!
//! Scores improve field by field: a new result replaces the stored time when
//! it is faster and the stored robot count when it uses fewer robots, even if
//! the two bests come from different runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use temporal_bot_core::GameResult;

/// Best result recorded for a single level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BestScore {
    completed: bool,
    time_ms: u64,
    robots: u32,
}

impl BestScore {
    /// Time reported by a level that was never completed.
    pub const UNSET_TIME: Duration = Duration::from_millis(999_995);
    /// Robot count reported by a level that was never completed.
    pub const UNSET_ROBOTS: u32 = 99;

    /// Whether the level was completed at least once.
    #[must_use]
    pub const fn completed(&self) -> bool {
        self.completed
    }

    /// Best timeline time.
    #[must_use]
    pub const fn time(&self) -> Duration {
        Duration::from_millis(self.time_ms)
    }

    /// Fewest robots used.
    #[must_use]
    pub const fn robots(&self) -> u32 {
        self.robots
    }

    /// Folds a result into the record, keeping the better value of each field.
    ///
    /// Returns whether anything changed. Results that did not complete the
    /// level are ignored.
    pub fn reconcile(&mut self, result: &GameResult) -> bool {
        if !result.completed {
            return false;
        }

        let before = *self;
        let time_ms = duration_to_millis(result.timeline_time);
        self.completed = true;
        if time_ms < self.time_ms {
            self.time_ms = time_ms;
        }
        if result.robot_count < self.robots {
            self.robots = result.robot_count;
        }
        *self != before
    }
}

impl Default for BestScore {
    fn default() -> Self {
        Self {
            completed: false,
            time_ms: duration_to_millis(Self::UNSET_TIME),
            robots: Self::UNSET_ROBOTS,
        }
    }
}

/// Per-level thresholds a run is measured against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelGoals {
    target_time: Duration,
    target_robots: u32,
}

impl LevelGoals {
    /// Creates goals from a target time and robot count.
    #[must_use]
    pub const fn new(target_time: Duration, target_robots: u32) -> Self {
        Self {
            target_time,
            target_robots,
        }
    }

    /// Checks a score against both goals. Uncompleted scores meet neither.
    #[must_use]
    pub fn evaluate(&self, score: &BestScore) -> GoalStatus {
        GoalStatus {
            time_met: score.completed() && score.time() <= self.target_time,
            robots_met: score.completed() && score.robots() <= self.target_robots,
        }
    }
}

/// Outcome of comparing a score to level goals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GoalStatus {
    /// The best time is at or below the target time.
    pub time_met: bool,
    /// The best robot count is at or below the target count.
    pub robots_met: bool,
}

impl GoalStatus {
    /// Whether both goals are met.
    #[must_use]
    pub const fn all_met(&self) -> bool {
        self.time_met && self.robots_met
    }
}

/// Best scores of every level, keyed by level id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBook {
    #[serde(default, rename = "score")]
    entries: Vec<ScoreEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct ScoreEntry {
    level: u32,
    completed: bool,
    time_ms: u64,
    robots: u32,
}

impl ScoreEntry {
    const fn new(level: u32, best: BestScore) -> Self {
        Self {
            level,
            completed: best.completed,
            time_ms: best.time_ms,
            robots: best.robots,
        }
    }

    const fn best(&self) -> BestScore {
        BestScore {
            completed: self.completed,
            time_ms: self.time_ms,
            robots: self.robots,
        }
    }
}

impl ScoreBook {
    /// Best score of the level, or the unset record when it was never completed.
    #[must_use]
    pub fn get(&self, level: u32) -> BestScore {
        self.entries
            .iter()
            .find(|entry| entry.level == level)
            .map(ScoreEntry::best)
            .unwrap_or_default()
    }

    /// Reconciles a result into the level's record. Returns whether it improved.
    pub fn record(&mut self, level: u32, result: &GameResult) -> bool {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.level == level) {
            let mut best = entry.best();
            let improved = best.reconcile(result);
            *entry = ScoreEntry::new(level, best);
            return improved;
        }

        let mut best = BestScore::default();
        if !best.reconcile(result) {
            return false;
        }
        self.entries.push(ScoreEntry::new(level, best));
        self.entries.sort_by_key(|entry| entry.level);
        true
    }

    /// Recorded levels in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, BestScore)> + '_ {
        self.entries.iter().map(|entry| (entry.level, entry.best()))
    }
}

/// Formats a duration the way scores are displayed: `m:ss.mmm`, or `s.mmm`
/// below one minute.
#[must_use]
pub fn format_time(time: Duration) -> String {
    let total = duration_to_millis(time);
    let minutes = total / 60_000;
    let seconds = (total % 60_000) / 1_000;
    let millis = total % 1_000;

    if minutes > 0 {
        format!("{minutes}:{seconds:02}.{millis:03}")
    } else {
        format!("{seconds}.{millis:03}")
    }
}

fn duration_to_millis(time: Duration) -> u64 {
    u64::try_from(time.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(timeline_ms: u64, robots: u32) -> GameResult {
        GameResult {
            completed: true,
            elapsed_time: Duration::from_millis(timeline_ms),
            timeline_time: Duration::from_millis(timeline_ms),
            robot_count: robots,
        }
    }

    #[test]
    fn default_score_is_the_unset_sentinel() {
        let score = BestScore::default();
        assert!(!score.completed());
        assert_eq!(score.time(), Duration::from_millis(999_995));
        assert_eq!(score.robots(), 99);
    }

    #[test]
    fn reconcile_takes_best_of_each_field_independently() {
        let mut score = BestScore::default();
        assert!(score.reconcile(&result(4_000, 3)));
        assert!(score.reconcile(&result(2_500, 5)));
        assert!(score.reconcile(&result(9_000, 2)));

        assert_eq!(score.time(), Duration::from_millis(2_500));
        assert_eq!(score.robots(), 2);
        assert!(score.completed());
    }

    #[test]
    fn equal_or_worse_results_change_nothing() {
        let mut score = BestScore::default();
        assert!(score.reconcile(&result(1_000, 2)));
        assert!(!score.reconcile(&result(1_000, 2)));
        assert!(!score.reconcile(&result(1_500, 4)));
    }

    #[test]
    fn incomplete_results_are_ignored() {
        let mut score = BestScore::default();
        let mut incomplete = result(10, 1);
        incomplete.completed = false;
        assert!(!score.reconcile(&incomplete));
        assert_eq!(score, BestScore::default());
    }

    #[test]
    fn goals_compare_inclusively() {
        let goals = LevelGoals::new(Duration::from_millis(2_000), 2);
        let mut score = BestScore::default();
        assert_eq!(
            goals.evaluate(&score),
            GoalStatus {
                time_met: false,
                robots_met: false,
            }
        );

        let _ = score.reconcile(&result(2_000, 3));
        let status = goals.evaluate(&score);
        assert!(status.time_met);
        assert!(!status.robots_met);
        assert!(!status.all_met());
    }

    #[test]
    fn times_format_like_the_score_screen() {
        assert_eq!(format_time(Duration::from_millis(50)), "0.050");
        assert_eq!(format_time(Duration::from_millis(1_250)), "1.250");
        assert_eq!(format_time(Duration::from_millis(65_004)), "1:05.004");
        assert_eq!(format_time(BestScore::UNSET_TIME), "16:39.995");
    }

    #[test]
    fn score_book_tracks_levels_separately() {
        let mut book = ScoreBook::default();
        assert!(book.record(3, &result(3_000, 2)));
        assert!(book.record(1, &result(1_000, 1)));
        assert!(!book.record(3, &result(3_500, 2)));

        assert_eq!(book.get(3).time(), Duration::from_millis(3_000));
        assert!(!book.get(2).completed());
        let levels: Vec<u32> = book.iter().map(|(level, _)| level).collect();
        assert_eq!(levels, vec![1, 3]);
    }

    #[test]
    fn score_book_survives_toml() {
        let mut book = ScoreBook::default();
        let _ = book.record(2, &result(1_750, 2));

        let text = toml::to_string(&book).expect("serialize");
        assert!(text.contains("[[score]]"), "unexpected layout:\n{text}");
        let restored: ScoreBook = toml::from_str(&text).expect("deserialize");
        assert_eq!(restored, book);
    }
}
