/// Ranking sessions: the judge loop, saving and resuming, and the
/// per-comparison JSONL log.
use anyhow::{anyhow, Context, Result};
use elorank_core::{EloUpdate, ItemPayload, RankingEngine, RankingSnapshot};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::judge::{Decision, Judge};

pub type Snapshot = RankingSnapshot<ItemPayload>;

/// Failed comparisons in a row (errors or no verdict) before a session gives up.
pub const MAX_CONSECUTIVE_FAILURES: usize = 5;

#[derive(Default)]
pub struct SessionOptions {
    /// Stop after this many reported comparisons.
    pub budget: Option<usize>,
    /// Autosave the snapshot here after every comparison.
    pub state: Option<PathBuf>,
    pub log: Option<ComparisonLog>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub reported: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Ask the judge about the active pair until the budget is spent, the judge
/// quits, or too many comparisons fail in a row.
///
/// Skips draw a new pair and do not count as failures. Judge errors and
/// missing verdicts do; after `MAX_CONSECUTIVE_FAILURES` of them the state is
/// saved and an error returned.
pub async fn run_session(
    engine: &mut RankingEngine<ItemPayload>,
    judge: &mut Judge,
    options: &mut SessionOptions,
) -> Result<SessionSummary> {
    let mut summary = SessionSummary::default();
    let mut consecutive_failures: usize = 0;

    while options.budget.map_or(true, |max| summary.reported < max) {
        let Some((a, b)) = engine.active_pair() else {
            warn!("Fewer than two items, nothing to compare");
            break;
        };
        let first = engine.items()[a].payload.clone();
        let second = engine.items()[b].payload.clone();

        let failure = match judge.decide(&first, &second, engine.total_rounds() + 1).await {
            Ok(Decision::FirstWins) => {
                record_comparison(engine, options, (a, b), (&first, &second), true)?;
                summary.reported += 1;
                consecutive_failures = 0;
                continue;
            }
            Ok(Decision::SecondWins) => {
                record_comparison(engine, options, (a, b), (&first, &second), false)?;
                summary.reported += 1;
                consecutive_failures = 0;
                continue;
            }
            Ok(Decision::Skip) => {
                summary.skipped += 1;
                engine.select_next_pair();
                continue;
            }
            Ok(Decision::Quit) => break,
            Ok(Decision::Undecided) => anyhow!("no verdict for {} vs {}", first.name, second.name),
            Err(e) => e,
        };

        summary.failed += 1;
        consecutive_failures += 1;
        warn!("Comparison of {} vs {} failed: {:#}", first.name, second.name, failure);
        if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
            if let Some(ref path) = options.state {
                save_snapshot(path, &engine.snapshot())?;
            }
            return Err(failure.context(format!(
                "giving up after {consecutive_failures} failed comparisons in a row"
            )));
        }
        engine.select_next_pair();
    }

    Ok(summary)
}

fn record_comparison(
    engine: &mut RankingEngine<ItemPayload>,
    options: &mut SessionOptions,
    (a, b): (usize, usize),
    (first, second): (&ItemPayload, &ItemPayload),
    first_wins: bool,
) -> Result<()> {
    let update = engine.report_comparison(a, b, first_wins);
    let (winner, loser) = if first_wins { (first, second) } else { (second, first) };
    let (winner_diff, loser_diff) = if first_wins {
        (update.diff_a, update.diff_b)
    } else {
        (update.diff_b, update.diff_a)
    };
    info!(
        "Round {}: {} beat {} ({:+.1} / {:+.1})",
        engine.total_rounds(), winner.name, loser.name, winner_diff, loser_diff,
    );

    if let Some(ref mut log) = options.log {
        log.record(engine.total_rounds(), &first.name, &second.name, first_wins, &update)?;
    }
    if let Some(ref path) = options.state {
        save_snapshot(path, &engine.snapshot())?;
    }
    Ok(())
}

/// Load a saved session. The caller validates it when restoring the engine.
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse session file {}", path.display()))
}

/// Write a session atomically: to a sibling temp file, then rename over.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot).context("Failed to serialize session")?;

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, json)
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to move session into place at {}", path.display()))
}

/// Append-only JSONL record of every reported comparison.
pub struct ComparisonLog {
    file: File,
    path: PathBuf,
}

impl ComparisonLog {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        Ok(ComparisonLog { file, path: path.to_path_buf() })
    }

    pub fn record(&mut self, round: usize, first: &str, second: &str, first_wins: bool, update: &EloUpdate) -> Result<()> {
        let line = serde_json::json!({
            "round": round,
            "item1": first,
            "item2": second,
            "winner": if first_wins { first } else { second },
            "expected": update.expected_a,
            "diff1": update.diff_a,
            "diff2": update.diff_b,
        });
        writeln!(self.file, "{}", line)
            .and_then(|_| self.file.flush())
            .with_context(|| format!("Failed to append to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::TerminalJudge;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::VecDeque;
    use std::io::Cursor;

    fn engine(names: &[&str]) -> RankingEngine<ItemPayload> {
        RankingEngine::with_seed(names.iter().map(|n| ItemPayload::new(*n)), 21)
    }

    fn terminal(answers: &[u8]) -> Judge {
        Judge::Terminal(TerminalJudge::new(Box::new(Cursor::new(answers.to_vec()))))
    }

    fn scripted(decisions: &[Decision]) -> Judge {
        Judge::Scripted(decisions.iter().copied().collect::<VecDeque<_>>())
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("elorank-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_snapshot_save_load() {
        let dir = temp_dir("session");
        let path = dir.join("session.json");

        let payloads = vec![
            ItemPayload::new("Windowlicker").with_metadata("artist", "Aphex Twin"),
            ItemPayload::new("Teardrop"),
            ItemPayload::new("Unfinished Sympathy"),
        ];
        let mut engine = RankingEngine::with_seed(payloads, 4);
        let (a, b) = engine.active_pair().unwrap();
        engine.report_comparison(a, b, true);

        save_snapshot(&path, &engine.snapshot()).unwrap();
        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded, engine.snapshot());
        assert!(!dir.join("session.json.tmp").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_snapshot_reports_path() {
        let dir = temp_dir("bad-session");
        let path = dir.join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_snapshot(&path).unwrap_err();
        assert!(format!("{err}").contains("broken.json"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_comparison_log_appends_lines() {
        let dir = temp_dir("log");
        let path = dir.join("comparisons.jsonl");
        let update = EloUpdate { expected_a: 0.5, diff_a: 16.0, diff_b: -16.0 };

        let mut log = ComparisonLog::open(&path).unwrap();
        log.record(1, "A", "B", true, &update).unwrap();
        log.record(2, "C", "A", false, &update).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["winner"], "A");
        assert_eq!(lines[1]["winner"], "A");
        assert_eq!(lines[1]["round"], 2);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_session_answers_skip_and_quit() {
        let dir = temp_dir("run");
        let state = dir.join("session.json");
        let log_path = dir.join("comparisons.jsonl");

        let mut engine = engine(&["Hey Jude", "Yesterday", "Let It Be", "Help!"]);
        let mut judge = terminal(b"1\ns\n2\nq\n");
        let mut options = SessionOptions {
            budget: None,
            state: Some(state.clone()),
            log: Some(ComparisonLog::open(&log_path).unwrap()),
        };

        let summary = run_session(&mut engine, &mut judge, &mut options).await.unwrap();
        assert_eq!(summary, SessionSummary { reported: 2, skipped: 1, failed: 0 });
        assert_eq!(engine.total_rounds(), 2);

        let saved = load_snapshot(&state).unwrap();
        assert_eq!(saved, engine.snapshot());
        let restored = RankingEngine::restore(saved, StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(restored.total_rounds(), 2);

        let log = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(log.lines().count(), 2);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_session_stops_at_budget() {
        let mut engine = engine(&["A", "B", "C"]);
        let mut judge = terminal(b"1\n1\n1\n1\n1\n");
        let mut options = SessionOptions { budget: Some(3), ..Default::default() };

        let summary = run_session(&mut engine, &mut judge, &mut options).await.unwrap();
        assert_eq!(summary.reported, 3);
        assert_eq!(engine.total_rounds(), 3);
    }

    #[tokio::test]
    async fn test_session_gives_up_on_read_errors() {
        let dir = temp_dir("run-errors");
        let state = dir.join("session.json");

        // Invalid UTF-8 makes every answer unreadable
        let mut engine = engine(&["A", "B", "C"]);
        let mut judge = terminal(&b"\xff\n".repeat(MAX_CONSECUTIVE_FAILURES + 1));
        let mut options = SessionOptions { state: Some(state.clone()), ..Default::default() };

        let err = run_session(&mut engine, &mut judge, &mut options).await.unwrap_err();
        assert!(format!("{err}").contains("in a row"));
        assert_eq!(engine.total_rounds(), 0);
        assert_eq!(load_snapshot(&state).unwrap(), engine.snapshot());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_missing_verdicts_count_as_failures() {
        let mut engine = engine(&["A", "B", "C"]);
        let mut judge = scripted(&[Decision::Undecided; MAX_CONSECUTIVE_FAILURES]);
        let mut options = SessionOptions { budget: Some(10), ..Default::default() };

        let err = run_session(&mut engine, &mut judge, &mut options).await.unwrap_err();
        assert!(format!("{err:#}").contains("no verdict"));
        assert_eq!(engine.total_rounds(), 0);
    }

    #[tokio::test]
    async fn test_reported_comparison_resets_failure_streak() {
        let mut decisions = vec![Decision::Undecided; MAX_CONSECUTIVE_FAILURES - 1];
        decisions.push(Decision::FirstWins);
        decisions.extend(vec![Decision::Undecided; MAX_CONSECUTIVE_FAILURES - 1]);

        let mut engine = engine(&["A", "B", "C"]);
        let mut judge = scripted(&decisions);
        let mut options = SessionOptions::default();

        let summary = run_session(&mut engine, &mut judge, &mut options).await.unwrap();
        assert_eq!(summary.reported, 1);
        assert_eq!(summary.failed, 2 * (MAX_CONSECUTIVE_FAILURES - 1));
    }

    #[tokio::test]
    async fn test_skips_are_not_failures() {
        let mut engine = engine(&["A", "B", "C"]);
        let mut judge = scripted(&[Decision::Skip; 3 * MAX_CONSECUTIVE_FAILURES]);
        let mut options = SessionOptions::default();

        let summary = run_session(&mut engine, &mut judge, &mut options).await.unwrap();
        assert_eq!(summary.skipped, 3 * MAX_CONSECUTIVE_FAILURES);
        assert_eq!(summary.failed, 0);
    }
}
