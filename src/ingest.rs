use std::collections::BTreeMap;

use ahash::{AHashMap, AHashSet};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    config::{HistoryConfig, StrictRules},
    errors::{HistoryError, Result, StrictViolation},
    history::{BenchmarkHistory, BenchmarkRecord, RunSnapshot},
    result::{BenchmarkResult, BenchmarkRunResult},
};

/// Per-call options for [`add_results`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AddOptions {
    /// Identifies the run besides its date, e.g. a commit hash.
    pub id: Option<String>,
    /// Overrides the snapshot date. Defaults to now.
    pub date: Option<DateTime<Utc>>,
}

impl AddOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id<T: Into<String>>(mut self, id: T) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Parses an RFC 3339 timestamp such as `2020-09-12T10:00:00.000Z`.
    pub fn with_date_str(self, date: &str) -> Result<Self> {
        let parsed = DateTime::parse_from_rfc3339(date)
            .map_err(|e| HistoryError::invalid_date(format!("{date}: {e}")))?;
        Ok(self.with_date(parsed.with_timezone(&Utc)))
    }

    fn resolve_date(&self) -> DateTime<Utc> {
        self.date.unwrap_or_else(Utc::now)
    }
}

/// Validates `batch` against `config` and appends it to `history`.
///
/// Validation runs before anything is touched, so a failing batch leaves the
/// history exactly as it was.
pub fn add_results(
    history: &mut BenchmarkHistory,
    config: &HistoryConfig,
    batch: &BenchmarkRunResult,
    options: AddOptions,
) -> Result<()> {
    validate_batch(history, config, batch)?;

    let benchmarks: BTreeMap<String, BenchmarkRecord> = batch
        .results
        .iter()
        .map(|result| (result.name.clone(), build_record(config, result)))
        .collect();
    let snapshot = RunSnapshot {
        date: options.resolve_date(),
        id: options.id,
        run_extras: config.compute_run_extras(batch),
        benchmarks,
    };
    debug!(
        date = %snapshot.date,
        id = snapshot.id.as_deref().unwrap_or(""),
        benchmarks = snapshot.benchmarks.len(),
        "appending run snapshot"
    );
    history.history.push(snapshot);
    history.sort_by_date();
    Ok(())
}

/// Runs every ingest rule in order without mutating anything.
pub fn validate_batch(
    history: &BenchmarkHistory,
    config: &HistoryConfig,
    batch: &BenchmarkRunResult,
) -> Result<()> {
    check_duplicate_names(batch)?;
    if let Some(min) = config.required_runs() {
        check_required_runs(batch, min)?;
    }
    if !config.ease_low_precision {
        check_precision(batch)?;
    }
    if config.strict.is_enabled() && !history.is_empty() {
        let violations = strict_violations(history, config.strict, batch);
        if !violations.is_empty() {
            return Err(HistoryError::StrictModeViolation { violations });
        }
    }
    Ok(())
}

fn build_record(config: &HistoryConfig, result: &BenchmarkResult) -> BenchmarkRecord {
    BenchmarkRecord {
        total_ms: result.total_ms,
        runs_count: result.runs_count,
        measured_runs_avg_ms: result.measured_runs_avg_ms,
        measured_runs_ms: config
            .save_individual_runs
            .then(|| result.measured_runs_ms.clone()),
        extras: config.compute_bench_extras(result),
    }
}

fn check_duplicate_names(batch: &BenchmarkRunResult) -> Result<()> {
    let mut counts: AHashMap<&str, usize> = AHashMap::new();
    for result in &batch.results {
        *counts.entry(result.name.as_str()).or_default() += 1;
    }
    let mut reported = AHashSet::new();
    let names: Vec<String> = batch
        .results
        .iter()
        .map(|r| r.name.as_str())
        .filter(|name| counts[name] > 1 && reported.insert(*name))
        .map(str::to_string)
        .collect();
    if names.is_empty() {
        Ok(())
    } else {
        Err(HistoryError::DuplicateName { names })
    }
}

fn check_required_runs(batch: &BenchmarkRunResult, min: usize) -> Result<()> {
    let offenders: Vec<(String, usize)> = batch
        .results
        .iter()
        .filter(|r| r.runs_count < min || r.measured_runs_ms.len() < min)
        .map(|r| (r.name.clone(), r.runs_count.min(r.measured_runs_ms.len())))
        .collect();
    if offenders.is_empty() {
        Ok(())
    } else {
        Err(HistoryError::InsufficientRuns { min, offenders })
    }
}

// An integral total is taken as a sign the runner had no sub-millisecond timer.
fn check_precision(batch: &BenchmarkRunResult) -> Result<()> {
    let names: Vec<String> = batch
        .results
        .iter()
        .filter(|r| r.total_ms.fract() == 0.0)
        .map(|r| r.name.clone())
        .collect();
    if names.is_empty() {
        Ok(())
    } else {
        Err(HistoryError::LowPrecisionTiming { names })
    }
}

fn strict_violations(
    history: &BenchmarkHistory,
    rules: StrictRules,
    batch: &BenchmarkRunResult,
) -> Vec<StrictViolation> {
    let previous = history.benchmark_names();
    let mut violations = Vec::new();

    for name in &previous {
        let current = batch.get(name);
        match current {
            None if rules.no_removal => {
                violations.push(StrictViolation::Removed { name: name.clone() });
            }
            Some(current) if rules.no_runs_count_change => {
                if let Some(last) = history.latest_record(name) {
                    if last.runs_count != current.runs_count {
                        violations.push(StrictViolation::RunsCountChanged {
                            name: name.clone(),
                            current: current.runs_count,
                            previous: last.runs_count,
                        });
                    }
                }
            }
            _ => {}
        }
    }

    if rules.no_addition {
        let known: AHashSet<&str> = previous.iter().map(String::as_str).collect();
        let added: Vec<String> = batch
            .results
            .iter()
            .filter(|r| !known.contains(r.name.as_str()))
            .map(|r| r.name.clone())
            .collect();
        if !added.is_empty() {
            violations.push(StrictViolation::Added { names: added });
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, total_ms: f64, runs: usize) -> BenchmarkResult {
        BenchmarkResult {
            name: name.into(),
            total_ms,
            runs_count: runs,
            measured_runs_avg_ms: total_ms / runs as f64,
            measured_runs_ms: vec![total_ms / runs as f64; runs],
        }
    }

    #[test]
    fn test_duplicate_names_reported_once_each() {
        let batch = BenchmarkRunResult::new(vec![
            result("a", 1.5, 2),
            result("b", 1.5, 2),
            result("a", 1.5, 2),
            result("a", 1.5, 2),
        ]);
        let err = check_duplicate_names(&batch).unwrap_err();
        assert_eq!(
            err,
            HistoryError::DuplicateName {
                names: vec!["a".into()]
            }
        );
    }

    #[test]
    fn test_required_runs_checks_sample_count_too() {
        let mut short = result("short", 10.5, 10);
        short.measured_runs_ms.truncate(3);
        let batch = BenchmarkRunResult::new(vec![short, result("ok", 10.5, 10)]);
        let err = check_required_runs(&batch, 5).unwrap_err();
        assert_eq!(
            err,
            HistoryError::InsufficientRuns {
                min: 5,
                offenders: vec![("short".into(), 3)]
            }
        );
    }

    #[test]
    fn test_precision_flags_integral_totals() {
        let batch = BenchmarkRunResult::new(vec![result("a", 10.0, 2), result("b", 10.25, 2)]);
        let err = check_precision(&batch).unwrap_err();
        assert_eq!(
            err,
            HistoryError::LowPrecisionTiming {
                names: vec!["a".into()]
            }
        );
    }

    #[test]
    fn test_strict_rules_skip_disabled_checks() {
        let mut history = BenchmarkHistory::new();
        let config = HistoryConfig::new();
        add_results(
            &mut history,
            &config,
            &BenchmarkRunResult::new(vec![result("a", 1.5, 2)]),
            AddOptions::new(),
        )
        .unwrap();
        let batch = BenchmarkRunResult::new(vec![result("b", 1.5, 3)]);
        let rules = StrictRules {
            no_removal: false,
            no_addition: true,
            no_runs_count_change: false,
        };
        let violations = strict_violations(&history, rules, &batch);
        assert_eq!(
            violations,
            vec![StrictViolation::Added {
                names: vec!["b".into()]
            }]
        );
    }
}
