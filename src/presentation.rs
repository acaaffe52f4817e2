//! Plain-text annotations for progress lines, result cards and Markdown
//! tables. Coloring and layout are left to the caller.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    delta::{Delta, DeltaKey},
    errors::Result,
    history::{HistoryStore, RunSnapshot},
    result::BenchmarkResult,
};

pub const NO_HISTORY: &str = " ▪   no history  ▪ ";
pub const EMPTY_CELL: &str = "-";
pub const DEFAULT_PRECISION: usize = 4;

const EN_QUAD: char = '\u{2000}';
const THIN_SPACE: char = '\u{2009}';

/// Formats milliseconds with a fixed number of decimals.
pub fn rtime(ms: f64, precision: usize) -> String {
    format!("{ms:.precision$}")
}

/// Compact change of the average run time, e.g. ` ▲  +10% (10.0000ms)`.
pub fn cli_delta_string(store: &HistoryStore, result: &BenchmarkResult) -> Result<String> {
    let key = DeltaKey::MeasuredRunsAvgMs;
    let deltas = store.delta_for_benchmark(result, std::slice::from_ref(&key))?;
    let Some(delta) = deltas.as_ref().and_then(|d| d.get(&key)) else {
        return Ok(format!("{NO_HISTORY:<19}"));
    };
    let (perc, diff) = percent_and_diff(delta);
    Ok(if delta.amount > 0.0 {
        format!(" ▲ {:>4}% ({diff:>6}ms)", format!("+{perc}"))
    } else {
        format!(" ▼ {perc:>4}% ({diff:>6}ms)")
    })
}

/// Suffix for a progress line: ` [<delta>]`.
pub fn progress_row_extra(store: &HistoryStore, result: &BenchmarkResult) -> Result<String> {
    Ok(format!(" [{}]", cli_delta_string(store, result)?))
}

/// Extra info cell of a result card.
pub fn result_info_cell(store: &HistoryStore, result: &BenchmarkResult) -> Result<String> {
    Ok(format!("  {}", cli_delta_string(store, result)?))
}

/// A Markdown column showing the change of one metric.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeltaColumn {
    pub key: Option<DeltaKey>,
}

impl DeltaColumn {
    pub fn new(key: Option<DeltaKey>) -> Self {
        Self { key }
    }

    pub fn title(&self) -> String {
        match &self.key {
            Some(key) => format!("Change in {key}"),
            None => "Change in average".to_string(),
        }
    }

    pub fn cell(&self, store: &HistoryStore, result: &BenchmarkResult) -> Result<String> {
        let key = self.key.clone().unwrap_or(DeltaKey::MeasuredRunsAvgMs);
        let deltas = store.delta_for_benchmark(result, std::slice::from_ref(&key))?;
        let Some(delta) = deltas.as_ref().and_then(|d| d.get(&key)) else {
            return Ok(EMPTY_CELL.to_string());
        };
        let (perc, diff) = percent_and_diff(delta);
        Ok(if delta.amount > 0.0 {
            format!(
                "🔺 {}% ({diff:>6}ms)",
                pad_start(&format!("+{perc}"), 4, EN_QUAD)
            )
        } else {
            format!(
                "🟢{THIN_SPACE} {}% ({diff:>6}ms)",
                pad_start(&perc, 4, EN_QUAD)
            )
        })
    }
}

/// Formats a column title from a run's date and optional id.
pub type TitleFormatter = dyn Fn(DateTime<Utc>, Option<&str>) -> String;

/// One Markdown column per recorded run.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryColumn {
    pub title: String,
    key: DeltaKey,
    snapshot: RunSnapshot,
}

impl HistoryColumn {
    pub fn date(&self) -> DateTime<Utc> {
        self.snapshot.date
    }

    /// The recorded value of the column's key for `name`, or `-`.
    pub fn cell(&self, name: &str) -> String {
        let Some(record) = self.snapshot.record(name) else {
            return EMPTY_CELL.to_string();
        };
        match &self.key {
            DeltaKey::MeasuredRunsAvgMs => rtime(record.measured_runs_avg_ms, DEFAULT_PRECISION),
            DeltaKey::TotalMs => rtime(record.total_ms, DEFAULT_PRECISION),
            DeltaKey::Extra(extra) => match record.extras.as_ref().and_then(|e| e.get(extra)) {
                Some(Value::Number(n)) => n
                    .as_f64()
                    .map(|v| rtime(v, DEFAULT_PRECISION))
                    .unwrap_or_else(|| n.to_string()),
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => EMPTY_CELL.to_string(),
                Some(other) => other.to_string(),
            },
        }
    }
}

impl fmt::Display for HistoryColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Builds one column per snapshot, oldest first. Titles use the formatter
/// when given, then the run id, then the run date.
pub fn history_columns(
    store: &HistoryStore,
    key: Option<DeltaKey>,
    title_formatter: Option<&TitleFormatter>,
) -> Vec<HistoryColumn> {
    let key = key.unwrap_or(DeltaKey::MeasuredRunsAvgMs);
    store
        .history()
        .history
        .iter()
        .map(|snapshot| {
            let title = match (title_formatter, &snapshot.id) {
                (Some(formatter), id) => formatter(snapshot.date, id.as_deref()),
                (None, Some(id)) => id.clone(),
                (None, None) => default_date_title(snapshot.date),
            };
            HistoryColumn {
                title,
                key: key.clone(),
                snapshot: snapshot.clone(),
            }
        })
        .collect()
}

fn default_date_title(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d<br/>%H:%M:%S%.3f").to_string()
}

fn percent_and_diff(delta: &Delta) -> (String, String) {
    (
        format!("{:.0}", (delta.percent * 100.0).round()),
        rtime(delta.amount.abs(), DEFAULT_PRECISION),
    )
}

fn pad_start(s: &str, width: usize, fill: char) -> String {
    let len = s.chars().count();
    let mut padded: String = std::iter::repeat(fill).take(width.saturating_sub(len)).collect();
    padded.push_str(s);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rtime_fixed_precision() {
        assert_eq!(rtime(1.23457, 4), "1.2346");
        assert_eq!(rtime(10.0, 0), "10");
    }

    #[test]
    fn test_percent_rounds_halves_away_from_zero() {
        let up = Delta { percent: 0.125, amount: 12.5 };
        assert_eq!(percent_and_diff(&up), ("13".to_string(), "12.5000".to_string()));
        let down = Delta { percent: -0.125, amount: -12.5 };
        assert_eq!(percent_and_diff(&down).0, "-13");
    }

    #[test]
    fn test_pad_start_counts_chars() {
        assert_eq!(pad_start("+5", 4, EN_QUAD), "\u{2000}\u{2000}+5");
        assert_eq!(pad_start("+100", 4, EN_QUAD), "+100");
    }

    #[test]
    fn test_default_date_title() {
        let date = DateTime::parse_from_rfc3339("2020-09-12T10:00:00.250Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(default_date_title(date), "2020-09-12<br/>10:00:00.250");
    }
}
