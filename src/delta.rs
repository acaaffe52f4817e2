use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::{
    config::HistoryConfig,
    errors::{HistoryError, Result},
    history::BenchmarkHistory,
    result::{BenchmarkResult, BenchmarkRunResult},
};

/// Signed change of one metric against the most recent recorded value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    /// Fractional change, `0.1` for +10%.
    pub percent: f64,
    pub amount: f64,
}

impl Delta {
    pub fn between(current: f64, previous: f64) -> Self {
        let amount = current - previous;
        Self {
            percent: amount / previous,
            amount,
        }
    }
}

/// A metric a delta can be computed for.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeltaKey {
    MeasuredRunsAvgMs,
    TotalMs,
    /// A numeric field of the computed bench extras.
    Extra(String),
}

pub static DEFAULT_DELTA_KEYS: [DeltaKey; 2] = [DeltaKey::MeasuredRunsAvgMs, DeltaKey::TotalMs];

impl DeltaKey {
    /// A key into the computed extras. Built-in metric names resolve to
    /// their built-in variants.
    pub fn extra<T: Into<String>>(key: T) -> Self {
        DeltaKey::from(key.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            DeltaKey::MeasuredRunsAvgMs => "measuredRunsAvgMs",
            DeltaKey::TotalMs => "totalMs",
            DeltaKey::Extra(key) => key,
        }
    }
}

impl fmt::Display for DeltaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for DeltaKey {
    fn from(key: &str) -> Self {
        match key {
            "measuredRunsAvgMs" => DeltaKey::MeasuredRunsAvgMs,
            "totalMs" => DeltaKey::TotalMs,
            other => DeltaKey::Extra(other.to_string()),
        }
    }
}

impl From<String> for DeltaKey {
    fn from(key: String) -> Self {
        match key.as_str() {
            "measuredRunsAvgMs" | "totalMs" => DeltaKey::from(key.as_str()),
            _ => DeltaKey::Extra(key),
        }
    }
}

impl From<DeltaKey> for String {
    fn from(key: DeltaKey) -> Self {
        match key {
            DeltaKey::Extra(key) => key,
            builtin => builtin.as_str().to_string(),
        }
    }
}

/// Compares `result` against the latest recorded run of the same benchmark.
///
/// Returns `Ok(None)` when the benchmark has no history. Extra keys must be
/// present in the extras computed for `result`; a key missing from the
/// recorded extras is skipped instead.
pub fn delta_for_benchmark(
    history: &BenchmarkHistory,
    config: &HistoryConfig,
    result: &BenchmarkResult,
    keys: &[DeltaKey],
) -> Result<Option<BTreeMap<DeltaKey, Delta>>> {
    let Some(previous) = history.latest_record(&result.name) else {
        trace!(benchmark = %result.name, "no history for benchmark");
        return Ok(None);
    };

    let keys = if keys.is_empty() {
        &DEFAULT_DELTA_KEYS[..]
    } else {
        keys
    };
    let needs_extras = keys.iter().any(|k| matches!(k, DeltaKey::Extra(_)));
    let current_extras = if needs_extras {
        config.compute_bench_extras(result)
    } else {
        None
    };

    let mut deltas = BTreeMap::new();
    for key in keys {
        let (now, before) = match key {
            DeltaKey::MeasuredRunsAvgMs => {
                (result.measured_runs_avg_ms, previous.measured_runs_avg_ms)
            }
            DeltaKey::TotalMs => (result.total_ms, previous.total_ms),
            DeltaKey::Extra(name) => {
                let now = current_extras
                    .as_ref()
                    .and_then(|extras| extras.get(name))
                    .ok_or_else(|| HistoryError::unknown_extra_key(name, &result.name))?;
                let before = match previous.extras.as_ref().and_then(|e| e.get(name)) {
                    Some(value) if !value.is_null() => value,
                    _ => continue,
                };
                (numeric(now, name)?, numeric(before, name)?)
            }
        };
        deltas.insert(key.clone(), Delta::between(now, before));
    }
    Ok(Some(deltas))
}

/// Deltas for every result in `batch`; results without history are omitted.
pub fn deltas_from(
    history: &BenchmarkHistory,
    config: &HistoryConfig,
    batch: &BenchmarkRunResult,
    keys: &[DeltaKey],
) -> Result<BTreeMap<String, BTreeMap<DeltaKey, Delta>>> {
    let mut all = BTreeMap::new();
    for result in &batch.results {
        if let Some(deltas) = delta_for_benchmark(history, config, result, keys)? {
            all.insert(result.name.clone(), deltas);
        }
    }
    Ok(all)
}

fn numeric(value: &Value, key: &str) -> Result<f64> {
    value.as_f64().ok_or_else(|| HistoryError::non_numeric(key))
}
