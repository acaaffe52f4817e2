use std::collections::BTreeMap;

use ahash::AHashSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::HistoryConfig,
    delta::{self, Delta, DeltaKey},
    errors::{HistoryError, Result},
    ingest::{self, AddOptions},
    result::{BenchmarkResult, BenchmarkRunResult},
    thresholds::{ThresholdConfig, Thresholds, calculate_thresholds},
};

/// The persisted history: every recorded run, ascending by date.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkHistory {
    pub history: Vec<RunSnapshot>,
}

/// The results of one run of the whole suite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_extras: Option<Value>,
    pub benchmarks: BTreeMap<String, BenchmarkRecord>,
}

/// One benchmark's stored values within a [`RunSnapshot`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkRecord {
    pub total_ms: f64,
    pub runs_count: usize,
    pub measured_runs_avg_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured_runs_ms: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
}

impl RunSnapshot {
    pub fn record(&self, name: &str) -> Option<&BenchmarkRecord> {
        self.benchmarks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.benchmarks.contains_key(name)
    }
}

impl BenchmarkHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Stable sort, so runs sharing a date keep their insertion order.
    pub fn sort_by_date(&mut self) {
        self.history.sort_by_key(|snapshot| snapshot.date);
    }

    pub fn is_sorted_by_date(&self) -> bool {
        self.history.windows(2).all(|w| w[0].date <= w[1].date)
    }

    /// Every benchmark name ever recorded, in first-seen order.
    pub fn benchmark_names(&self) -> Vec<String> {
        let mut seen = AHashSet::new();
        let mut names = Vec::new();
        for snapshot in &self.history {
            for name in snapshot.benchmarks.keys() {
                if seen.insert(name.as_str()) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    /// Snapshots containing `name`, oldest first.
    pub fn runs_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RunSnapshot> + 'a {
        self.history.iter().filter(move |s| s.contains(name))
    }

    /// The record from the most recent snapshot containing `name`.
    pub fn latest_record(&self, name: &str) -> Option<&BenchmarkRecord> {
        self.history.iter().rev().find_map(|s| s.record(name))
    }
}

/// A benchmark history together with the rules it enforces.
///
/// The store performs no I/O: seed it with [`HistoryStore::with_data`] or
/// [`HistoryStore::from_json_str`] and persist [`HistoryStore::data_string`].
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    data: BenchmarkHistory,
    config: HistoryConfig,
}

impl HistoryStore {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            data: BenchmarkHistory::new(),
            config,
        }
    }

    pub fn with_data(mut data: BenchmarkHistory, config: HistoryConfig) -> Self {
        data.sort_by_date();
        Self { data, config }
    }

    pub fn from_json_str(json: &str, config: HistoryConfig) -> Result<Self> {
        let data: BenchmarkHistory =
            serde_json::from_str(json).map_err(|e| HistoryError::serialization(e.to_string()))?;
        Ok(Self::with_data(data, config))
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn history(&self) -> &BenchmarkHistory {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Validates `batch` and appends it as a new snapshot. Nothing is stored
    /// when any rule fails.
    pub fn add_results(
        &mut self,
        batch: &BenchmarkRunResult,
        options: AddOptions,
    ) -> Result<&mut Self> {
        ingest::add_results(&mut self.data, &self.config, batch, options)?;
        Ok(self)
    }

    /// Deltas for every result in `batch` that has history.
    pub fn deltas_from(
        &self,
        batch: &BenchmarkRunResult,
        keys: &[DeltaKey],
    ) -> Result<BTreeMap<String, BTreeMap<DeltaKey, Delta>>> {
        delta::deltas_from(&self.data, &self.config, batch, keys)
    }

    /// `Ok(None)` when the benchmark has never been recorded.
    pub fn delta_for_benchmark(
        &self,
        result: &BenchmarkResult,
        keys: &[DeltaKey],
    ) -> Result<Option<BTreeMap<DeltaKey, Delta>>> {
        delta::delta_for_benchmark(&self.data, &self.config, result, keys)
    }

    pub fn thresholds(&self, config: &ThresholdConfig) -> Thresholds {
        calculate_thresholds(&self.data, config)
    }

    pub fn data(&self) -> BenchmarkHistory {
        self.data.clone()
    }

    pub fn data_string(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.data)
            .map_err(|e| HistoryError::serialization(e.to_string()))
    }

    pub fn benchmark_names(&self) -> Vec<String> {
        self.data.benchmark_names()
    }
}
