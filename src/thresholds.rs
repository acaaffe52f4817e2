//! Green/yellow bounds derived from each benchmark's recorded trend.

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    history::{BenchmarkHistory, RunSnapshot},
    result::BenchmarkRunResult,
};

pub const DEFAULT_MIN_PROCEEDING_RUNS: usize = 5;
pub const DEFAULT_GREEN_MULTIPLIER: f64 = 1.1;
/// Both 1.2 and 1.3 have been used for the yellow bound; 1.2 is the default.
pub const DEFAULT_YELLOW_MULTIPLIER: f64 = 1.2;
pub const ALT_YELLOW_MULTIPLIER: f64 = 1.3;

/// Receives the benchmark name and every snapshot containing it, oldest first.
pub type ThresholdCalculatorFn = Arc<dyn Fn(&str, &[&RunSnapshot]) -> Threshold + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    /// Upper bound in ms of a good measurement.
    pub green: f64,
    /// Upper bound in ms of a measurement worth a warning.
    pub yellow: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThresholdRange {
    Green,
    Yellow,
    Red,
}

impl Threshold {
    pub fn range(&self, time_ms: f64) -> ThresholdRange {
        if time_ms <= self.green {
            ThresholdRange::Green
        } else if time_ms <= self.yellow {
            ThresholdRange::Yellow
        } else {
            ThresholdRange::Red
        }
    }
}

pub type Thresholds = BTreeMap<String, Threshold>;

/// Range of `time_ms` for `name`, or `None` when no threshold exists for it.
pub fn threshold_range(thresholds: &Thresholds, name: &str, time_ms: f64) -> Option<ThresholdRange> {
    thresholds.get(name).map(|th| th.range(time_ms))
}

#[derive(Clone)]
pub struct ThresholdConfig {
    /// Benchmarks with fewer recorded runs get no threshold.
    pub min_proceeding_runs: usize,
    pub green_multiplier: f64,
    pub yellow_multiplier: f64,
    /// Replaces the default min/max formula when set.
    pub calculate: Option<ThresholdCalculatorFn>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            min_proceeding_runs: DEFAULT_MIN_PROCEEDING_RUNS,
            green_multiplier: DEFAULT_GREEN_MULTIPLIER,
            yellow_multiplier: DEFAULT_YELLOW_MULTIPLIER,
            calculate: None,
        }
    }
}

impl ThresholdConfig {
    pub fn with_min_proceeding_runs(mut self, runs: usize) -> Self {
        self.min_proceeding_runs = runs;
        self
    }

    pub fn with_yellow_multiplier(mut self, multiplier: f64) -> Self {
        self.yellow_multiplier = multiplier;
        self
    }

    pub fn with_green_multiplier(mut self, multiplier: f64) -> Self {
        self.green_multiplier = multiplier;
        self
    }

    pub fn with_calculator<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &[&RunSnapshot]) -> Threshold + Send + Sync + 'static,
    {
        self.calculate = Some(Arc::new(f));
        self
    }

    fn default_threshold(&self, name: &str, runs: &[&RunSnapshot]) -> Threshold {
        let (min, max) = runs
            .iter()
            .filter_map(|run| run.record(name))
            .map(|record| record.measured_runs_avg_ms)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), avg| {
                (lo.min(avg), hi.max(avg))
            });
        Threshold {
            green: min * self.green_multiplier,
            yellow: max * self.yellow_multiplier,
        }
    }
}

impl fmt::Debug for ThresholdConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThresholdConfig")
            .field("min_proceeding_runs", &self.min_proceeding_runs)
            .field("green_multiplier", &self.green_multiplier)
            .field("yellow_multiplier", &self.yellow_multiplier)
            .field("calculate", &self.calculate.is_some())
            .finish()
    }
}

/// Derives a threshold for every benchmark with enough recorded runs.
/// Benchmarks below `min_proceeding_runs` are absent from the result.
pub fn calculate_thresholds(history: &BenchmarkHistory, config: &ThresholdConfig) -> Thresholds {
    let mut thresholds = Thresholds::new();
    for name in history.benchmark_names() {
        let runs: Vec<&RunSnapshot> = history.runs_for(&name).collect();
        if runs.len() < config.min_proceeding_runs {
            debug!(benchmark = %name, runs = runs.len(), "not enough history for threshold");
            continue;
        }
        let threshold = match &config.calculate {
            Some(calculate) => calculate(&name, &runs),
            None => config.default_threshold(&name, &runs),
        };
        thresholds.insert(name, threshold);
    }
    thresholds
}

#[derive(Clone, Debug, PartialEq)]
pub enum GateOutcome {
    Pass,
    Fail(Vec<String>),
}

/// Checks a batch against derived thresholds. Measurements above the
/// yellow bound fail; benchmarks without a threshold pass.
pub fn evaluate(thresholds: &Thresholds, batch: &BenchmarkRunResult) -> GateOutcome {
    let failures: Vec<String> = batch
        .results
        .iter()
        .filter_map(|result| {
            let threshold = thresholds.get(&result.name)?;
            (threshold.range(result.measured_runs_avg_ms) == ThresholdRange::Red).then(|| {
                format!(
                    "{} exceeds threshold: current={:.4}ms yellow={:.4}ms",
                    result.name, result.measured_runs_avg_ms, threshold.yellow
                )
            })
        })
        .collect();
    if failures.is_empty() {
        GateOutcome::Pass
    } else {
        GateOutcome::Fail(failures)
    }
}
