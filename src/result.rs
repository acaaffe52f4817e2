use serde::{Deserialize, Serialize};

/// A single benchmark's measurement as produced by the runner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResult {
    pub name: String,
    pub total_ms: f64,
    pub runs_count: usize,
    pub measured_runs_avg_ms: f64,
    #[serde(default)]
    pub measured_runs_ms: Vec<f64>,
}

impl BenchmarkResult {
    /// Builds a result from raw per-iteration timings.
    pub fn from_runs<N: Into<String>>(name: N, measured_runs_ms: Vec<f64>) -> Self {
        let total_ms: f64 = measured_runs_ms.iter().sum();
        let runs_count = measured_runs_ms.len();
        let measured_runs_avg_ms = if runs_count == 0 {
            0.0
        } else {
            total_ms / runs_count as f64
        };
        Self {
            name: name.into(),
            total_ms,
            runs_count,
            measured_runs_avg_ms,
            measured_runs_ms,
        }
    }
}

/// The batch produced by one run of a whole benchmark suite.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkRunResult {
    pub results: Vec<BenchmarkResult>,
}

impl BenchmarkRunResult {
    pub fn new(results: Vec<BenchmarkResult>) -> Self {
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&BenchmarkResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

impl From<Vec<BenchmarkResult>> for BenchmarkRunResult {
    fn from(results: Vec<BenchmarkResult>) -> Self {
        Self::new(results)
    }
}
