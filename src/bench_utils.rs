use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::result::{BenchmarkResult, BenchmarkRunResult};

/// Shape of a synthetic suite used by benches and tests.
#[derive(Clone, Debug)]
pub struct SuiteShape {
    pub benchmarks: usize,
    pub runs_count: usize,
    /// Base average per benchmark; each benchmark gets `base_ms * (idx + 1)`.
    pub base_ms: f64,
    /// Relative spread of individual runs around the average.
    pub jitter: f64,
}

impl Default for SuiteShape {
    fn default() -> Self {
        Self {
            benchmarks: 10,
            runs_count: 50,
            base_ms: 1.25,
            jitter: 0.1,
        }
    }
}

pub fn bench_name(idx: usize) -> String {
    format!("bench_{idx:03}")
}

/// Generates one run of the suite. Every timing carries a fractional part,
/// so the batch passes the precision check.
pub fn generate_run(shape: &SuiteShape, seed: u64) -> BenchmarkRunResult {
    assert!(shape.runs_count > 0, "runs_count must be positive");
    let mut rng = StdRng::seed_from_u64(seed);
    let results = (0..shape.benchmarks)
        .map(|idx| {
            let mean = shape.base_ms * (idx + 1) as f64;
            let runs: Vec<f64> = (0..shape.runs_count)
                .map(|_| {
                    let spread = rng.gen_range(-shape.jitter..=shape.jitter);
                    mean * (1.0 + spread) + rng.gen_range(0.0001..0.001)
                })
                .collect();
            BenchmarkResult::from_runs(bench_name(idx), runs)
        })
        .collect();
    BenchmarkRunResult::new(results)
}

/// Generates `count` consecutive runs with distinct seeds.
pub fn generate_runs(shape: &SuiteShape, count: usize, seed: u64) -> Vec<BenchmarkRunResult> {
    (0..count)
        .map(|offset| generate_run(shape, seed.wrapping_add(offset as u64)))
        .collect()
}

/// A fixed base date plus `day` days, for deterministic snapshot dates.
pub fn day(day: i64) -> DateTime<Utc> {
    let base = Utc
        .with_ymd_and_hms(2020, 9, 1, 12, 0, 0)
        .single()
        .unwrap_or_default();
    base + Duration::days(day)
}
