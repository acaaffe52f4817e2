//! Historical deltas and adaptive thresholds for benchmark results.
//! Run Criterion benchmarks with `cargo bench` to inspect reports under `target/criterion`.

pub mod bench_utils;
pub mod config;
pub mod delta;
pub mod errors;
pub mod history;
pub mod ingest;
pub mod presentation;
pub mod result;
pub mod shared;
pub mod thresholds;

pub use crate::config::{HistoryConfig, HistorySettings, StrictRules, StrictSetting};
pub use crate::delta::{DEFAULT_DELTA_KEYS, Delta, DeltaKey};
pub use crate::errors::{HistoryError, Result, StrictViolation};
pub use crate::history::{BenchmarkHistory, BenchmarkRecord, HistoryStore, RunSnapshot};
pub use crate::ingest::AddOptions;
pub use crate::result::{BenchmarkResult, BenchmarkRunResult};
pub use crate::shared::SharedHistory;
pub use crate::thresholds::{
    Threshold, ThresholdConfig, ThresholdRange, Thresholds, calculate_thresholds,
};
