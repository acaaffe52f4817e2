//! Rules the history enforces when new results are added.
//!
//! [`HistoryConfig`] is immutable once built and carries the caller's extras
//! callbacks. [`HistorySettings`] is its serde-loadable subset, so the rules
//! can live in whatever configuration file the embedding application reads.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::result::{BenchmarkResult, BenchmarkRunResult};

/// Computes the `extras` stored alongside a single benchmark's record.
pub type BenchExtrasFn = Arc<dyn Fn(&BenchmarkResult) -> Value + Send + Sync>;

/// Computes the `runExtras` stored alongside a whole run.
pub type RunExtrasFn = Arc<dyn Fn(&BenchmarkRunResult) -> Value + Send + Sync>;

/// Which strict-mode rules are enforced once the history holds a snapshot.
///
/// `StrictRules::from(true)` is the same as [`StrictRules::all`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StrictRules {
    /// Every previously recorded benchmark must be present in the new batch.
    pub no_removal: bool,
    /// No benchmark may appear that was not recorded before.
    pub no_addition: bool,
    /// A benchmark's `runs_count` must match its latest recorded value.
    pub no_runs_count_change: bool,
}

impl StrictRules {
    pub fn all() -> Self {
        Self {
            no_removal: true,
            no_addition: true,
            no_runs_count_change: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.no_removal || self.no_addition || self.no_runs_count_change
    }
}

impl From<bool> for StrictRules {
    fn from(flag: bool) -> Self {
        if flag { Self::all() } else { Self::none() }
    }
}

/// The `strict` option as written in settings: a flag or a rule table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StrictSetting {
    Flag(bool),
    Rules(StrictRules),
}

impl From<StrictSetting> for StrictRules {
    fn from(setting: StrictSetting) -> Self {
        match setting {
            StrictSetting::Flag(flag) => flag.into(),
            StrictSetting::Rules(rules) => rules,
        }
    }
}

#[derive(Clone, Default)]
pub struct HistoryConfig {
    /// Accept results whose `total_ms` has no fractional part.
    pub ease_low_precision: bool,
    pub strict: StrictRules,
    /// Reject batches where any benchmark ran fewer times than this.
    pub min_required_runs: Option<usize>,
    /// Keep `measured_runs_ms` in the stored records. The history grows
    /// with every iteration measured, so this is off by default.
    pub save_individual_runs: bool,
    pub bench_extras: Option<BenchExtrasFn>,
    pub run_extras: Option<RunExtrasFn>,
}

impl HistoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strict<S: Into<StrictRules>>(mut self, strict: S) -> Self {
        self.strict = strict.into();
        self
    }

    pub fn with_min_required_runs(mut self, min: usize) -> Self {
        self.min_required_runs = Some(min);
        self
    }

    pub fn ease_low_precision(mut self, ease: bool) -> Self {
        self.ease_low_precision = ease;
        self
    }

    pub fn save_individual_runs(mut self, save: bool) -> Self {
        self.save_individual_runs = save;
        self
    }

    pub fn with_bench_extras<F>(mut self, f: F) -> Self
    where
        F: Fn(&BenchmarkResult) -> Value + Send + Sync + 'static,
    {
        self.bench_extras = Some(Arc::new(f));
        self
    }

    pub fn with_run_extras<F>(mut self, f: F) -> Self
    where
        F: Fn(&BenchmarkRunResult) -> Value + Send + Sync + 'static,
    {
        self.run_extras = Some(Arc::new(f));
        self
    }

    /// The minimum run count, treating zero as unset.
    pub fn required_runs(&self) -> Option<usize> {
        self.min_required_runs.filter(|min| *min > 0)
    }

    pub fn compute_bench_extras(&self, result: &BenchmarkResult) -> Option<Value> {
        self.bench_extras.as_ref().map(|f| f(result))
    }

    pub fn compute_run_extras(&self, batch: &BenchmarkRunResult) -> Option<Value> {
        self.run_extras.as_ref().map(|f| f(batch))
    }
}

impl fmt::Debug for HistoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryConfig")
            .field("ease_low_precision", &self.ease_low_precision)
            .field("strict", &self.strict)
            .field("min_required_runs", &self.min_required_runs)
            .field("save_individual_runs", &self.save_individual_runs)
            .field("bench_extras", &self.bench_extras.is_some())
            .field("run_extras", &self.run_extras.is_some())
            .finish()
    }
}

/// Serializable history options, resolved into a [`HistoryConfig`].
///
/// ```rust
/// use benchhistory::{HistorySettings, StrictRules};
///
/// let settings: HistorySettings =
///     serde_json::from_str(r#"{ "strict": true, "minRequiredRuns": 10 }"#).unwrap();
/// let config = settings.resolve();
/// assert_eq!(config.strict, StrictRules::all());
/// assert_eq!(config.min_required_runs, Some(10));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistorySettings {
    #[serde(alias = "easeOnlyHrTime")]
    pub ease_low_precision: bool,
    pub strict: Option<StrictSetting>,
    pub min_required_runs: Option<usize>,
    pub save_individual_runs: bool,
}

impl HistorySettings {
    pub fn resolve(self) -> HistoryConfig {
        HistoryConfig {
            ease_low_precision: self.ease_low_precision,
            strict: self.strict.map(StrictRules::from).unwrap_or_default(),
            min_required_runs: self.min_required_runs.filter(|min| *min > 0),
            save_individual_runs: self.save_individual_runs,
            bench_extras: None,
            run_extras: None,
        }
    }
}
