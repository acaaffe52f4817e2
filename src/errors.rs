use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HistoryError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistoryError {
    #[error("names must be unique to be stored, colliding names: [{}]", .names.join(", "))]
    DuplicateName { names: Vec<String> },
    #[error(
        "minimum required runs ({min}) not met by benchmarks: [{}]",
        format_offenders(.offenders)
    )]
    InsufficientRuns {
        min: usize,
        offenders: Vec<(String, usize)>,
    },
    #[error(
        "results look like they were measured without high resolution timing: [{}]",
        .names.join(", ")
    )]
    LowPrecisionTiming { names: Vec<String> },
    #[error("strict mode violations while adding results:\n{}", format_violations(.violations))]
    StrictModeViolation { violations: Vec<StrictViolation> },
    #[error("no extra named \"{key}\" computed for benchmark \"{benchmark}\"")]
    UnknownExtraKey { key: String, benchmark: String },
    #[error("value selected by key \"{key}\" must be a number")]
    NonNumericDelta { key: String },
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl HistoryError {
    pub fn unknown_extra_key<K: Into<String>, B: Into<String>>(key: K, benchmark: B) -> Self {
        HistoryError::UnknownExtraKey {
            key: key.into(),
            benchmark: benchmark.into(),
        }
    }

    pub fn non_numeric<K: Into<String>>(key: K) -> Self {
        HistoryError::NonNumericDelta { key: key.into() }
    }

    pub fn invalid_date<T: Into<String>>(msg: T) -> Self {
        HistoryError::InvalidDate(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        HistoryError::Serialization(msg.into())
    }
}

/// One broken strict-mode rule. Reported in bulk by
/// [`HistoryError::StrictModeViolation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrictViolation {
    Removed {
        name: String,
    },
    RunsCountChanged {
        name: String,
        current: usize,
        previous: usize,
    },
    Added {
        names: Vec<String>,
    },
}

impl fmt::Display for StrictViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrictViolation::Removed { name } => write!(
                f,
                "missing benchmark \"{name}\" in current results (strict.no_removal)"
            ),
            StrictViolation::RunsCountChanged {
                name,
                current,
                previous,
            } => write!(
                f,
                "runs count of benchmark \"{name}\" ({current}) doesn't match the previous runs count ({previous}) (strict.no_runs_count_change)"
            ),
            StrictViolation::Added { names } => write!(
                f,
                "adding new benchmarks is not allowed after the initial set: [{}] (strict.no_addition)",
                names.join(", ")
            ),
        }
    }
}

fn format_offenders(offenders: &[(String, usize)]) -> String {
    offenders
        .iter()
        .map(|(name, runs)| format!("\"{name}\" ({runs})"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_violations(violations: &[StrictViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
