use thiserror::Error;

/// Fatal conditions that stop an uplift computation before any output is
/// produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("required column `{0}` not found")]
    MissingColumn(String),

    #[error("no month revenue columns could be resolved from the headers")]
    NoMonthColumns,

    #[error("more than one revenue column resolves to month `{0}`")]
    DuplicateMonth(String),

    #[error("column `{column}` is required for {purpose}")]
    RateColumnRequired {
        column: String,
        purpose: &'static str,
    },

    #[error("month `{month}` has no {kind} column, required for revenue recomputation")]
    MonthDataRequired { month: String, kind: &'static str },

    #[error("effective month index {index} is out of range ({months} months resolved)")]
    EffectiveMonthOutOfRange { index: usize, months: usize },

    #[error("unknown month `{0}`")]
    UnknownMonth(String),

    #[error("invalid uplift value {value} for {mode} uplift")]
    InvalidUplift { mode: &'static str, value: f64 },

    #[error("row {row}: column `{column}` has invalid value `{value}`")]
    InvalidCell {
        row: usize,
        column: String,
        value: String,
    },

    #[error("month sequences differ between partitions")]
    MonthMismatch,

    #[error("row {0} appears more than once across partitions")]
    DuplicateRow(usize),

    #[error("reconciled dataset has {actual} rows, expected {expected}")]
    CardinalityMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Failures of the CSV loading adapter.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("file has no header row")]
    EmptyFile,
}
