use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HydroError>;

#[derive(Error, Debug)]
pub enum HydroError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Frame error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Required input column missing or of the wrong kind.
    #[error("Schema error: column '{column}' {reason}")]
    SchemaError { column: String, reason: String },

    /// Column cannot be classified as numeric or categorical.
    #[error("Malformed column '{column}': {reason}")]
    MalformedColumn { column: String, reason: String },

    #[error("Invalid domain at row {row}, column '{column}': {formula} takes the square root of {value}")]
    InvalidDomain {
        row: usize,
        column: String,
        formula: String,
        value: f64,
    },

    #[error("Non-finite result at row {row}, column '{column}': {formula} gave {value}")]
    NonFinite {
        row: usize,
        column: String,
        formula: String,
        value: f64,
    },

    /// `row` is `None` for column-wide ratios such as the median normalization.
    #[error("Division by zero{} in column '{column}': denominator {denominator} is 0", RowSuffix(.row))]
    DivisionByZero {
        row: Option<usize>,
        column: String,
        denominator: String,
    },

    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("Column '{column}' has {found} rows, table has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid constant {name} = {value}: must be positive and finite")]
    InvalidConstant { name: &'static str, value: f64 },

    #[error("Derivation failed on {} row(s):\n{}", .0.len(), FailureList(.0))]
    Derivation(Vec<HydroError>),
}

impl HydroError {
    /// Row index of a row-level failure.
    pub fn row(&self) -> Option<usize> {
        match self {
            HydroError::InvalidDomain { row, .. } | HydroError::NonFinite { row, .. } => Some(*row),
            HydroError::DivisionByZero { row, .. } => *row,
            _ => None,
        }
    }

    /// Column whose computation or classification failed.
    pub fn column(&self) -> Option<&str> {
        match self {
            HydroError::SchemaError { column, .. }
            | HydroError::MalformedColumn { column, .. }
            | HydroError::InvalidDomain { column, .. }
            | HydroError::NonFinite { column, .. }
            | HydroError::DivisionByZero { column, .. }
            | HydroError::LengthMismatch { column, .. }
            | HydroError::DuplicateColumn(column) => Some(column.as_str()),
            _ => None,
        }
    }
}

struct RowSuffix<'a>(&'a Option<usize>);

impl fmt::Display for RowSuffix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(row) => write!(f, " at row {}", row),
            None => Ok(()),
        }
    }
}

struct FailureList<'a>(&'a [HydroError]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {}", failure)?;
        }
        Ok(())
    }
}
