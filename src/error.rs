// 🚨 Pipeline Errors - fail fast, one variant per failure class
//
// Inconsistencies between masters are NOT errors: they travel in the
// InconsistencyReport (see reconciliation.rs) and never abort a run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Config file missing/unreadable, unknown company, or a profile that
    /// cannot drive a run (e.g. inventory without supplier fragments)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A required reference file/table is absent
    #[error("reference '{name}' not found at {}", path.display())]
    ReferenceNotFound { name: String, path: PathBuf },

    /// An expected column is absent from loaded tabular data
    #[error("missing field '{field}' in table '{table}'")]
    MissingField { table: String, field: String },

    /// The sales source has no usable rows for period determination
    #[error("empty dataset: {0}")]
    EmptyDataset(String),

    /// The source exists but could not be decoded
    #[error("failed to read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn missing_field(table: &str, field: &str) -> Self {
        PipelineError::MissingField {
            table: table.to_string(),
            field: field.to_string(),
        }
    }

    pub fn read(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        PipelineError::Read {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
