use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Column not found in dataset: '{0}'")]
    MissingColumn(String),

    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("No dataset columns start with prefix '{0}'")]
    NoColumnsWithPrefix(String),

    #[error("Cannot describe an empty column selection")]
    EmptySelection,
}

pub type Result<T> = std::result::Result<T, DatasetError>;
