use std::path::PathBuf;

use thiserror::Error;

/// Failure to produce a [`Dataset`](super::model::Dataset) from a source file.
///
/// All variants are fatal to startup: no partial dashboard is shown.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid JSON layout: {0}")]
    JsonLayout(String),

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("workbook contains no sheets")]
    EmptyWorkbook,

    #[error("none of the known sales columns were found (headers: {0:?})")]
    NoKnownColumns(Vec<String>),

    #[error(transparent)]
    MissingColumn(#[from] MissingColumnError),
}

/// A required column is absent and cannot be derived.
///
/// Dimension columns never produce this error (their filter and chart are
/// omitted instead); only Revenue does.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("missing required column '{column}' (accepted headers: {})", .accepted.join(", "))]
pub struct MissingColumnError {
    pub column: &'static str,
    pub accepted: Vec<&'static str>,
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
