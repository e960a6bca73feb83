//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, CSV, JSON and rendering errors, and provides semantic
//! variants for the fatal conditions a batch run aborts on. Per-row problems are
//! not errors; they are `RejectReason`s collected in a `SkipReport`.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("QR code error: {0}")]
    Qr(#[from] qrcode::types::QrError),

    #[error("Invalid regular expression: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("Not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("CSV file {} is missing a header row", path.display())]
    MissingHeader { path: PathBuf },

    #[error("CSV file {} is missing required column(s): {}", path.display(), columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    #[error("Unsupported export format for {}. Use a .csv or .md/.markdown extension.", path.display())]
    UnsupportedExport { path: PathBuf },

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Destination '{}' escapes base directory '{}'", destination.display(), base.display())]
    DestinationEscapes { destination: PathBuf, base: PathBuf },

    #[error("External error: {0}")]
    External(String),
}

impl Error {
    pub fn external<E: std::fmt::Display>(e: E) -> Self {
        Error::External(e.to_string())
    }
}
