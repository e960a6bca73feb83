//! Shared types and enums used across batchkit.
//! Includes `ExportFormat`, `ErrorCorrection` and `HeaderStyle`.
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Summary export formats, selected by file extension
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
    Markdown,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            _ => Err(Error::UnsupportedExport {
                path: path.to_path_buf(),
            }),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "CSV"),
            ExportFormat::Markdown => write!(f, "Markdown"),
        }
    }
}

/// QR error-correction level
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum ErrorCorrection {
    L,
    M,
    Q,
    H,
}

impl From<ErrorCorrection> for qrcode::EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => qrcode::EcLevel::L,
            ErrorCorrection::M => qrcode::EcLevel::M,
            ErrorCorrection::Q => qrcode::EcLevel::Q,
            ErrorCorrection::H => qrcode::EcLevel::H,
        }
    }
}

impl std::fmt::Display for ErrorCorrection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCorrection::L => "L",
            ErrorCorrection::M => "M",
            ErrorCorrection::Q => "Q",
            ErrorCorrection::H => "H",
        };
        write!(f, "{}", s)
    }
}

/// How CSV header names are normalized before rows are keyed by them
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum HeaderStyle {
    /// Keep names exactly as written
    #[default]
    Exact,
    /// Trim and lower-case
    Lowercase,
    /// Trim, lower-case, and drop spaces and underscores (`On Hand` -> `onhand`)
    Compact,
}

impl HeaderStyle {
    pub fn normalize(&self, header: &str) -> String {
        let header = header.trim_start_matches('\u{feff}');
        match self {
            HeaderStyle::Exact => header.to_string(),
            HeaderStyle::Lowercase => header.trim().to_lowercase(),
            HeaderStyle::Compact => header
                .trim()
                .to_lowercase()
                .chars()
                .filter(|c| *c != ' ' && *c != '_')
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_format_follows_extension() {
        assert_eq!(
            ExportFormat::from_path(Path::new("out/report.CSV")).unwrap(),
            ExportFormat::Csv
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("report.markdown")).unwrap(),
            ExportFormat::Markdown
        );
        assert!(matches!(
            ExportFormat::from_path(Path::new("report.xlsx")),
            Err(Error::UnsupportedExport { .. })
        ));
    }

    #[test]
    fn compact_headers_collapse_spacing_variants() {
        for raw in ["On Hand", "on_hand", " OnHand ", "\u{feff}On Hand"] {
            assert_eq!(HeaderStyle::Compact.normalize(raw), "onhand");
        }
        assert_eq!(HeaderStyle::Lowercase.normalize(" Pallet_ID "), "pallet_id");
        assert_eq!(HeaderStyle::Exact.normalize("Date"), "Date");
    }
}
