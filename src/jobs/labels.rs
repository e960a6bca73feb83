//! Pallet labels: one PNG and one PDF per CSV row, QR code plus text blocks.
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::label::{DEFAULT_DPI, Layout, LabelRenderer};
use crate::core::row::Row;
use crate::core::validate::{RejectReason, SkipReport};
use crate::error::Result;
use crate::io::CsvSource;
use crate::io::writers::pdf::write_gray_pdf;
use crate::io::writers::png::write_gray_image;
use crate::types::HeaderStyle;

pub const PALLET_ID_COLUMN: &str = "pallet_id";
/// Older exports name the column `pallet`
pub const LEGACY_PALLET_COLUMN: &str = "pallet";

const FALLBACK_NAME: &str = "label";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelParams {
    pub csv: PathBuf,
    pub output_dir: PathBuf,
    /// JSON layout; the built-in 4x6 layout when unset
    pub template: Option<PathBuf>,
    pub dpi: u32,
}

impl Default for LabelParams {
    fn default() -> Self {
        Self {
            csv: PathBuf::new(),
            output_dir: PathBuf::from("labels"),
            template: None,
            dpi: DEFAULT_DPI,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LabelReport {
    /// Base names (without extension) of every label pair written
    pub generated: Vec<String>,
    pub skipped: SkipReport,
}

/// Replace runs of characters outside `[A-Za-z0-9._-]` with `_`
pub fn sanitise_filename(value: &str) -> Result<String> {
    let unsafe_runs = Regex::new(r"[^A-Za-z0-9._-]+")?;
    let cleaned = unsafe_runs.replace_all(value, "_");
    let cleaned = cleaned.trim_matches('_');
    Ok(if cleaned.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.to_string()
    })
}

/// Trimmed row with `pallet_id` filled from the legacy column when needed
pub fn pallet_row(row: &Row) -> std::result::Result<Row, RejectReason> {
    let row = row.trimmed();
    let id = row
        .get(PALLET_ID_COLUMN)
        .or_else(|| row.get(LEGACY_PALLET_COLUMN))
        .map(str::to_string)
        .ok_or_else(|| RejectReason::Missing {
            field: PALLET_ID_COLUMN.to_string(),
        })?;
    Ok(row.with_field(PALLET_ID_COLUMN, &id))
}

/// Render and write `<base>.png` and `<base>.pdf` for one pallet
pub fn export_label(renderer: &LabelRenderer, row: &Row, output_dir: &Path, dpi: u32) -> Result<String> {
    let pallet_id = row.get(PALLET_ID_COLUMN).unwrap_or(FALLBACK_NAME);
    let base = sanitise_filename(pallet_id)?;
    let image = renderer.render(row, pallet_id)?;

    let png_path = output_dir.join(format!("{}.png", base));
    let pdf_path = output_dir.join(format!("{}.pdf", base));
    write_gray_image(&png_path, &image, Some(dpi))?;
    write_gray_pdf(&pdf_path, &image, dpi)?;
    info!("Generated {}.png and {}.pdf", base, base);
    Ok(base)
}

pub fn generate_labels(params: &LabelParams) -> Result<LabelReport> {
    let layout = Layout::load(params.template.as_deref(), params.dpi)?;
    generate_with(params, &LabelRenderer::new(layout))
}

/// Same as [`generate_labels`] with a caller-supplied renderer
pub fn generate_with(params: &LabelParams, renderer: &LabelRenderer) -> Result<LabelReport> {
    let source = CsvSource::open(&params.csv, HeaderStyle::Lowercase)?;
    source.require_header()?;
    fs::create_dir_all(&params.output_dir)?;

    let mut report = LabelReport::default();
    for row in source.rows() {
        let row = match pallet_row(row) {
            Ok(row) => row,
            Err(reason) => {
                report.skipped.record(row.line(), None, reason);
                continue;
            }
        };
        let base = export_label(renderer, &row, &params.output_dir, params.dpi)?;
        report.generated.push(base);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_collapse_unsafe_runs() {
        assert_eq!(sanitise_filename("PAL 001/ß").unwrap(), "PAL_001");
        assert_eq!(sanitise_filename("a.b-c_d").unwrap(), "a.b-c_d");
        assert_eq!(sanitise_filename("  //  ").unwrap(), "label");
    }

    #[test]
    fn legacy_pallet_column_is_accepted() {
        let row = Row::from_pairs(2, [("pallet", " P-9 "), ("destination", " Dock 4 ")]);
        let row = pallet_row(&row).unwrap();
        assert_eq!(row.get(PALLET_ID_COLUMN), Some("P-9"));
        assert_eq!(row.raw("destination"), Some("Dock 4"));
    }

    #[test]
    fn missing_pallet_id_is_rejected() {
        let row = Row::from_pairs(3, [("pallet_id", "  "), ("destination", "Dock 4")]);
        assert_eq!(
            pallet_row(&row),
            Err(RejectReason::Missing {
                field: "pallet_id".to_string()
            })
        );
    }
}
