//! One rendered text file per CSV row.
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::template::Template;
use crate::core::validate::{RejectReason, SkipReport, missing_fields};
use crate::error::{Error, Result};
use crate::io::CsvSource;
use crate::types::HeaderStyle;

pub const UNIQUE_ID_COLUMN: &str = "id";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeParams {
    pub csv: PathBuf,
    pub template: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    pub generated: Vec<PathBuf>,
    pub skipped: SkipReport,
}

/// `<id>.txt` with anything but alphanumerics, `-` and `_` replaced by `_`
pub fn sanitized_filename(identifier: &str) -> Option<String> {
    let id = identifier.trim();
    if id.is_empty() {
        return None;
    }
    let safe: String = id
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    Some(format!("{}.txt", safe))
}

pub fn load_template(path: &Path) -> Result<Template> {
    if !path.is_file() {
        return Err(Error::NotFound {
            path: path.to_path_buf(),
        });
    }
    Template::parse(&fs::read_to_string(path)?)
}

pub fn run_mail_merge(params: &MergeParams) -> Result<MergeReport> {
    let template = load_template(&params.template)?;
    let mut required = template.fields();
    required.insert(UNIQUE_ID_COLUMN.to_string());

    fs::create_dir_all(&params.output_dir)?;

    let source = CsvSource::open(&params.csv, HeaderStyle::Exact)?;
    source.require_columns(required.iter().map(String::as_str))?;

    let mut report = MergeReport::default();
    let mut written: HashSet<PathBuf> = HashSet::new();

    for row in source.rows() {
        let Some(identifier) = row.get(UNIQUE_ID_COLUMN) else {
            report.skipped.record(
                row.line(),
                Some(format!("<row {}>", row.line())),
                RejectReason::Missing {
                    field: UNIQUE_ID_COLUMN.to_string(),
                },
            );
            continue;
        };

        let missing = missing_fields(row, required.iter().map(String::as_str));
        if !missing.is_empty() {
            report.skipped.record(
                row.line(),
                Some(identifier.to_string()),
                RejectReason::MissingFields { fields: missing },
            );
            continue;
        }

        let content = match template.render(|field| row.raw(field)) {
            Ok(content) => content,
            Err(field) => {
                report.skipped.record(
                    row.line(),
                    Some(identifier.to_string()),
                    RejectReason::Missing { field },
                );
                continue;
            }
        };

        let Some(filename) = sanitized_filename(identifier) else {
            report.skipped.record(
                row.line(),
                Some(identifier.to_string()),
                RejectReason::Missing {
                    field: UNIQUE_ID_COLUMN.to_string(),
                },
            );
            continue;
        };
        let output_path = params.output_dir.join(filename);
        if !written.insert(output_path.clone()) {
            warn!(
                "Row {}: {:?} was already written this run; overwriting",
                row.line(),
                output_path
            );
        }
        fs::write(&output_path, content)?;
        info!("Wrote {:?}", output_path);
        report.generated.push(output_path);
    }

    Ok(report)
}
