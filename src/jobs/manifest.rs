//! Expected-vs-scanned shipment reconciliation per (order, SKU).
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::row::Row;
use crate::core::table::{Cell, SummaryTable};
use crate::core::validate::{RejectReason, SkipReport, require_count, require_text};
use crate::error::Result;
use crate::io::CsvSource;
use crate::io::writers::export::write_table;
use crate::types::{ExportFormat, HeaderStyle};

pub const REQUIRED_COLUMNS: [&str; 3] = ["order_id", "sku", "quantity"];

pub type ManifestKey = (String, String);
pub type ManifestCounts = BTreeMap<ManifestKey, u64>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileParams {
    pub expected: PathBuf,
    pub scanned: PathBuf,
    /// CSV destination; a Markdown copy is written next to it
    pub export: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationRow {
    pub order_id: String,
    pub sku: String,
    pub expected: u64,
    pub scanned: u64,
    pub matched: u64,
    pub short: u64,
    pub overage: u64,
}

impl ReconciliationRow {
    pub fn from_counts(key: &ManifestKey, expected: u64, scanned: u64) -> Self {
        Self {
            order_id: key.0.clone(),
            sku: key.1.clone(),
            expected,
            scanned,
            matched: expected.min(scanned),
            short: expected.saturating_sub(scanned),
            overage: scanned.saturating_sub(expected),
        }
    }

    pub fn is_discrepancy(&self) -> bool {
        self.short > 0 || self.overage > 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub rows: Vec<ReconciliationRow>,
    pub expected_skipped: SkipReport,
    pub scanned_skipped: SkipReport,
}

impl Reconciliation {
    pub fn has_discrepancy(&self) -> bool {
        has_discrepancy(&self.rows)
    }
}

fn parse_line(row: &Row) -> std::result::Result<(ManifestKey, u64), RejectReason> {
    let order_id = require_text(row, "order_id", "order_id")?;
    let sku = require_text(row, "sku", "sku")?;
    let quantity = require_count(row, "quantity", "quantity")?;
    Ok(((order_id, sku), quantity))
}

/// Sum quantities per (order_id, sku) over the valid rows; a row that would
/// overflow its running total is rejected
pub fn aggregate(rows: &[Row], report: &mut SkipReport) -> ManifestCounts {
    let mut counts = ManifestCounts::new();
    for row in rows {
        let (key, quantity) = match parse_line(row) {
            Ok(parsed) => parsed,
            Err(reason) => {
                report.record(row.line(), None, reason);
                continue;
            }
        };
        let total = counts.entry(key).or_insert(0);
        match total.checked_add(quantity) {
            Some(sum) => *total = sum,
            None => report.record(
                row.line(),
                None,
                RejectReason::OutOfRange {
                    field: "quantity".to_string(),
                    value: quantity.to_string(),
                    constraint: "running total exceeds the largest supported quantity",
                },
            ),
        }
    }
    counts
}

pub fn load_manifest(path: &Path) -> Result<(ManifestCounts, SkipReport)> {
    let source = CsvSource::open(path, HeaderStyle::Exact)?;
    source.require_columns(REQUIRED_COLUMNS)?;
    let mut report = SkipReport::new();
    let counts = aggregate(source.rows(), &mut report);
    Ok((counts, report))
}

/// One row per key in the sorted union of both manifests
pub fn reconcile(expected: &ManifestCounts, scanned: &ManifestCounts) -> Vec<ReconciliationRow> {
    let keys: BTreeSet<&ManifestKey> = expected.keys().chain(scanned.keys()).collect();
    keys.into_iter()
        .map(|key| {
            ReconciliationRow::from_counts(
                key,
                expected.get(key).copied().unwrap_or(0),
                scanned.get(key).copied().unwrap_or(0),
            )
        })
        .collect()
}

pub fn has_discrepancy(rows: &[ReconciliationRow]) -> bool {
    rows.iter().any(ReconciliationRow::is_discrepancy)
}

pub fn reconcile_files(params: &ReconcileParams) -> Result<Reconciliation> {
    let (expected, expected_skipped) = load_manifest(&params.expected)?;
    let (scanned, scanned_skipped) = load_manifest(&params.scanned)?;
    Ok(Reconciliation {
        rows: reconcile(&expected, &scanned),
        expected_skipped,
        scanned_skipped,
    })
}

pub const DISPLAY_HEADERS: [&str; 7] = [
    "Order ID", "SKU", "Expected", "Scanned", "Matched", "Short", "Overage",
];

/// Column names used in the CSV export
pub const CSV_HEADERS: [&str; 7] = [
    "order_id", "sku", "expected", "scanned", "matched", "short", "overage",
];

fn build_table(rows: &[ReconciliationRow], headers: [&str; 7]) -> SummaryTable {
    let mut table = SummaryTable::new(headers);
    for r in rows {
        table.push_row(vec![
            r.order_id.as_str().into(),
            r.sku.as_str().into(),
            r.expected.to_string().into(),
            r.scanned.to_string().into(),
            r.matched.to_string().into(),
            r.short.to_string().into(),
            r.overage.to_string().into(),
        ]);
    }
    // Saturates instead of wrapping on absurd totals
    let total = |f: fn(&ReconciliationRow) -> u64| -> Cell {
        rows.iter()
            .map(f)
            .fold(0u64, u64::saturating_add)
            .to_string()
            .into()
    };
    table.set_footer(vec![
        "TOTAL".into(),
        "".into(),
        total(|r| r.expected),
        total(|r| r.scanned),
        total(|r| r.matched),
        total(|r| r.short),
        total(|r| r.overage),
    ]);
    table
}

pub fn summary_table(rows: &[ReconciliationRow]) -> SummaryTable {
    build_table(rows, DISPLAY_HEADERS)
}

/// CSV (snake_case headers) at `path` plus Markdown beside it; returns the Markdown path
pub fn export_results(path: &Path, rows: &[ReconciliationRow]) -> Result<PathBuf> {
    write_table(path, &build_table(rows, CSV_HEADERS), ExportFormat::Csv)?;
    let markdown = path.with_extension("md");
    write_table(&markdown, &build_table(rows, DISPLAY_HEADERS), ExportFormat::Markdown)?;
    Ok(markdown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(entries: &[(&str, &str, u64)]) -> ManifestCounts {
        entries
            .iter()
            .map(|(o, s, q)| ((o.to_string(), s.to_string()), *q))
            .collect()
    }

    #[test]
    fn reconciliation_splits_matched_short_and_overage() {
        let expected = counts(&[("A1", "X", 5), ("A1", "Y", 2)]);
        let scanned = counts(&[("A1", "X", 3), ("B2", "Z", 1)]);
        let rows = reconcile(&expected, &scanned);

        assert_eq!(rows.len(), 3);
        assert_eq!((rows[0].matched, rows[0].short, rows[0].overage), (3, 2, 0));
        assert_eq!((rows[1].sku.as_str(), rows[1].short), ("Y", 2));
        assert_eq!((rows[2].order_id.as_str(), rows[2].overage), ("B2", 1));
        assert!(has_discrepancy(&rows));
    }

    #[test]
    fn duplicate_lines_are_summed_and_bad_lines_skipped() {
        let rows = vec![
            Row::from_pairs(2, [("order_id", "A1"), ("sku", "X"), ("quantity", "2")]),
            Row::from_pairs(3, [("order_id", "A1"), ("sku", "X"), ("quantity", "3")]),
            Row::from_pairs(4, [("order_id", "A1"), ("sku", "X"), ("quantity", "-1")]),
            Row::from_pairs(5, [("order_id", ""), ("sku", "X"), ("quantity", "1")]),
            Row::from_pairs(6, [("order_id", "A1"), ("sku", "X"), ("quantity", "1.5")]),
        ];
        let mut report = SkipReport::new();
        let counts = aggregate(&rows, &mut report);
        assert_eq!(counts.get(&("A1".to_string(), "X".to_string())), Some(&5));
        assert_eq!(report.len(), 3);
    }

    #[test]
    fn overflowing_totals_reject_the_row_instead_of_panicking() {
        let max = u64::MAX.to_string();
        let rows = vec![
            Row::from_pairs(2, [("order_id", "A"), ("sku", "X"), ("quantity", "9223372036854775807")]),
            Row::from_pairs(3, [("order_id", "A"), ("sku", "X"), ("quantity", "9223372036854775807")]),
            Row::from_pairs(4, [("order_id", "A"), ("sku", "X"), ("quantity", "9223372036854775807")]),
        ];
        let mut report = SkipReport::new();
        let totals = aggregate(&rows, &mut report);
        assert_eq!(
            totals.get(&("A".to_string(), "X".to_string())),
            Some(&(2 * 9_223_372_036_854_775_807u64))
        );
        assert_eq!(report.len(), 1);
        assert_eq!(report.iter().next().unwrap().line, 4);

        let huge = counts(&[("A", "X", u64::MAX), ("B", "Y", 5)]);
        let table = summary_table(&reconcile(&huge, &huge));
        assert_eq!(table.footer().unwrap()[2].text, max);
    }

    #[test]
    fn csv_export_uses_snake_case_headers() {
        let dir = tempfile::tempdir().unwrap();
        let rows = reconcile(&counts(&[("A1", "X", 2)]), &counts(&[("A1", "X", 1)]));
        let csv_path = dir.path().join("recon.csv");
        let md_path = export_results(&csv_path, &rows).unwrap();
        let csv_text = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(
            csv_text.lines().next().unwrap(),
            "order_id,sku,expected,scanned,matched,short,overage"
        );
        let md_text = std::fs::read_to_string(md_path).unwrap();
        assert!(md_text.starts_with("| Order ID | SKU |"));
    }

    #[test]
    fn matching_manifests_have_no_discrepancy() {
        let both = counts(&[("A1", "X", 4)]);
        let rows = reconcile(&both, &both);
        assert!(!has_discrepancy(&rows));
        let table = summary_table(&rows);
        let footer = table.footer().unwrap();
        assert_eq!(footer[0].text, "TOTAL");
        assert_eq!(footer[4].text, "4");
    }
}
