//! Reorder report: items at or below their reorder point, worst first.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::row::Row;
use crate::core::table::{Cell, SummaryTable};
use crate::core::validate::{
    RejectReason, SkipReport, require_non_negative, require_text, validate_rows,
};
use crate::error::Result;
use crate::io::CsvSource;
use crate::types::HeaderStyle;

const ITEM_KEY: &str = "item";
const ON_HAND_KEY: &str = "onhand";
const REORDER_POINT_KEY: &str = "reorderpoint";

pub const REQUIRED_COLUMNS: [&str; 3] = [ITEM_KEY, ON_HAND_KEY, REORDER_POINT_KEY];

const PLACEHOLDER: &str = "—";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReorderParams {
    pub csv: PathBuf,
    /// Case-insensitive; empty means no vendor filter
    pub vendors: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRecord {
    pub item: String,
    pub on_hand: f64,
    pub reorder_point: f64,
    pub vendor: Option<String>,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
}

impl InventoryRecord {
    pub fn shortage(&self) -> f64 {
        (self.reorder_point - self.on_hand).max(0.0)
    }

    /// Shortage relative to the reorder point; infinite when the point is zero
    pub fn severity(&self) -> f64 {
        let shortage = self.shortage();
        if shortage <= 0.0 {
            0.0
        } else if self.reorder_point == 0.0 {
            f64::INFINITY
        } else {
            shortage / self.reorder_point
        }
    }
}

fn parse_record(row: &Row) -> std::result::Result<InventoryRecord, RejectReason> {
    let item = require_text(row, ITEM_KEY, "item identifier")?;
    let on_hand = require_non_negative(row, ON_HAND_KEY, "on hand value")?;
    let reorder_point = require_non_negative(row, REORDER_POINT_KEY, "reorder point value")?;
    let optional = |key: &str| row.get(key).map(str::to_string);
    Ok(InventoryRecord {
        item,
        on_hand,
        reorder_point,
        vendor: optional("vendor"),
        category: optional("category"),
        sku: optional("sku"),
        description: optional("description"),
    })
}

pub fn load_inventory(params: &ReorderParams) -> Result<(Vec<InventoryRecord>, SkipReport)> {
    let source = CsvSource::open(&params.csv, HeaderStyle::Compact)?;
    source.require_columns(REQUIRED_COLUMNS)?;
    let mut report = SkipReport::new();
    let records = validate_rows(source.rows(), &mut report, parse_record);
    Ok((records, report))
}

/// Keep records whose vendor/category is in the (case-insensitive) filter lists
pub fn filter_records(
    records: Vec<InventoryRecord>,
    vendors: &[String],
    categories: &[String],
) -> Vec<InventoryRecord> {
    let lowered = |values: &[String]| -> Vec<String> {
        values
            .iter()
            .filter(|v| !v.is_empty())
            .map(|v| v.to_lowercase())
            .collect()
    };
    let vendors = lowered(vendors);
    let categories = lowered(categories);
    let passes = |filter: &[String], value: &Option<String>| {
        filter.is_empty()
            || value
                .as_ref()
                .is_some_and(|v| filter.contains(&v.to_lowercase()))
    };

    records
        .into_iter()
        .filter(|r| passes(&vendors, &r.vendor) && passes(&categories, &r.category))
        .collect()
}

/// Records with a shortage, by severity desc, shortage desc, item asc
pub fn build_summary(records: Vec<InventoryRecord>) -> Vec<InventoryRecord> {
    let mut rows: Vec<InventoryRecord> = records.into_iter().filter(|r| r.shortage() > 0.0).collect();
    rows.sort_by(|a, b| {
        b.severity()
            .total_cmp(&a.severity())
            .then_with(|| b.shortage().total_cmp(&a.shortage()))
            .then_with(|| a.item.to_lowercase().cmp(&b.item.to_lowercase()))
    });
    rows
}

/// Whole numbers print without decimals, anything else with two
pub fn format_quantity(value: f64) -> String {
    if (value - value.round()).abs() < 1e-6 {
        format!("{:.0}", value.round())
    } else {
        format!("{:.2}", value)
    }
}

fn severity_cell(severity: f64) -> Cell {
    if severity.is_infinite() {
        Cell::with_machine("∞", "inf")
    } else {
        Cell::with_machine(
            format!("{:.0}%", severity * 100.0),
            format!("{:.4}", severity),
        )
    }
}

pub fn summary_table(rows: &[InventoryRecord]) -> SummaryTable {
    let mut table = SummaryTable::new([
        "Item",
        "Vendor",
        "Category",
        "On Hand",
        "Reorder Point",
        "Shortage",
        "Severity",
    ]);
    for r in rows {
        table.push_row(vec![
            r.item.as_str().into(),
            r.vendor.as_deref().unwrap_or(PLACEHOLDER).into(),
            r.category.as_deref().unwrap_or(PLACEHOLDER).into(),
            format_quantity(r.on_hand).into(),
            format_quantity(r.reorder_point).into(),
            format_quantity(r.shortage()).into(),
            severity_cell(r.severity()),
        ]);
    }
    table
}

/// Load, filter and rank in one call
pub fn reorder_report(params: &ReorderParams) -> Result<(Vec<InventoryRecord>, SkipReport)> {
    let (records, report) = load_inventory(params)?;
    let filtered = filter_records(records, &params.vendors, &params.categories);
    Ok((build_summary(filtered), report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(item: &str, on_hand: f64, reorder_point: f64, vendor: Option<&str>) -> InventoryRecord {
        InventoryRecord {
            item: item.to_string(),
            on_hand,
            reorder_point,
            vendor: vendor.map(str::to_string),
            category: None,
            sku: None,
            description: None,
        }
    }

    #[test]
    fn shortage_and_severity() {
        let r = record("bolt", 2.0, 10.0, None);
        assert_eq!(r.shortage(), 8.0);
        assert!((r.severity() - 0.8).abs() < 1e-9);
        assert_eq!(record("nut", 12.0, 10.0, None).severity(), 0.0);
    }

    #[test]
    fn summary_orders_by_severity_then_shortage_then_name() {
        let rows = build_summary(vec![
            record("washer", 5.0, 10.0, None), // 50%, 5
            record("Bolt", 0.0, 4.0, None),     // 100%, 4
            record("anchor", 10.0, 20.0, None), // 50%, 10
            record("spring", 20.0, 10.0, None), // no shortage
            record("axle", 0.0, 4.0, None),     // 100%, 4
        ]);
        let names: Vec<&str> = rows.iter().map(|r| r.item.as_str()).collect();
        assert_eq!(names, vec!["axle", "Bolt", "anchor", "washer"]);
    }

    #[test]
    fn vendor_filter_is_case_insensitive_and_drops_unknown() {
        let filtered = filter_records(
            vec![
                record("a", 0.0, 1.0, Some("ACME")),
                record("b", 0.0, 1.0, Some("Globex")),
                record("c", 0.0, 1.0, None),
            ],
            &["acme".to_string()],
            &[],
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].item, "a");
    }

    #[test]
    fn quantities_format_compactly() {
        assert_eq!(format_quantity(3.0), "3");
        assert_eq!(format_quantity(2.9999999), "3");
        assert_eq!(format_quantity(2.5), "2.50");
        assert_eq!(format_quantity(1e19), "10000000000000000000");
    }

    #[test]
    fn table_and_csv_show_severity_differently() {
        let table = summary_table(&[record("bolt", 6.0, 10.0, None)]);
        let cells = &table.rows()[0];
        assert_eq!(cells[1].text, "—");
        assert_eq!(cells[6].text, "40%");
        assert_eq!(cells[6].csv_value(), "0.4000");
    }

    #[test]
    fn rows_are_validated_with_compact_headers() {
        let rows = vec![
            Row::from_pairs(2, [("item", "bolt"), ("onhand", "1"), ("reorderpoint", "5")]),
            Row::from_pairs(3, [("item", ""), ("onhand", "1"), ("reorderpoint", "5")]),
            Row::from_pairs(4, [("item", "nut"), ("onhand", "-2"), ("reorderpoint", "5")]),
        ];
        let mut report = SkipReport::new();
        let records = validate_rows(&rows, &mut report, parse_record);
        assert_eq!(records.len(), 1);
        assert_eq!(report.messages()[0], "Row 3: missing item identifier");
        assert_eq!(report.len(), 2);
    }
}
