//! Hours rolled up per ISO week and project.
use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::core::row::Row;
use crate::core::table::SummaryTable;
use crate::core::validate::{
    RejectReason, SkipReport, require_date, require_non_negative, validate_rows,
};
use crate::error::Result;
use crate::io::CsvSource;
use crate::types::HeaderStyle;

pub const UNSPECIFIED_PROJECT: &str = "Unspecified";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimesheetColumns {
    pub date: String,
    pub project: String,
    pub hours: String,
}

impl Default for TimesheetColumns {
    fn default() -> Self {
        Self {
            date: "Date".to_string(),
            project: "Project".to_string(),
            hours: "Hours".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimesheetParams {
    pub csv: PathBuf,
    pub columns: TimesheetColumns,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekTotal {
    /// `YYYY-Www`
    pub iso_week: String,
    pub project: String,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    year: i32,
    week: u32,
    project: String,
    hours: f64,
}

fn parse_entry(row: &Row, columns: &TimesheetColumns) -> std::result::Result<Entry, RejectReason> {
    let date = require_date(row, &columns.date, "date value")?;
    let hours = require_non_negative(row, &columns.hours, "hours value")?;
    let project = row
        .get(&columns.project)
        .unwrap_or(UNSPECIFIED_PROJECT)
        .to_string();
    let week = date.iso_week();
    Ok(Entry {
        year: week.year(),
        week: week.week(),
        project,
        hours,
    })
}

/// Totals sorted by week then project (case-insensitive)
pub fn summarize(rows: &[Row], columns: &TimesheetColumns, report: &mut SkipReport) -> Vec<WeekTotal> {
    let entries = validate_rows(rows, report, |row| parse_entry(row, columns));

    let mut totals: BTreeMap<(i32, u32, String), f64> = BTreeMap::new();
    for entry in entries {
        *totals
            .entry((entry.year, entry.week, entry.project))
            .or_insert(0.0) += entry.hours;
    }

    let mut summary: Vec<WeekTotal> = totals
        .into_iter()
        .map(|((year, week, project), hours)| WeekTotal {
            iso_week: format!("{}-W{:02}", year, week),
            project,
            hours,
        })
        .collect();
    summary.sort_by(|a, b| {
        a.iso_week
            .cmp(&b.iso_week)
            .then_with(|| a.project.to_lowercase().cmp(&b.project.to_lowercase()))
    });
    summary
}

pub fn load_timesheet(params: &TimesheetParams) -> Result<(Vec<WeekTotal>, SkipReport)> {
    let source = CsvSource::open(&params.csv, HeaderStyle::Exact)?;
    let cols = &params.columns;
    source.require_columns([cols.date.as_str(), cols.project.as_str(), cols.hours.as_str()])?;

    let mut report = SkipReport::new();
    let summary = summarize(source.rows(), cols, &mut report);
    Ok((summary, report))
}

pub fn summary_table(rows: &[WeekTotal]) -> SummaryTable {
    let mut table = SummaryTable::new(["ISO Week", "Project/Client", "Total Hours"]);
    for row in rows {
        table.push_row(vec![
            row.iso_week.as_str().into(),
            row.project.as_str().into(),
            format!("{:.2}", row.hours).into(),
        ]);
    }
    table
}
