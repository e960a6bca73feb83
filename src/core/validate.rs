//! Per-row validation with skip-and-report semantics.
//!
//! Each job turns a `Row` into its own record type through a function returning
//! `Result<Record, RejectReason>`, built from the `require_*` helpers below.
//! `validate_rows` drives that function over a batch: accepted records come back
//! in input order and every rejection lands in the `SkipReport`, so each row is
//! accounted for exactly once. Rejections never abort a batch.
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::core::row::Row;

/// Fallback date formats, tried in order after the ISO forms
pub const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%m-%d-%Y",
];

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Why a row was left out of the output
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    Missing {
        field: String,
    },
    MissingFields {
        fields: Vec<String>,
    },
    WrongType {
        field: String,
        value: String,
        expected: &'static str,
    },
    OutOfRange {
        field: String,
        value: String,
        constraint: &'static str,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Missing { field } => write!(f, "missing {}", field),
            RejectReason::MissingFields { fields } => write!(f, "missing {}", fields.join(", ")),
            RejectReason::WrongType {
                field,
                value,
                expected,
            } => write!(f, "invalid {} '{}' (expected {})", field, value, expected),
            RejectReason::OutOfRange {
                field,
                value,
                constraint,
            } => write!(f, "{} '{}' out of range ({})", field, value, constraint),
        }
    }
}

/// One skipped row
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub line: usize,
    /// Row identifier when one was available (e.g. the merge `id`)
    pub key: Option<String>,
    pub reason: RejectReason,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "Row {} ({}): {}", self.line, key, self.reason),
            None => write!(f, "Row {}: {}", self.line, self.reason),
        }
    }
}

/// Rejections accumulated over one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkipReport {
    rejections: Vec<Rejection>,
}

impl SkipReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, line: usize, key: Option<String>, reason: RejectReason) {
        let rejection = Rejection { line, key, reason };
        warn!("Skipping {}", rejection);
        self.rejections.push(rejection);
    }

    pub fn extend(&mut self, other: SkipReport) {
        self.rejections.extend(other.rejections);
    }

    pub fn len(&self) -> usize {
        self.rejections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rejections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rejection> {
        self.rejections.iter()
    }

    /// One line per rejection, ready for stderr
    pub fn messages(&self) -> Vec<String> {
        self.rejections.iter().map(ToString::to_string).collect()
    }
}

/// Apply `parse` to every row; keep the successes, report the failures
pub fn validate_rows<'a, T, I, F>(rows: I, report: &mut SkipReport, mut parse: F) -> Vec<T>
where
    I: IntoIterator<Item = &'a Row>,
    F: FnMut(&Row) -> Result<T, RejectReason>,
{
    let mut accepted = Vec::new();
    for row in rows {
        match parse(row) {
            Ok(record) => accepted.push(record),
            Err(reason) => report.record(row.line(), None, reason),
        }
    }
    accepted
}

pub fn require_text(row: &Row, column: &str, label: &str) -> Result<String, RejectReason> {
    row.get(column)
        .map(str::to_string)
        .ok_or_else(|| RejectReason::Missing {
            field: label.to_string(),
        })
}

/// Finite number `>= 0`
pub fn require_non_negative(row: &Row, column: &str, label: &str) -> Result<f64, RejectReason> {
    let raw = require_text(row, column, label)?;
    let value: f64 = raw.parse().map_err(|_| RejectReason::WrongType {
        field: label.to_string(),
        value: raw.clone(),
        expected: "a number",
    })?;
    if !value.is_finite() {
        return Err(RejectReason::WrongType {
            field: label.to_string(),
            value: raw,
            expected: "a finite number",
        });
    }
    if value < 0.0 {
        return Err(RejectReason::OutOfRange {
            field: label.to_string(),
            value: raw,
            constraint: "must not be negative",
        });
    }
    Ok(value)
}

/// Whole number `>= 0`
pub fn require_count(row: &Row, column: &str, label: &str) -> Result<u64, RejectReason> {
    let raw = require_text(row, column, label)?;
    let value: i64 = raw.parse().map_err(|_| RejectReason::WrongType {
        field: label.to_string(),
        value: raw.clone(),
        expected: "an integer",
    })?;
    u64::try_from(value).map_err(|_| RejectReason::OutOfRange {
        field: label.to_string(),
        value: raw,
        constraint: "must not be negative",
    })
}

pub fn require_date(row: &Row, column: &str, label: &str) -> Result<NaiveDate, RejectReason> {
    let raw = require_text(row, column, label)?;
    parse_date(&raw).ok_or_else(|| RejectReason::WrongType {
        field: label.to_string(),
        value: raw,
        expected: "a supported date format",
    })
}

/// ISO date, ISO datetime, then `DATE_FORMATS`; first match wins
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    for fmt in ISO_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Every column in `required` whose value is blank or absent, sorted
pub fn missing_fields<'a, I>(row: &Row, required: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut missing: Vec<String> = required
        .into_iter()
        .filter(|c| row.get(c).is_none())
        .map(str::to_string)
        .collect();
    missing.sort();
    missing.dedup();
    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        Row::from_pairs(7, pairs.iter().copied())
    }

    #[test]
    fn numbers_must_be_present_numeric_and_non_negative() {
        let r = row(&[("qty", "2.5"), ("neg", "-1"), ("bad", "abc"), ("blank", " ")]);
        assert_eq!(require_non_negative(&r, "qty", "qty"), Ok(2.5));
        assert!(matches!(
            require_non_negative(&r, "neg", "qty"),
            Err(RejectReason::OutOfRange { .. })
        ));
        assert!(matches!(
            require_non_negative(&r, "bad", "qty"),
            Err(RejectReason::WrongType { .. })
        ));
        assert!(matches!(
            require_non_negative(&r, "blank", "qty"),
            Err(RejectReason::Missing { .. })
        ));
        assert!(matches!(
            require_non_negative(&row(&[("qty", "NaN")]), "qty", "qty"),
            Err(RejectReason::WrongType { .. })
        ));
    }

    #[test]
    fn counts_reject_fractions_and_negatives() {
        let r = row(&[("a", "12"), ("b", "1.5"), ("c", "-3")]);
        assert_eq!(require_count(&r, "a", "quantity"), Ok(12));
        assert!(matches!(
            require_count(&r, "b", "quantity"),
            Err(RejectReason::WrongType { .. })
        ));
        assert!(matches!(
            require_count(&r, "c", "quantity"),
            Err(RejectReason::OutOfRange { .. })
        ));
    }

    #[test]
    fn dates_accept_iso_and_fallback_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        for raw in [
            "2024-03-15",
            "2024-03-15T08:30:00",
            "2024-03-15 08:30",
            "2024-03-15T08:30:00+02:00",
            "2024/03/15",
            "15/03/2024",
            "03/15/2024",
            "15-03-2024",
        ] {
            assert_eq!(parse_date(raw), Some(expected), "{raw}");
        }
        assert_eq!(parse_date("next tuesday"), None);
    }

    #[test]
    fn day_first_wins_when_ambiguous() {
        assert_eq!(
            parse_date("04/05/2024"),
            NaiveDate::from_ymd_opt(2024, 5, 4)
        );
    }

    #[test]
    fn validate_rows_accounts_for_every_row_once() {
        let rows = vec![
            Row::from_pairs(2, [("n", "1")]),
            Row::from_pairs(3, [("n", "x")]),
            Row::from_pairs(4, [("n", "3")]),
            Row::from_pairs(5, [("other", "3")]),
        ];
        let mut report = SkipReport::new();
        let accepted = validate_rows(&rows, &mut report, |r| require_non_negative(r, "n", "n"));
        assert_eq!(accepted, vec![1.0, 3.0]);
        assert_eq!(report.len(), 2);
        let lines: Vec<usize> = report.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![3, 5]);
        assert_eq!(report.messages()[1], "Row 5: missing n");
    }

    #[test]
    fn missing_fields_lists_all_blank_columns() {
        let r = row(&[("id", "1"), ("name", ""), ("city", "Oslo")]);
        assert_eq!(
            missing_fields(&r, ["zip", "name", "id", "city"]),
            vec!["name".to_string(), "zip".to_string()]
        );
    }
}
