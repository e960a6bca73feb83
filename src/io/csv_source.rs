//! CSV input acquisition: read a file into header names and `Row`s.
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use tracing::debug;

use crate::core::row::Row;
use crate::error::{Error, Result};
use crate::types::HeaderStyle;

/// Parsed CSV file: normalized headers plus rows keyed by them
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl CsvSource {
    /// Read `path`, failing with `NotFound` when it does not exist
    pub fn open(path: &Path, style: HeaderStyle) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path)?;
        let source = Self::from_reader(file, path, style)?;
        debug!(
            "Loaded {} row(s) with {} column(s) from {:?}",
            source.rows.len(),
            source.headers.len(),
            path
        );
        Ok(source)
    }

    /// Parse CSV text from any reader; `path` is only used in error messages
    pub fn from_reader<R: Read>(reader: R, path: &Path, style: HeaderStyle) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::None)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| style.normalize(h))
            .collect();

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            // Header occupies line 1; fall back to ordinal position if the reader has none
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(index + 2);
            let fields: BTreeMap<String, String> = headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.clone(), v.to_string()))
                .collect();
            rows.push(Row::new(line, fields));
        }

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// Fail when the file had no header row at all
    pub fn require_header(&self) -> Result<()> {
        if self.headers.iter().all(|h| h.trim().is_empty()) {
            return Err(Error::MissingHeader {
                path: self.path.clone(),
            });
        }
        Ok(())
    }

    /// Fail with the sorted list of `columns` that are not in the header
    pub fn require_columns<'a, I>(&self, columns: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.require_header()?;
        let mut missing: Vec<String> = columns
            .into_iter()
            .filter(|c| !self.has_column(c))
            .map(str::to_string)
            .collect();
        missing.sort();
        missing.dedup();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingColumns {
                path: self.path.clone(),
                columns: missing,
            })
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str, style: HeaderStyle) -> CsvSource {
        CsvSource::from_reader(text.as_bytes(), Path::new("mem.csv"), style).unwrap()
    }

    #[test]
    fn rows_carry_source_line_numbers() {
        let src = parse("id,name\n1,Ada\n\n2,Grace\n", HeaderStyle::Exact);
        let lines: Vec<usize> = src.rows().iter().map(Row::line).collect();
        assert_eq!(lines, vec![2, 4]);
        assert_eq!(src.rows()[1].get("name"), Some("Grace"));
    }

    #[test]
    fn short_records_leave_trailing_fields_absent() {
        let src = parse("a,b,c\n1,2\n", HeaderStyle::Exact);
        let row = &src.rows()[0];
        assert_eq!(row.get("b"), Some("2"));
        assert_eq!(row.raw("c"), None);
    }

    #[test]
    fn bom_and_header_style_are_applied() {
        let src = parse("\u{feff}Item,On Hand\nbolt,3\n", HeaderStyle::Compact);
        assert_eq!(src.headers(), &["item".to_string(), "onhand".to_string()]);
        assert_eq!(src.rows()[0].get("onhand"), Some("3"));
    }

    #[test]
    fn missing_columns_are_reported_sorted() {
        let src = parse("id,zeta\n1,2\n", HeaderStyle::Exact);
        match src.require_columns(["name", "id", "age"]) {
            Err(Error::MissingColumns { columns, .. }) => {
                assert_eq!(columns, vec!["age".to_string(), "name".to_string()])
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn empty_input_has_no_header() {
        let src = parse("", HeaderStyle::Exact);
        assert!(matches!(
            src.require_header(),
            Err(Error::MissingHeader { .. })
        ));
    }
}
