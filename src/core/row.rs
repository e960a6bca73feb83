//! One CSV record keyed by (normalized) column name.
use std::collections::BTreeMap;

/// A CSV record with its 1-based source line (the header is line 1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    line: usize,
    fields: BTreeMap<String, String>,
}

impl Row {
    pub fn new(line: usize, fields: BTreeMap<String, String>) -> Self {
        Self { line, fields }
    }

    pub fn from_pairs<K, V, I>(line: usize, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            line,
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    /// Raw value as read, if the column exists for this record
    pub fn raw(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Trimmed value, `None` when absent or blank
    pub fn get(&self, column: &str) -> Option<&str> {
        self.raw(column).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Copy of the row with every value trimmed
    pub fn trimmed(&self) -> Row {
        Row {
            line: self.line,
            fields: self
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), v.trim().to_string()))
                .collect(),
        }
    }

    pub fn with_field(mut self, column: &str, value: &str) -> Row {
        self.fields.insert(column.to_string(), value.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_read_as_absent() {
        let row = Row::from_pairs(2, [("id", "  "), ("name", " Ada ")]);
        assert_eq!(row.get("id"), None);
        assert_eq!(row.get("name"), Some("Ada"));
        assert_eq!(row.raw("name"), Some(" Ada "));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.line(), 2);
    }
}
