//! Summary table model and its text renderings (plain, Markdown, CSV).
use crate::error::Result;

/// A table cell: what people read, and optionally a different value for CSV
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub machine: Option<String>,
}

impl Cell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            machine: None,
        }
    }

    pub fn with_machine(text: impl Into<String>, machine: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            machine: Some(machine.into()),
        }
    }

    pub fn csv_value(&self) -> &str {
        self.machine.as_deref().unwrap_or(&self.text)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::new(s)
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::new(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
    footer: Option<Vec<Cell>>,
}

impl SummaryTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            footer: None,
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    /// Totals line rendered after the body in every format
    pub fn set_footer(&mut self, footer: Vec<Cell>) {
        debug_assert_eq!(footer.len(), self.headers.len());
        self.footer = Some(footer);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn footer(&self) -> Option<&[Cell]> {
        self.footer.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn body(&self) -> impl Iterator<Item = &Vec<Cell>> {
        self.rows.iter().chain(self.footer.iter())
    }

    /// Left-justified columns joined by ` | `, dashes joined by `-+-`
    pub fn render_plain(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in self.body() {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.text.chars().count());
            }
        }

        let pad = |s: &str, w: usize| {
            let len = s.chars().count();
            format!("{}{}", s, " ".repeat(w.saturating_sub(len)))
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 3);
        lines.push(
            self.headers
                .iter()
                .zip(&widths)
                .map(|(h, &w)| pad(h, w))
                .collect::<Vec<_>>()
                .join(" | "),
        );
        lines.push(
            widths
                .iter()
                .map(|&w| "-".repeat(w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        for row in self.body() {
            lines.push(
                row.iter()
                    .zip(&widths)
                    .map(|(c, &w)| pad(&c.text, w))
                    .collect::<Vec<_>>()
                    .join(" | "),
            );
        }
        lines.join("\n")
    }

    pub fn render_markdown(&self) -> String {
        let escape = |s: &str| s.replace('|', "\\|");
        let mut out = String::new();
        out.push_str(&format!(
            "| {} |\n",
            self.headers
                .iter()
                .map(|h| escape(h))
                .collect::<Vec<_>>()
                .join(" | ")
        ));
        out.push_str(&format!(
            "|{}|\n",
            self.headers
                .iter()
                .map(|h| "-".repeat(h.chars().count().max(3) + 2))
                .collect::<Vec<_>>()
                .join("|")
        ));
        for row in self.body() {
            out.push_str(&format!(
                "| {} |\n",
                row.iter()
                    .map(|c| escape(&c.text))
                    .collect::<Vec<_>>()
                    .join(" | ")
            ));
        }
        out
    }

    pub fn render_csv(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in self.body() {
            writer.write_record(row.iter().map(Cell::csv_value))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| crate::error::Error::external(e.error()))?;
        String::from_utf8(bytes).map_err(crate::error::Error::external)
    }
}
