use std::fs;
use std::path::Path;

use tracing::info;

use crate::core::table::SummaryTable;
use crate::error::Result;
use crate::types::ExportFormat;

/// Write `table` to `path` in the format chosen by its extension
pub fn export_table(path: &Path, table: &SummaryTable) -> Result<ExportFormat> {
    let format = ExportFormat::from_path(path)?;
    write_table(path, table, format)?;
    Ok(format)
}

pub fn write_table(path: &Path, table: &SummaryTable, format: ExportFormat) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let contents = match format {
        ExportFormat::Csv => table.render_csv()?,
        ExportFormat::Markdown => table.render_markdown(),
    };
    fs::write(path, contents)?;
    info!("Exported {} summary to {:?}", format, path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn export_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = SummaryTable::new(["k", "v"]);
        table.push_row(vec!["a".into(), "1".into()]);
        let path = dir.path().join("nested/out/summary.md");
        assert_eq!(
            export_table(&path, &table).unwrap(),
            ExportFormat::Markdown
        );
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("| a | 1 |"));
    }

    #[test]
    fn unknown_extension_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.txt");
        let table = SummaryTable::new(["k"]);
        assert!(matches!(
            export_table(&path, &table),
            Err(Error::UnsupportedExport { .. })
        ));
        assert!(!path.exists());
    }
}
