//! Append-only record of already-processed filenames, so reruns skip them.
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct DedupLog {
    path: PathBuf,
    seen: HashSet<String>,
}

impl DedupLog {
    /// Load `path` if it exists; a missing file is an empty log
    pub fn open(path: &Path) -> Result<Self> {
        let seen = if path.exists() {
            fs::read_to_string(path)?
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()
        } else {
            HashSet::new()
        };
        debug!("Dedup log {:?}: {} entries", path, seen.len());
        Ok(Self {
            path: path.to_path_buf(),
            seen,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Append `name` and flush before returning
    pub fn record(&mut self, name: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", name)?;
        file.flush()?;
        self.seen.insert(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_printed.log");
        let mut log = DedupLog::open(&path).unwrap();
        assert!(log.is_empty());
        log.record("a.pdf").unwrap();
        log.record("b.pdf").unwrap();

        let reopened = DedupLog::open(&path).unwrap();
        assert!(reopened.contains("a.pdf"));
        assert!(reopened.contains("b.pdf"));
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn blank_lines_and_padding_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log");
        fs::write(&path, "one.pdf\n\n  two.pdf  \n").unwrap();
        let log = DedupLog::open(&path).unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.contains("two.pdf"));
    }
}
