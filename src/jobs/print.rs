//! Batch printing of every PDF in a folder, resumable through a dedup log.
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::io::{DedupLog, Spooler};

pub const DEFAULT_LOG_NAME: &str = "_printed.log";

/// Print-run parameters suitable for config files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintParams {
    pub folder: PathBuf,
    /// Pause after each submitted job
    pub delay: Duration,
    /// Extra attempts after the first failure
    pub max_retries: u32,
    pub dry_run: bool,
    /// Dedup log; `<folder>/_printed.log` when unset
    pub log_file: Option<PathBuf>,
    /// Program plus leading arguments; the file path is appended
    pub command: Vec<String>,
}

impl Default for PrintParams {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("."),
            delay: Duration::from_secs(7),
            max_retries: 2,
            dry_run: false,
            log_file: None,
            command: vec!["lp".to_string()],
        }
    }
}

impl PrintParams {
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.folder.join(DEFAULT_LOG_NAME))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrintReport {
    pub found: usize,
    pub printed: Vec<String>,
    pub already_printed: Vec<String>,
    /// Files that would have been sent in dry-run mode
    pub dry_run: Vec<String>,
    pub failed: Vec<String>,
}

/// Top-level `*.pdf` files (case-insensitive), sorted by name
pub fn collect_pdfs(folder: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

pub fn print_folder<S: Spooler>(params: &PrintParams, spooler: &mut S) -> Result<PrintReport> {
    if !params.folder.is_dir() {
        return Err(Error::NotFound {
            path: params.folder.clone(),
        });
    }

    let mut log = DedupLog::open(&params.log_path())?;
    let pdfs = collect_pdfs(&params.folder)?;
    let total = pdfs.len();
    info!("Found {} PDFs in: {:?}", total, params.folder);

    let mut report = PrintReport {
        found: total,
        ..Default::default()
    };

    for (idx, name) in pdfs.into_iter().enumerate() {
        if log.contains(&name) {
            info!("[skip] {} (already logged)", name);
            report.already_printed.push(name);
            continue;
        }

        let full = params.folder.join(&name);
        info!("[{}/{}] Printing: {:?}", idx + 1, total, full);

        if params.dry_run {
            report.dry_run.push(name);
            continue;
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match spooler.submit(&full) {
                Ok(()) => {
                    // Give the spooler time before logging and moving on
                    thread::sleep(params.delay);
                    log.record(&name)?;
                    report.printed.push(name);
                    break;
                }
                Err(e) => {
                    warn!("Attempt {} failed for {}: {}", attempt, name, e);
                    if attempt <= params.max_retries {
                        thread::sleep(params.delay * 2);
                        continue;
                    }
                    error!("Skipping {} after {} retries.", name, params.max_retries);
                    report.failed.push(name);
                    break;
                }
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;

    /// Records submissions; fails a file the configured number of times first
    #[derive(Default)]
    struct FakeSpooler {
        submitted: Vec<String>,
        failures_left: HashMap<String, u32>,
    }

    impl Spooler for FakeSpooler {
        fn submit(&mut self, path: &Path) -> io::Result<()> {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            self.submitted.push(name.clone());
            match self.failures_left.get_mut(&name) {
                Some(n) if *n > 0 => {
                    *n -= 1;
                    Err(io::Error::other("spooler busy"))
                }
                _ => Ok(()),
            }
        }
    }

    fn params(folder: &Path) -> PrintParams {
        PrintParams {
            folder: folder.to_path_buf(),
            delay: Duration::ZERO,
            ..Default::default()
        }
    }

    fn seed(folder: &Path, names: &[&str]) {
        for name in names {
            fs::write(folder.join(name), b"%PDF").unwrap();
        }
    }

    #[test]
    fn only_top_level_pdfs_are_collected_in_order() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), &["b.pdf", "A.PDF", "notes.txt"]);
        fs::create_dir(dir.path().join("sub.pdf")).unwrap();
        assert_eq!(collect_pdfs(dir.path()).unwrap(), vec!["A.PDF", "b.pdf"]);
    }

    #[test]
    fn rerun_does_not_resubmit_logged_files() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), &["1.pdf", "2.pdf"]);
        let p = params(dir.path());

        let mut spooler = FakeSpooler::default();
        let first = print_folder(&p, &mut spooler).unwrap();
        assert_eq!(first.printed, vec!["1.pdf", "2.pdf"]);

        let mut spooler = FakeSpooler::default();
        let second = print_folder(&p, &mut spooler).unwrap();
        assert!(spooler.submitted.is_empty());
        assert_eq!(second.already_printed.len(), 2);
        assert!(second.printed.is_empty());
    }

    #[test]
    fn retries_then_gives_up() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), &["flaky.pdf", "dead.pdf"]);
        let p = params(dir.path());

        let mut spooler = FakeSpooler::default();
        spooler.failures_left.insert("flaky.pdf".into(), 2);
        spooler.failures_left.insert("dead.pdf".into(), 10);
        let report = print_folder(&p, &mut spooler).unwrap();

        assert_eq!(report.printed, vec!["flaky.pdf"]);
        assert_eq!(report.failed, vec!["dead.pdf"]);
        // one try plus max_retries for the dead file, three tries for the flaky one
        let dead_attempts = spooler.submitted.iter().filter(|n| *n == "dead.pdf").count();
        assert_eq!(dead_attempts, 3);
        let log = DedupLog::open(&p.log_path()).unwrap();
        assert!(log.contains("flaky.pdf"));
        assert!(!log.contains("dead.pdf"));
    }

    #[test]
    fn dry_run_submits_and_logs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), &["1.pdf"]);
        let p = PrintParams {
            dry_run: true,
            ..params(dir.path())
        };
        let mut spooler = FakeSpooler::default();
        let report = print_folder(&p, &mut spooler).unwrap();
        assert_eq!(report.dry_run, vec!["1.pdf"]);
        assert!(spooler.submitted.is_empty());
        assert!(!p.log_path().exists());
    }

    #[test]
    fn missing_folder_is_fatal() {
        let p = params(Path::new("/definitely/not/here"));
        let mut spooler = FakeSpooler::default();
        assert!(matches!(
            print_folder(&p, &mut spooler),
            Err(Error::NotFound { .. })
        ));
    }
}
