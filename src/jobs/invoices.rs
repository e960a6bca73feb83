//! Rule-driven sorting of vendor invoices into per-vendor folders.
use std::fs;
use std::path::{Component, Path, PathBuf};

use glob::Pattern;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

pub const INVOICE_EXTENSIONS: [&str; 3] = ["pdf", "xls", "xlsx"];

/// Prefix marking a rule pattern as a regular expression
pub const REGEX_PREFIX: &str = "re:";

/// One `pattern -> destination` entry as written in a rules file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub pattern: String,
    pub destination: PathBuf,
}

impl RuleSpec {
    pub fn new(pattern: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            pattern: pattern.into(),
            destination: destination.into(),
        }
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Glob(Pattern),
    Regex(Regex),
}

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub pattern: String,
    pub destination: PathBuf,
    matcher: Matcher,
}

impl CompiledRule {
    pub fn compile(spec: &RuleSpec) -> Result<Self> {
        let matcher = match spec.pattern.strip_prefix(REGEX_PREFIX) {
            Some(expr) => Matcher::Regex(RegexBuilder::new(expr).case_insensitive(true).build()?),
            None => Matcher::Glob(Pattern::new(&spec.pattern)?),
        };
        Ok(Self {
            pattern: spec.pattern.clone(),
            destination: spec.destination.clone(),
            matcher,
        })
    }

    pub fn matches(&self, filename: &str) -> bool {
        match &self.matcher {
            Matcher::Glob(p) => p.matches(filename),
            Matcher::Regex(r) => r.is_match(filename),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceParams {
    pub source: PathBuf,
    pub rules: Vec<RuleSpec>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub file: String,
    pub pattern: String,
    pub target: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveFailure {
    pub file: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceReport {
    /// Moves performed, or planned in dry-run mode
    pub moves: Vec<PlannedMove>,
    pub unmatched: Vec<String>,
    pub failures: Vec<MoveFailure>,
}

/// Read a JSON array of `{"pattern": ..., "destination": ...}` objects
pub fn load_rules(path: &Path) -> Result<Vec<RuleSpec>> {
    if !path.is_file() {
        return Err(Error::NotFound {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

pub fn compile_rules(specs: &[RuleSpec]) -> Result<Vec<CompiledRule>> {
    specs.iter().map(CompiledRule::compile).collect()
}

/// First rule whose pattern matches `filename`
pub fn evaluate_rules<'a>(filename: &str, rules: &'a [CompiledRule]) -> Option<&'a CompiledRule> {
    rules.iter().find(|r| r.matches(filename))
}

/// Top-level pdf/xls/xlsx files (case-insensitive), sorted by name
pub fn collect_invoices(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| INVOICE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)));
        if supported {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the deepest existing ancestor of `path`, then re-append the
/// components that do not exist yet, so symlinks along the way are followed
fn resolve_existing(path: &Path) -> Result<PathBuf> {
    let mut existing = path;
    let mut pending = Vec::new();
    loop {
        if let Ok(real) = existing.canonicalize() {
            let mut resolved = real;
            for name in pending.iter().rev() {
                resolved.push(name);
            }
            return Ok(resolved);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                pending.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(path.to_path_buf()),
        }
    }
}

/// Resolve `destination` against `base`, refusing anything that lands outside it
pub fn ensure_within_base(base: &Path, destination: &Path) -> Result<PathBuf> {
    let base = base.canonicalize()?;
    let target = resolve_existing(&normalize_lexically(&base.join(destination)))?;
    if target.starts_with(&base) {
        Ok(target)
    } else {
        Err(Error::DestinationEscapes {
            destination: destination.to_path_buf(),
            base,
        })
    }
}

fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_err() {
        // Cross-device moves cannot rename
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}

/// Move `invoice` into `destination` under `base`; returns the target path
pub fn move_invoice(
    invoice: &Path,
    base: &Path,
    destination: &Path,
    dry_run: bool,
) -> Result<PathBuf> {
    let target_dir = ensure_within_base(base, destination)?;
    let file_name = invoice.file_name().ok_or_else(|| Error::InvalidArgument {
        arg: "invoice",
        value: invoice.display().to_string(),
    })?;
    let target = target_dir.join(file_name);

    if dry_run {
        info!("[DRY-RUN] Would move {:?} -> {:?}", file_name, target);
        return Ok(target);
    }

    fs::create_dir_all(&target_dir)?;
    info!("Moving {:?} -> {:?}", file_name, target);
    move_file(invoice, &target)?;
    Ok(target)
}

pub fn sort_invoices(params: &InvoiceParams) -> Result<InvoiceReport> {
    if !params.source.is_dir() {
        return Err(Error::NotFound {
            path: params.source.clone(),
        });
    }
    let rules = compile_rules(&params.rules)?;
    let mut report = InvoiceReport::default();
    if rules.is_empty() {
        return Ok(report);
    }

    for invoice in collect_invoices(&params.source)? {
        let name = invoice
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some(rule) = evaluate_rules(&name, &rules) else {
            report.unmatched.push(name);
            continue;
        };
        match move_invoice(&invoice, &params.source, &rule.destination, params.dry_run) {
            Ok(target) => report.moves.push(PlannedMove {
                file: name,
                pattern: rule.pattern.clone(),
                target,
            }),
            Err(e) => {
                warn!("Could not move {}: {}", name, e);
                report.failures.push(MoveFailure {
                    file: name,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}
