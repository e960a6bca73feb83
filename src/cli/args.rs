use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use batchkit::ErrorCorrection;
use batchkit::core::label::DEFAULT_DPI;

#[derive(Parser)]
#[command(name = "batchkit", version, about = "CSV- and folder-driven batch jobs")]
pub struct CliArgs {
    /// Enable debug logging (otherwise RUST_LOG or `info`)
    #[arg(long, global = true, default_value_t = false)]
    pub log: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Send every PDF in a folder to the print command, skipping ones already logged
    Print(PrintArgs),
    /// Write one QR code PNG
    Qr(QrArgs),
    /// Render one text file per CSV row from a `{field}` template
    MailMerge(MailMergeArgs),
    /// Total hours per ISO week and project
    Timesheet(TimesheetArgs),
    /// Products at or below their reorder point
    Reorder(ReorderArgs),
    /// Move invoices into vendor folders by filename rules
    SortInvoices(SortInvoicesArgs),
    /// Pallet labels (PNG + PDF) with a QR code and text blocks
    Labels(LabelsArgs),
    /// Compare expected and scanned shipment manifests
    Reconcile(ReconcileArgs),
}

#[derive(Args)]
pub struct PrintArgs {
    /// Folder containing the PDFs
    pub folder: PathBuf,

    /// Seconds to wait after each job
    #[arg(long, default_value_t = 7.0)]
    pub delay: f64,

    /// Retries per file after a failed submission
    #[arg(long, default_value_t = 2)]
    pub max_retries: u32,

    /// List what would be printed without printing or logging
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Dedup log (defaults to <FOLDER>/_printed.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print command; the PDF path is appended as its last argument
    #[arg(long, default_value = "lp")]
    pub command: String,
}

#[derive(Args)]
pub struct QrArgs {
    /// Text or URL to encode
    pub data: String,

    /// Output PNG path
    #[arg(short, long, default_value = "qrcode.png")]
    pub output: PathBuf,

    /// Pixels per module
    #[arg(long, default_value_t = 10)]
    pub box_size: u32,

    /// Quiet zone width in modules
    #[arg(long, default_value_t = 4)]
    pub border: u32,

    /// Error-correction level
    #[arg(long, value_enum, default_value_t = ErrorCorrection::H)]
    pub error_correction: ErrorCorrection,
}

#[derive(Args)]
pub struct MailMergeArgs {
    /// CSV file containing merge data
    #[arg(long)]
    pub csv: PathBuf,

    /// Text template with `{field}` placeholders
    #[arg(long)]
    pub template: PathBuf,

    /// Directory for the rendered text files
    #[arg(long)]
    pub output_dir: PathBuf,
}

#[derive(Args)]
pub struct TimesheetArgs {
    /// Timesheet CSV file
    pub csv: PathBuf,

    /// Date, project and hours column names
    #[arg(
        long,
        num_args = 3,
        value_names = ["DATE_COLUMN", "PROJECT_COLUMN", "HOURS_COLUMN"]
    )]
    pub columns: Option<Vec<String>>,

    /// Export the summary (.csv or .md)
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Args)]
pub struct ReorderArgs {
    /// Inventory snapshot CSV file
    pub csv: PathBuf,

    /// Only these vendors (repeatable, case-insensitive)
    #[arg(long = "vendor", value_name = "NAME")]
    pub vendors: Vec<String>,

    /// Only these categories (repeatable, case-insensitive)
    #[arg(long = "category", value_name = "NAME")]
    pub categories: Vec<String>,

    /// Export the summary (.csv or .md)
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Args)]
pub struct SortInvoicesArgs {
    /// Directory holding the downloaded invoices
    #[arg(long)]
    pub source: PathBuf,

    /// JSON file with `[{"pattern": ..., "destination": ...}]` rules
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Extra rule as PATTERN=DEST, applied after the rules file (repeatable)
    #[arg(long = "rule", value_name = "PATTERN=DEST")]
    pub extra_rules: Vec<String>,

    /// Preview the moves without touching the filesystem
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct LabelsArgs {
    /// Pallet data CSV
    #[arg(long)]
    pub csv: PathBuf,

    /// Directory for the generated PNG/PDF labels
    #[arg(long)]
    pub output_dir: PathBuf,

    /// Optional JSON layout template
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Output resolution in dots per inch
    #[arg(long, default_value_t = DEFAULT_DPI)]
    pub dpi: u32,
}

#[derive(Args)]
pub struct ReconcileArgs {
    /// Expected manifest CSV
    #[arg(long)]
    pub expected: PathBuf,

    /// Scanned manifest CSV
    #[arg(long)]
    pub scanned: PathBuf,

    /// CSV export path; a Markdown file with the same stem is written too
    #[arg(long)]
    pub export: Option<PathBuf>,
}
