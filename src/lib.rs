#![doc = r#"
batchkit — small CSV- and directory-driven batch jobs.

Every job follows the same shape: acquire input (a CSV file or a directory
listing), validate each row, skip and report the rows that fail, then write
output files or a summary table. A bad row never aborts a run; a missing file
or column does.

Jobs
----
- [`jobs::print`] — send every PDF in a folder to a print command, once.
- [`jobs::qr`] — one QR code PNG.
- [`jobs::mail_merge`] — one text file per CSV row from a `{field}` template.
- [`jobs::timesheet`] — hours per ISO week and project.
- [`jobs::inventory`] — items at or below their reorder point, worst first.
- [`jobs::invoices`] — move invoices into vendor folders by glob/regex rules.
- [`jobs::labels`] — pallet labels (PNG + PDF) with a QR code and text.
- [`jobs::manifest`] — expected vs scanned shipment quantities.

Quick start: timesheet roll-up
------------------------------
```rust,no_run
use std::path::PathBuf;
use batchkit::{load_timesheet, timesheet_table, TimesheetColumns, TimesheetParams};

fn main() -> batchkit::Result<()> {
    let params = TimesheetParams {
        csv: PathBuf::from("hours.csv"),
        columns: TimesheetColumns::default(),
    };
    let (totals, skipped) = load_timesheet(&params)?;
    println!("{}", timesheet_table(&totals).render_plain());
    for message in skipped.messages() {
        eprintln!("{message}");
    }
    Ok(())
}
```

Pallet labels
-------------
```rust,no_run
use std::path::PathBuf;
use batchkit::{generate_labels, LabelParams};

fn main() -> batchkit::Result<()> {
    let report = generate_labels(&LabelParams {
        csv: PathBuf::from("pallets.csv"),
        output_dir: PathBuf::from("labels"),
        ..Default::default()
    })?;
    println!("generated={} skipped={}", report.generated.len(), report.skipped.len());
    Ok(())
}
```

Error handling
--------------
All public functions return `batchkit::Result<T>`. Per-row problems are not
errors: they are collected in a [`SkipReport`].

```rust,no_run
use std::path::PathBuf;
use batchkit::{reorder_report, Error, ReorderParams};

fn main() {
    let params = ReorderParams {
        csv: PathBuf::from("stock.csv"),
        ..Default::default()
    };
    match reorder_report(&params) {
        Ok((rows, _skipped)) => println!("{} item(s) to reorder", rows.len()),
        Err(Error::MissingColumns { columns, .. }) => eprintln!("missing: {}", columns.join(", ")),
        Err(other) => eprintln!("{other}"),
    }
}
```

Useful modules
--------------
- [`jobs`] — the batch jobs and their params/report types.
- [`core`] — rows, validation, summary tables, templates, QR and label rendering.
- [`io`] — CSV input, dedup log, print hand-off, PNG/PDF/table writers.
- [`types`] — shared enums (`ExportFormat`, `ErrorCorrection`, `HeaderStyle`).
- [`error`] — crate-level `Error` and `Result`.
"#]

pub mod core;
pub mod error;
pub mod io;
pub mod jobs;
pub mod types;

// Curated public API surface
// Types
pub use core::row::Row;
pub use core::table::{Cell, SummaryTable};
pub use core::validate::{RejectReason, Rejection, SkipReport};
pub use error::{Error, Result};
pub use types::{ErrorCorrection, ExportFormat, HeaderStyle};

// I/O
pub use io::writers::export::export_table;
pub use io::{CommandSpooler, CsvSource, DedupLog, Spooler};

// Jobs
pub use jobs::inventory::{ReorderParams, reorder_report};
pub use jobs::invoices::{InvoiceParams, InvoiceReport, RuleSpec, load_rules, sort_invoices};
pub use jobs::labels::{LabelParams, LabelReport, generate_labels};
pub use jobs::mail_merge::{MergeParams, MergeReport, run_mail_merge};
pub use jobs::manifest::{Reconciliation, ReconcileParams, reconcile_files};
pub use jobs::print::{PrintParams, PrintReport, print_folder};
pub use jobs::qr::{QrParams, generate_qr};
pub use jobs::timesheet::{
    TimesheetColumns, TimesheetParams, load_timesheet, summary_table as timesheet_table,
};
