use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use batchkit::core::validate::SkipReport;
use batchkit::jobs::{inventory, invoices, labels, mail_merge, manifest, print, qr, timesheet};
use batchkit::{CommandSpooler, SummaryTable, export_table};

use super::args::{
    CliArgs, Command, LabelsArgs, MailMergeArgs, PrintArgs, QrArgs, ReconcileArgs, ReorderArgs,
    SortInvoicesArgs, TimesheetArgs,
};
use super::errors::AppError;

type CliResult = Result<ExitCode, Box<dyn std::error::Error>>;

/// Exit status when a reconciliation finds short or over quantities
const DISCREPANCY_EXIT: u8 = 2;

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // Ignore a second init (e.g. when embedded in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn report_skipped(skipped: &SkipReport) {
    if skipped.is_empty() {
        return;
    }
    for message in skipped.messages() {
        eprintln!("{}", message);
    }
    eprintln!(
        "Skipped {} row(s) due to validation errors.",
        skipped.len()
    );
}

/// Print the table (or `empty_message` when it has no rows), then export it
/// if asked; an empty table still exports its header
fn print_and_export(
    table: &SummaryTable,
    empty_message: &str,
    export: Option<&Path>,
) -> batchkit::Result<()> {
    if table.is_empty() {
        println!("{}", empty_message);
    } else {
        println!("{}", table.render_plain());
    }
    if let Some(path) = export {
        let format = export_table(path, table)?;
        println!("\nSummary exported to {} ({}).", path.display(), format);
    }
    Ok(())
}

/// Seconds to a `Duration`; negative, non-finite or out-of-range values are rejected
fn parse_delay(seconds: f64) -> Result<Duration, AppError> {
    Duration::try_from_secs_f64(seconds).map_err(|_| AppError::InvalidDelay { delay: seconds })
}

fn run_print(args: PrintArgs) -> CliResult {
    let delay = parse_delay(args.delay)?;
    let command: Vec<String> = args.command.split_whitespace().map(str::to_string).collect();
    let mut spooler = CommandSpooler::new(&command).map_err(AppError::Io)?;
    let params = print::PrintParams {
        folder: args.folder,
        delay,
        max_retries: args.max_retries,
        dry_run: args.dry_run,
        log_file: args.log_file,
        command,
    };

    let report = print::print_folder(&params, &mut spooler)?;

    info!("Batch printing complete!");
    info!("Found: {}", report.found);
    info!("Printed: {}", report.printed.len());
    info!("Already printed: {}", report.already_printed.len());
    if params.dry_run {
        info!("Dry run (not sent): {}", report.dry_run.len());
    }
    if !report.failed.is_empty() {
        warn!("Failed: {}", report.failed.join(", "));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_qr(args: QrArgs) -> CliResult {
    let params = qr::QrParams {
        data: args.data,
        output: args.output,
        box_size: args.box_size,
        border: args.border,
        error_correction: args.error_correction,
    };
    let side = qr::generate_qr(&params)?;
    println!(
        "QR code saved to {} ({}x{} px)",
        params.output.display(),
        side,
        side
    );
    Ok(ExitCode::SUCCESS)
}

fn run_mail_merge(args: MailMergeArgs) -> CliResult {
    let params = mail_merge::MergeParams {
        csv: args.csv,
        template: args.template,
        output_dir: args.output_dir,
    };
    let report = mail_merge::run_mail_merge(&params)?;

    println!("Generated {} drafts.", report.generated.len());
    for path in &report.generated {
        println!("  - {}", path.display());
    }
    if report.skipped.is_empty() {
        println!("No missing fields detected.");
    } else {
        println!("Skipped rows:");
        for message in report.skipped.messages() {
            println!("  - {}", message);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_timesheet(args: TimesheetArgs) -> CliResult {
    let columns = match args.columns {
        None => timesheet::TimesheetColumns::default(),
        Some(names) => match <[String; 3]>::try_from(names) {
            Ok([date, project, hours]) => timesheet::TimesheetColumns {
                date,
                project,
                hours,
            },
            Err(names) => return Err(AppError::InvalidColumns { count: names.len() }.into()),
        },
    };
    let params = timesheet::TimesheetParams {
        csv: args.csv,
        columns,
    };
    let (totals, skipped) = timesheet::load_timesheet(&params)?;

    print_and_export(
        &timesheet::summary_table(&totals),
        "No valid rows were found in the provided CSV file.",
        args.export.as_deref(),
    )?;
    report_skipped(&skipped);
    Ok(ExitCode::SUCCESS)
}

fn run_reorder(args: ReorderArgs) -> CliResult {
    let params = inventory::ReorderParams {
        csv: args.csv,
        vendors: args.vendors,
        categories: args.categories,
    };
    let (rows, skipped) = inventory::reorder_report(&params)?;

    print_and_export(
        &inventory::summary_table(&rows),
        "No products met the reorder criteria.",
        args.export.as_deref(),
    )?;
    report_skipped(&skipped);
    Ok(ExitCode::SUCCESS)
}

fn parse_rule(raw: &str) -> Result<invoices::RuleSpec, AppError> {
    match raw.split_once('=') {
        Some((pattern, destination)) if !pattern.is_empty() && !destination.is_empty() => {
            Ok(invoices::RuleSpec::new(pattern, destination))
        }
        _ => Err(AppError::InvalidRule {
            rule: raw.to_string(),
        }),
    }
}

fn run_sort_invoices(args: SortInvoicesArgs) -> CliResult {
    let mut rules = match &args.rules {
        Some(path) => invoices::load_rules(path)?,
        None => Vec::new(),
    };
    for raw in &args.extra_rules {
        rules.push(parse_rule(raw)?);
    }
    if rules.is_empty() {
        println!("No vendor rules configured. Pass --rules FILE or --rule PATTERN=DEST.");
        return Ok(ExitCode::SUCCESS);
    }

    let params = invoices::InvoiceParams {
        source: args.source,
        rules,
        dry_run: args.dry_run,
    };
    let report = invoices::sort_invoices(&params)?;

    let verb = if params.dry_run { "Would move" } else { "Moved" };
    for planned in &report.moves {
        println!("{} '{}' -> '{}'", verb, planned.file, planned.target.display());
    }
    for failure in &report.failures {
        eprintln!("Failed '{}': {}", failure.file, failure.reason);
    }
    if !report.unmatched.is_empty() {
        println!("\nUnmatched invoices:");
        for name in &report.unmatched {
            println!(" - {}", name);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_labels(args: LabelsArgs) -> CliResult {
    let params = labels::LabelParams {
        csv: args.csv,
        output_dir: args.output_dir,
        template: args.template,
        dpi: args.dpi,
    };
    let report = labels::generate_labels(&params)?;

    for base in &report.generated {
        println!("Generated {}.png and {}.pdf", base, base);
    }
    report_skipped(&report.skipped);
    Ok(ExitCode::SUCCESS)
}

fn run_reconcile(args: ReconcileArgs) -> CliResult {
    let params = manifest::ReconcileParams {
        expected: args.expected,
        scanned: args.scanned,
        export: args.export,
    };
    let result = manifest::reconcile_files(&params)?;

    let table = manifest::summary_table(&result.rows);
    println!("{}", table.render_plain());
    if let Some(path) = &params.export {
        let markdown = manifest::export_results(path, &result.rows)?;
        println!(
            "\nResults exported to {} and {}.",
            path.display(),
            markdown.display()
        );
    }
    for (label, skipped) in [
        ("expected", &result.expected_skipped),
        ("scanned", &result.scanned_skipped),
    ] {
        if !skipped.is_empty() {
            eprintln!("In the {} manifest:", label);
            report_skipped(skipped);
        }
    }

    if result.has_discrepancy() {
        Ok(ExitCode::from(DISCREPANCY_EXIT))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

pub fn run(args: CliArgs) -> CliResult {
    init_logging(args.log);

    match args.command {
        Command::Print(a) => run_print(a),
        Command::Qr(a) => run_qr(a),
        Command::MailMerge(a) => run_mail_merge(a),
        Command::Timesheet(a) => run_timesheet(a),
        Command::Reorder(a) => run_reorder(a),
        Command::SortInvoices(a) => run_sort_invoices(a),
        Command::Labels(a) => run_labels(a),
        Command::Reconcile(a) => run_reconcile(a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_split_on_the_first_equals_sign() {
        let rule = parse_rule("re:acme=.*=Acme").unwrap();
        assert_eq!(rule.pattern, "re:acme");
        assert_eq!(rule.destination, std::path::PathBuf::from(".*=Acme"));
        assert!(parse_rule("no-destination").is_err());
        assert!(parse_rule("=Acme").is_err());
    }

    #[test]
    fn delays_outside_duration_range_are_rejected() {
        assert_eq!(parse_delay(1.5).unwrap(), Duration::from_millis(1500));
        assert!(matches!(parse_delay(1e30), Err(AppError::InvalidDelay { .. })));
        assert!(matches!(parse_delay(-1.0), Err(AppError::InvalidDelay { .. })));
        assert!(matches!(parse_delay(f64::NAN), Err(AppError::InvalidDelay { .. })));
    }

    #[test]
    fn empty_summary_still_exports_header() {
        let dir = tempfile::tempdir().unwrap();
        let table = inventory::summary_table(&[]);

        let csv_path = dir.path().join("reorder.csv");
        print_and_export(&table, "No products met the reorder criteria.", Some(&csv_path)).unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(
            text.trim_end(),
            "Item,Vendor,Category,On Hand,Reorder Point,Shortage,Severity"
        );

        let md_path = dir.path().join("weekly.md");
        print_and_export(&timesheet::summary_table(&[]), "none", Some(&md_path)).unwrap();
        assert!(std::fs::read_to_string(&md_path).unwrap().starts_with("| ISO Week |"));

        let unsupported = dir.path().join("reorder.xlsx");
        assert!(matches!(
            print_and_export(&table, "none", Some(&unsupported)),
            Err(batchkit::Error::UnsupportedExport { .. })
        ));
    }
}
