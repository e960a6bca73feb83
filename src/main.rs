//! batchkit CLI entrypoint.
//!
//! Parses arguments, hands them to the `cli` runner and maps the outcome to a
//! process exit code: 0 on success, 1 on a fatal error, 2 when a manifest
//! reconciliation finds discrepancies.

use std::process::ExitCode;

use clap::Parser;

mod cli;

fn main() -> ExitCode {
    let args = cli::CliArgs::parse();
    match cli::run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
