//! Command line layer for batchkit.
//!
//! `args` defines one clap subcommand per job, `errors` the argument-level
//! failures, and `runner` turns parsed arguments into job params, runs the
//! job and prints its summary. Library users should call `batchkit::jobs`
//! directly.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
