//! I/O layer: CSV input acquisition, the dedup log, the print hand-off,
//! and `writers` for PNG, PDF and summary exports.
pub mod csv_source;
pub use csv_source::CsvSource;

pub mod dedup_log;
pub use dedup_log::DedupLog;

pub mod spooler;
pub use spooler::{CommandSpooler, Spooler};

pub mod writers;
