//! Batch jobs. Each one takes a serde-friendly params struct and returns a
//! report; nothing here prints, so callers decide how results are shown.
pub mod inventory;
pub mod invoices;
pub mod labels;
pub mod mail_merge;
pub mod manifest;
pub mod print;
pub mod qr;
pub mod timesheet;
