//! Building blocks shared by the jobs: rows and their validation, summary
//! tables, text templates, and the QR/label raster renderers.
pub mod font;
pub mod label;
pub mod qr;
pub mod row;
pub mod table;
pub mod template;
pub mod validate;
