pub mod export;
pub mod pdf;
pub mod png;
