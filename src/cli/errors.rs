use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid rule '{rule}'. Expected PATTERN=DEST")]
    InvalidRule { rule: String },

    #[error("Invalid delay: {delay}. Must be a non-negative number of seconds")]
    InvalidDelay { delay: f64 },

    #[error("Expected 3 column names (date, project, hours), got {count}")]
    InvalidColumns { count: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
