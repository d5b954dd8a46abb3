use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinanzasError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "xlsx")]
    #[error("Spreadsheet error: {0}")]
    Workbook(#[from] calamine::Error),

    #[cfg(feature = "remote")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote source returned {status}: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("No column found for '{0}'")]
    MissingColumn(&'static str),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid date: {0} (expected YYYY-MM-DD or DD/MM/YYYY)")]
    InvalidDate(String),

    #[error("Source is read-only: {0}")]
    ReadOnlySource(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("No pending movement matches {0}")]
    NothingToPay(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, FinanzasError>;
