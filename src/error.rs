use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Duplicate import: '{file_name}' was already imported as '{original}'")]
    DuplicateImport { file_name: String, original: String },

    #[error("Ambiguous row in '{file_name}' (both credit and debit present): {row}")]
    AmbiguousAmount { file_name: String, row: String },

    #[error("No transactions found in '{0}'")]
    NoTransactions(String),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, FinError>;
