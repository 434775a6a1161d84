use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Coarse error taxonomy exposed to callers of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidTransition,
    Validation,
    Conflict,
    Dependency,
    Internal,
}

#[derive(Error, Diagnostic, Debug)]
pub enum LedgerError {
    /// The entity does not exist or is not visible to the caller.
    #[error("{0} not found")]
    #[diagnostic(code(ledger::not_found))]
    NotFound(&'static str),

    /// The current status does not allow the requested transition.
    #[error("{0}")]
    #[diagnostic(code(ledger::invalid_transition))]
    InvalidTransition(String),

    #[error("validation failed: {0}")]
    #[diagnostic(code(ledger::validation))]
    ValidationError(String),

    /// State changed underneath the caller (item taken, duplicate tracking, stale version).
    #[error("conflict: {0}")]
    #[diagnostic(code(ledger::conflict), help("re-read the current state before retrying"))]
    Conflict(String),

    /// Payment gateway or shipping carrier failure.
    #[error("dependency failure: {0}")]
    #[diagnostic(code(ledger::dependency))]
    Dependency(String),

    #[error("storage error: {0}")]
    #[diagnostic(code(ledger::storage))]
    Storage(String),

    #[error("configuration error: {0}")]
    #[diagnostic(code(ledger::config))]
    Config(String),

    #[error("CSV error: {0}")]
    #[diagnostic(code(ledger::csv))]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    #[diagnostic(code(ledger::io))]
    IoError(#[from] std::io::Error),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::NotFound(_) => ErrorKind::NotFound,
            LedgerError::InvalidTransition(_) => ErrorKind::InvalidTransition,
            LedgerError::ValidationError(_) => ErrorKind::Validation,
            LedgerError::Conflict(_) => ErrorKind::Conflict,
            LedgerError::Dependency(_) => ErrorKind::Dependency,
            LedgerError::Storage(_)
            | LedgerError::Config(_)
            | LedgerError::CsvError(_)
            | LedgerError::IoError(_) => ErrorKind::Internal,
        }
    }
}
