// Error taxonomy for stock interactions
//
// Validation errors are reported back to the user and never change state.
// Everything else (file I/O, malformed CSV, PDF rendering) aborts the
// interaction that raised it.

use std::path::PathBuf;
use thiserror::Error;

/// Result type used by store and export operations.
pub type StockResult<T> = Result<T, StockError>;

/// Rejected user input. Raised before any mutation takes place.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("item name must not be blank")]
    BlankName,

    #[error("quantity must be greater than zero (got {0})")]
    NonPositiveQuantity(i64),

    #[error("threshold must be greater than zero (got {0})")]
    NonPositiveThreshold(i64),

    #[error("{0} already exists in the stock")]
    DuplicateItem(String),

    #[error("moved quantity for {item} must not be negative (got {moved})")]
    NegativeMovement { item: String, moved: i64 },

    #[error("moving {moved} of {item} from {opening} in stock is out of range")]
    MovementOutOfRange { item: String, opening: i64, moved: i64 },

    #[error("unknown item type: {0}")]
    UnknownItemType(String),

    #[error("{field} must be a whole number (got {value:?})")]
    InvalidNumber { field: String, value: String },
}

/// Failure of a whole interaction.
#[derive(Debug, Error)]
pub enum StockError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to render order list: {0}")]
    Export(String),
}

impl StockError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    /// True when the error is a user-facing validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, StockError::Validation(_))
    }
}
