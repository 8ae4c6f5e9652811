use crate::DType;
use thiserror::Error;

/// Core error type for ingestion and export operations
#[derive(Error, Debug)]
pub enum TableError {
    /// IO errors from buffer and text serialization
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow errors from IPC decoding/encoding or array construction
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    /// CSV reading and writing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Fatal configuration errors, such as an unknown declared type name
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A scratch buffer could not be acquired
    #[error("Allocation failure: {0}")]
    Allocation(String),

    /// An update tried to widen a column that is already committed
    #[error("Cannot promote column `{column}` from {from} to {to} at row {row} during an update")]
    PromotionOnUpdate {
        column: String,
        from: DType,
        to: DType,
        row: usize,
    },

    /// Schema-related errors
    #[error("Schema error: {0}")]
    Schema(String),

    /// Type conversion errors
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Invalid argument errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal errors that shouldn't happen
    #[error("Internal error: {0}")]
    Internal(String),

    /// UTF-8 decoding errors
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Result type alias for table operations
pub type Result<T> = std::result::Result<T, TableError>;

impl TableError {
    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        TableError::Configuration(msg.into())
    }

    /// Create a new allocation error
    pub fn allocation<S: Into<String>>(msg: S) -> Self {
        TableError::Allocation(msg.into())
    }

    /// Create a new schema error
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        TableError::Schema(msg.into())
    }

    /// Create a new conversion error
    pub fn conversion<S: Into<String>>(msg: S) -> Self {
        TableError::Conversion(msg.into())
    }

    /// Create a new invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        TableError::InvalidArgument(msg.into())
    }

    /// Whether the failure is fatal for the call and must not be retried
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TableError::Allocation(_))
    }
}

/// Extension trait to add context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, ctx: S) -> Result<T>;

    /// Add context with a closure that's only called on error
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<TableError>,
{
    fn context<S: Into<String>>(self, ctx: S) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            TableError::Internal(format!("{}: {}", ctx.into(), base_error))
        })
    }

    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            TableError::Internal(format!("{}: {}", f().into(), base_error))
        })
    }
}
