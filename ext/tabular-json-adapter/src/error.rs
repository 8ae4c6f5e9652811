use tabular_core::TableError;
use thiserror::Error;

/// Errors raised while translating JSON documents for the core
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Failures from ingestion or export
    #[error(transparent)]
    Core(#[from] TableError),

    /// Malformed JSON text
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Well-formed JSON of a shape that cannot be ingested
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unrecognized option value
    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

pub type Result<T> = std::result::Result<T, AdapterError>;

impl AdapterError {
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        AdapterError::InvalidInput(msg.into())
    }

    pub fn invalid_option<S: Into<String>>(msg: S) -> Self {
        AdapterError::InvalidOption(msg.into())
    }

    /// Whether the failure must not be retried
    pub fn is_fatal(&self) -> bool {
        match self {
            AdapterError::Core(e) => e.is_fatal(),
            _ => true,
        }
    }
}

/// Extension trait to add context to errors
pub trait ErrorContext<T> {
    fn context<S: Into<String>>(self, ctx: S) -> Result<T>;

    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AdapterError>,
{
    fn context<S: Into<String>>(self, ctx: S) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            AdapterError::InvalidInput(format!("{}: {}", ctx.into(), base_error))
        })
    }

    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            AdapterError::InvalidInput(format!("{}: {}", f().into(), base_error))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_pass_through() {
        let err: AdapterError = TableError::configuration("Unknown type 'x' for key 'y'").into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Unknown type 'x' for key 'y'"
        );
        assert!(err.is_fatal());

        let err: AdapterError = TableError::allocation("no room").into();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_context() {
        let result: std::result::Result<(), AdapterError> =
            Err(AdapterError::invalid_input("expected an object"));
        let err = result.context("Row 3").unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: Row 3: Invalid input: expected an object");
    }
}
