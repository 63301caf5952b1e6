//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Registro library error
    #[error("{0}")]
    Registro(#[from] registro::RegistroError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = CliError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.to_string(), "I/O error: gone");
    }

    #[test]
    fn test_registro_error_passthrough() {
        let err = CliError::from(registro::RegistroError::assertion("nope"));
        assert_eq!(err.to_string(), "Assertion failed: nope");
    }
}
