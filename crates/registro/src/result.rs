//! Result and error types for Registro.

use thiserror::Error;

/// Result type for Registro operations
pub type RegistroResult<T> = Result<T, RegistroError>;

/// Coarse classification of a [`RegistroError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required argument was missing or invalid
    Argument,
    /// A template or variable could not be resolved or formatted
    Format,
    /// A filesystem operation failed
    Io,
    /// A fluent assertion did not hold
    Assertion,
    /// Configuration is invalid
    Config,
    /// JSON/YAML encoding or decoding failed
    Serialization,
}

/// Errors that can occur in Registro
#[derive(Debug, Error)]
pub enum RegistroError {
    /// Required argument was not supplied
    #[error("Value cannot be null or empty. (Parameter '{argument}')")]
    MissingArgument {
        /// Argument name
        argument: &'static str,
    },

    /// Argument was supplied but is not acceptable
    #[error("Invalid argument '{argument}': {message}")]
    InvalidArgument {
        /// Argument name
        argument: &'static str,
        /// Error message
        message: String,
    },

    /// Variable lookup failed
    #[error("Variable \"{key}\" is not defined")]
    VariableNotFound {
        /// Variable key
        key: String,
    },

    /// Template contains a placeholder with no matching variable
    #[error("Failed to format \"{template}\": no variable found for key \"{key}\"")]
    UnresolvedPlaceholder {
        /// Missing key
        key: String,
        /// Template being resolved
        template: String,
    },

    /// Template braces are unbalanced
    #[error("Failed to format \"{template}\": {message}")]
    MalformedTemplate {
        /// Template being resolved
        template: String,
        /// Error message
        message: String,
    },

    /// Placeholder format specifier is not valid for the value
    #[error("Invalid format \"{format}\" for variable \"{key}\": {message}")]
    InvalidFormat {
        /// Variable key
        key: String,
        /// Format specifier
        format: String,
        /// Error message
        message: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl RegistroError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Classify the error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingArgument { .. } | Self::InvalidArgument { .. } => ErrorKind::Argument,
            Self::VariableNotFound { .. }
            | Self::UnresolvedPlaceholder { .. }
            | Self::MalformedTemplate { .. }
            | Self::InvalidFormat { .. } => ErrorKind::Format,
            Self::AssertionFailed { .. } => ErrorKind::Assertion,
            Self::Config { .. } => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
            Self::Json(_) | Self::Yaml(_) => ErrorKind::Serialization,
        }
    }

    /// Check if this is a missing-argument error
    #[must_use]
    pub const fn is_missing_argument(&self) -> bool {
        matches!(self, Self::MissingArgument { .. })
    }

    /// Check if this is a template/variable format error
    #[must_use]
    pub const fn is_format_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_argument_message() {
        let err = RegistroError::MissingArgument {
            argument: "relative_file_path",
        };
        assert_eq!(
            err.to_string(),
            "Value cannot be null or empty. (Parameter 'relative_file_path')"
        );
        assert!(err.is_missing_argument());
        assert_eq!(err.kind(), ErrorKind::Argument);
    }

    #[test]
    fn test_unresolved_placeholder_names_key() {
        let err = RegistroError::UnresolvedPlaceholder {
            key: "missingkey".to_string(),
            template: "start_{missingkey}_end".to_string(),
        };
        assert!(err.to_string().contains("\"missingkey\""));
        assert!(err.is_format_error());
    }

    #[test]
    fn test_kinds_are_distinct() {
        let io = RegistroError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(io.kind(), ErrorKind::Io);
        assert_eq!(RegistroError::assertion("x").kind(), ErrorKind::Assertion);
        assert_eq!(RegistroError::config("x").kind(), ErrorKind::Config);
        assert_eq!(
            RegistroError::VariableNotFound {
                key: "k".to_string()
            }
            .kind(),
            ErrorKind::Format
        );
    }
}
