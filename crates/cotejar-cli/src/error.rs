//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cotejar library error
    #[error("{0}")]
    Cotejar(#[from] cotejar::CotejarError),
}

impl CliError {
    /// Create an invalid-argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_display_carries_the_message() {
        let err = CliError::invalid_argument("unknown metric 'MSSIM'");
        assert!(err.to_string().contains("MSSIM"));
    }

    #[test]
    fn library_errors_convert_transparently() {
        let err: CliError = cotejar::CotejarError::shape_mismatch([4, 4, 3], [8, 8, 3]).into();
        assert!(matches!(err, CliError::Cotejar(_)));
    }
}
