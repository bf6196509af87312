//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// One or more scenarios failed
    #[error("Verification failed: {message}")]
    Verification {
        /// Error message
        message: String,
    },

    /// Command needs a feature this binary was built without
    #[error("Feature not enabled: {message}")]
    FeatureDisabled {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON rendering error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Formprobe library error
    #[error("Formprobe error: {0}")]
    Probe(#[from] formprobe::ProbeError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a verification error
    #[must_use]
    pub fn verification(message: impl Into<String>) -> Self {
        Self::Verification {
            message: message.into(),
        }
    }

    /// Create a feature-disabled error
    #[must_use]
    pub fn feature_disabled(message: impl Into<String>) -> Self {
        Self::FeatureDisabled {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("bad config");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("bad config"));
    }

    #[test]
    fn test_verification_error() {
        let err = CliError::verification("2 scenario(s) failed");
        assert_eq!(err.to_string(), "Verification failed: 2 scenario(s) failed");
    }

    #[test]
    fn test_probe_error_from() {
        let err: CliError = formprobe::ProbeError::configuration("empty catalog").into();
        assert!(err.to_string().starts_with("Formprobe error"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(cli_err.to_string().contains("I/O"));
    }
}
