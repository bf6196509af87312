//! Result and error types for formprobe.

use thiserror::Error;

/// Result type for formprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that abort a scenario.
///
/// None of these are retried by the engine. An unmapped dropdown field is
/// not an error: it resolves to ordinal 0 (see [`crate::resolve_dropdown_ordinal`]).
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A required UI or network condition did not occur within its bound
    #[error("Timed out after {elapsed_ms}ms waiting for {address}")]
    WaitTimeout {
        /// Element address or URL pattern that was awaited
        address: String,
        /// Time spent waiting
        elapsed_ms: u64,
    },

    /// A verified value differs from the expected one
    #[error("Mismatch on '{field}': expected '{expected}' but got '{actual}'")]
    AssertionMismatch {
        /// Field that was verified
        field: String,
        /// Expected value
        expected: String,
        /// Observed value
        actual: String,
    },

    /// A continuous-range control has no measurable bounding box
    #[error("No bounding box for {address}")]
    MissingGeometry {
        /// Address of the control
        address: String,
    },

    /// The catalog or configuration is unusable
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// A string could not be read as a numeric amount
    #[error("Invalid amount '{input}' for {locale}")]
    InvalidAmount {
        /// The rejected input
        input: String,
        /// Locale the input was read under
        locale: String,
    },

    /// A read targeted an element that is not in the page
    #[error("Element not found: {address}")]
    ElementNotFound {
        /// Address of the element
        address: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// The driver rejected or failed an interaction
    #[error("Driver error: {message}")]
    Driver {
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

impl ProbeError {
    /// Create an assertion mismatch
    #[must_use]
    pub fn mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::AssertionMismatch {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Check if this is a verification failure (as opposed to an environment failure)
    #[must_use]
    pub const fn is_mismatch(&self) -> bool {
        matches!(self, Self::AssertionMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_message_names_field_and_values() {
        let err = ProbeError::mismatch("loanGoal", "Equity", "Vehicles");
        let msg = err.to_string();
        assert!(msg.contains("loanGoal"));
        assert!(msg.contains("'Equity'"));
        assert!(msg.contains("'Vehicles'"));
        assert!(err.is_mismatch());
    }

    #[test]
    fn test_wait_timeout_message() {
        let err = ProbeError::WaitTimeout {
            address: "input[type=\"range\"]".to_string(),
            elapsed_ms: 5000,
        };
        assert_eq!(
            err.to_string(),
            "Timed out after 5000ms waiting for input[type=\"range\"]"
        );
        assert!(!err.is_mismatch());
    }

    #[test]
    fn test_json_error_converts() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: ProbeError = parse.unwrap_err().into();
        assert!(matches!(err, ProbeError::Json(_)));
    }
}
