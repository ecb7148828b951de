//! Error types for certload-core
//!
//! Every error is contained at the iteration boundary: the scenario driver
//! logs and counts it, it never aborts the run.

use certload_crypto::CryptoError;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Key generation or signature handling failed
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Connection-level failure
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded the transport timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Response did not follow the expected contract
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Status code did not match the expected one
    #[error("expected status {expected}, got {actual}")]
    Assertion {
        /// Expected status code
        expected: u16,
        /// Observed status code
        actual: u16,
    },

    /// Invalid configuration
    #[error("invalid configuration: {field}")]
    InvalidConfig {
        /// Config field name
        field: String,
        /// Detailed message
        message: String,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error taxonomy used for per-iteration accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Random source or key material failure
    RandomSource,
    /// Connection failure or timeout
    Network,
    /// Missing field, bad JSON, unexpected status from a collaborator
    Protocol,
    /// Check failed on the final response
    Assertion,
    /// Bad configuration
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RandomSource => write!(f, "random_source"),
            Self::Network => write!(f, "network"),
            Self::Protocol => write!(f, "protocol"),
            Self::Assertion => write!(f, "assertion"),
            Self::Config => write!(f, "config"),
        }
    }
}

impl Error {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Crypto(CryptoError::RandomSource(_)) => ErrorKind::RandomSource,
            Error::Crypto(_) | Error::Protocol(_) => ErrorKind::Protocol,
            Error::Network(_) | Error::Timeout(_) => ErrorKind::Network,
            Error::Assertion { .. } => ErrorKind::Assertion,
            Error::InvalidConfig { .. } => ErrorKind::Config,
        }
    }

    /// Shorthand for a configuration error.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Trait for user-friendly error messages
///
/// Provides human-readable error messages and suggestions for fixing.
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to fix the error
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::Crypto(e) => format!("Key material error: {}", e),
            Error::Network(msg) => format!("Network connection problem: {}", msg),
            Error::Timeout(msg) => format!("Request timed out: {}", msg),
            Error::Protocol(msg) => format!("Unexpected response: {}", msg),
            Error::Assertion { expected, actual } => {
                format!("Check failed: expected status {}, got {}", expected, actual)
            }
            Error::InvalidConfig { field, message } => {
                format!("Configuration error in '{}': {}", field, message)
            }
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::Network(_) | Error::Timeout(_) => Some(
                "Check that the certificate service and gateway are reachable.".to_string(),
            ),
            Error::Protocol(_) => Some(
                "Verify the endpoints point at a certificate service and an auth gateway."
                    .to_string(),
            ),
            Error::InvalidConfig { field, .. } => Some(format!(
                "Check the '{}' setting in config/default.toml or the CERTLOAD_* environment.",
                field
            )),
            _ => None,
        }
    }
}

/// Format an error for display in the CLI
pub fn format_error_for_cli(error: &Error) -> String {
    let mut output = error.user_message();

    if let Some(suggestion) = error.suggestion() {
        output.push_str("\n\n");
        output.push_str(&suggestion);
    }

    output.push('\n');
    output
}
