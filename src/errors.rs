//! Structured error handling for the Veridict engine
//!
//! One crate-wide error enum with helper constructors, mirrored by the
//! `VeridictResult` alias used throughout the codebase.

use thiserror::Error;

/// Main error type for the Veridict engine
#[derive(Error, Debug)]
pub enum VeridictError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Ledger operation failed: {operation} - {source}")]
    Ledger {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Baseline store error: {operation} - {message}")]
    Baseline { operation: String, message: String },

    #[error("Evidence scan failed: {message}")]
    Scan { message: String },

    #[error("Numeric anomaly in {context}: {value}")]
    NumericAnomaly { context: String, value: f64 },

    #[error("Cryptographic operation failed: {message}")]
    Crypto { message: String },

    #[error("WORM append failed: {operation}")]
    WormWrite {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("WORM chain verification failed: {reason}")]
    ChainIntegrity { reason: String },

    #[error("I/O operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Report output failed: {message}")]
    Report { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Type alias for Result with VeridictError
pub type VeridictResult<T> = Result<T, VeridictError>;

impl VeridictError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a ledger error
    pub fn ledger(
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Ledger {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// Create a serialization error
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Create a baseline store error
    pub fn baseline(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Baseline {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create an evidence scan error
    pub fn scan(message: impl Into<String>) -> Self {
        Self::Scan {
            message: message.into(),
        }
    }

    /// Create a numeric anomaly error
    pub fn numeric_anomaly(context: impl Into<String>, value: f64) -> Self {
        Self::NumericAnomaly {
            context: context.into(),
            value,
        }
    }

    /// Create a cryptographic error
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Create a WORM write error
    pub fn worm_write(
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::WormWrite {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// Create a chain integrity error
    pub fn chain_integrity(reason: impl Into<String>) -> Self {
        Self::ChainIntegrity {
            reason: reason.into(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a report output error
    pub fn report(message: impl Into<String>) -> Self {
        Self::Report {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for failures that must abort the cycle rather than degrade it.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Ledger { .. }
                | Self::WormWrite { .. }
                | Self::Io { .. }
                | Self::Report { .. }
                | Self::Baseline { .. }
        )
    }
}

/// Convert from sled errors
impl From<sled::Error> for VeridictError {
    fn from(err: sled::Error) -> Self {
        VeridictError::ledger("sled_operation", err)
    }
}

/// Convert from serde_json errors
impl From<serde_json::Error> for VeridictError {
    fn from(err: serde_json::Error) -> Self {
        VeridictError::serialization("json_operation", err)
    }
}

/// Convert from std::io errors
impl From<std::io::Error> for VeridictError {
    fn from(err: std::io::Error) -> Self {
        VeridictError::io("io_operation", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = VeridictError::config("missing veridict.toml");
        assert!(config_err.to_string().contains("Configuration error"));

        let anomaly = VeridictError::numeric_anomaly("delta", f64::NAN);
        assert!(anomaly.to_string().contains("Numeric anomaly"));
    }

    #[test]
    fn test_error_chaining() {
        use std::error::Error;

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = VeridictError::io("reading baseline", io_err);

        assert!(err.source().is_some());
        assert!(err.to_string().contains("I/O operation failed"));
    }

    #[test]
    fn test_structural_classification() {
        let io_err = std::io::Error::other("disk full");
        assert!(VeridictError::io("write report", io_err).is_structural());
        assert!(!VeridictError::scan("bad artifact").is_structural());
    }
}
