//! Error types for Weft operations.
//!
//! This module provides a common `Error` type and `Result<T>` alias used
//! across all Weft crates. Uses `thiserror` for derive macros.
//!
//! Most pipeline failures are *not* errors: malformed frontmatter, unsafe
//! references, and failed dimension probes all degrade to safe fallback
//! values at their point of origin. `Error` exists for the I/O and probe
//! plumbing underneath those fallbacks.

use thiserror::Error;

/// Errors that can occur in Weft operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Structural parse failure.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Asset or resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote probe or transport failure.
    #[error("Probe error: {0}")]
    Probe(String),
}

impl Error {
    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a probe error.
    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    /// Create a probe error with an underlying source message.
    pub fn probe_with_source(msg: &str, source: impl std::fmt::Display) -> Self {
        Self::Probe(format!("{}: {}", msg, source))
    }
}

/// Result type alias using Weft's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        assert!(matches!(Error::parse("bad"), Error::Parse(_)));
        assert!(matches!(Error::not_found("x"), Error::NotFound(_)));
        assert!(matches!(Error::probe("net"), Error::Probe(_)));
    }

    #[test]
    fn test_error_display() {
        let err = Error::invalid_data("truncated header");
        assert_eq!(err.to_string(), "Invalid data: truncated header");
    }

    #[test]
    fn test_probe_with_source() {
        let err = Error::probe_with_source("request failed", "timed out");
        assert_eq!(err.to_string(), "Probe error: request failed: timed out");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
