//! Error types for BlobVault
//!
//! This module defines the common error types used throughout the system.
//! The core never maps errors to transport status codes itself; the
//! `http_status_code` helper exists for the transport layer sitting above.

use crate::types::FileNameError;
use thiserror::Error;

/// Common result type for BlobVault operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for BlobVault
#[derive(Debug, Error)]
pub enum Error {
    // Lifecycle errors
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid file name: {0}")]
    InvalidFileName(#[from] FileNameError),

    // Collaborator errors, wrapped at the SPI boundary
    #[error("store error: {0}")]
    Store(String),

    #[error("queue error: {0}")]
    Queue(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a new bad request error
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a new store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a new queue error
    pub fn queue(msg: impl Into<String>) -> Self {
        Self::Queue(msg.into())
    }

    /// Create a new cache error
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Create a new serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Check if this is a not found error
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a conflict error
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Get HTTP status code for the transport layer
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Self::BadRequest(_) | Self::InvalidFileName(_) => 400,

            // 404 Not Found
            Self::NotFound(_) => 404,

            // 409 Conflict
            Self::Conflict(_) => 409,

            // 500 Internal Server Error
            Self::Store(_)
            | Self::Queue(_)
            | Self::Cache(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_not_found() {
        assert!(Error::not_found("a.txt").is_not_found());
        assert!(!Error::conflict("a.txt").is_not_found());
    }

    #[test]
    fn test_error_conflict() {
        assert!(Error::conflict("a.txt").is_conflict());
        assert!(!Error::internal("boom").is_conflict());
    }

    #[test]
    fn test_error_http_status() {
        assert_eq!(Error::bad_request("bad name").http_status_code(), 400);
        assert_eq!(Error::not_found("a.txt").http_status_code(), 404);
        assert_eq!(Error::conflict("a.txt").http_status_code(), 409);
        assert_eq!(Error::internal("boom").http_status_code(), 500);
        assert_eq!(Error::cache("down").http_status_code(), 500);
    }
}
