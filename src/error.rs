//! Capability error types
//!
//! Errors raised by injected browser capabilities. None of these propagate out
//! of the enhancement layer: callers convert them into log lines or visible,
//! non-blocking UI state.

use thiserror::Error;

/// Key-value persistence failed (storage disabled, quota exceeded, ...)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("Storage unavailable")]
    Unavailable,

    #[error("Storage rejected write for key {key}: {reason}")]
    Rejected { key: String, reason: String },
}

/// Clipboard write failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClipboardError {
    #[error("Clipboard unavailable")]
    Unavailable,

    #[error("Clipboard write denied: {0}")]
    Denied(String),
}

/// Network request failed before a response was received
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Failed to read response body: {0}")]
    Body(String),
}
