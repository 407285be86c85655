//! Error types for the session store.
//!
//! All backend and serialization failures are mapped into [`StoreError`]
//! for consistent propagation through the ? operator. Absence of a session
//! is never an error: `get` surfaces missing and expired sessions as
//! `Ok(None)`.

use std::fmt;

use thiserror::Error;

/// Top-level error kind categorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// A failure from the underlying key-value client (network, auth,
    /// throttling). Propagated unchanged; the store never retries.
    Backend,
    /// A stored payload could not be serialized or deserialized.
    Serialization,
    /// The scan step of a reap pass failed; the pass is aborted.
    Scan,
    /// Invalid construction-time configuration.
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend => write!(f, "BACKEND"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Scan => write!(f, "SCAN"),
            Self::Configuration => write!(f, "CONFIGURATION"),
        }
    }
}

/// The unified error type used throughout the crate.
///
/// Backend-specific errors are mapped into `StoreError` with `From` impls
/// or explicit `.map_err()` calls, keeping a single error type at the
/// public API boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct StoreError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    /// Create a new store error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new store error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Backend, message)
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    /// Create a scan error.
    pub fn scan(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Scan, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }
}

impl Clone for StoreError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}
