//! Convenience result type alias.

use crate::error::StoreError;

/// A specialized `Result` type for session store operations.
pub type StoreResult<T> = Result<T, StoreError>;
