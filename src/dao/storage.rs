//! Failures of the server-side room store.

use thiserror::Error;

/// Result alias for room store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Why the room store refused a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// A new room would exceed the configured room limit.
    #[error("room store is full ({limit} rooms)")]
    CapacityReached {
        /// Maximum number of rooms held at once.
        limit: usize,
    },
}
