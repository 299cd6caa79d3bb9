//! Error types shared by the local and remote persistence channels.

use std::error::Error;

use thiserror::Error;

type BoxError = Box<dyn Error + Send + Sync>;

/// Convenient result alias returning [`RemoteError`] failures.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failures of the synchronous local key-value store.
#[derive(Debug, Error)]
pub enum LocalStoreError {
    /// Keys map to file names and may not contain path components.
    #[error("invalid storage key `{key}`")]
    InvalidKey {
        /// Rejected key.
        key: String,
    },
    /// Reading or writing the backing file failed.
    #[error("local storage I/O failed for `{path}`")]
    Io {
        /// File being accessed.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// Failures while talking to the remote room store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build HTTP client")]
    ClientBuilder {
        /// Underlying client failure.
        #[source]
        source: BoxError,
    },
    /// The request could not be sent or the connection dropped.
    #[error("failed to send request to `{url}`")]
    RequestSend {
        /// Target URL.
        url: String,
        /// Transport failure.
        #[source]
        source: BoxError,
    },
    /// The server answered with a non-success status.
    #[error("unexpected response status {status} from `{url}`")]
    RequestStatus {
        /// Target URL.
        url: String,
        /// HTTP status received.
        status: u16,
    },
    /// The response body is not a game state.
    #[error("failed to decode response from `{url}`")]
    DecodeResponse {
        /// Target URL.
        url: String,
        /// Decoding failure.
        #[source]
        source: BoxError,
    },
}

impl RemoteError {
    /// Whether the server simply has no data for the room.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::RequestStatus { status: 404, .. })
    }
}

/// Failure of the authoritative local write.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The local store rejected the write.
    #[error(transparent)]
    Local(#[from] LocalStoreError),
    /// The state could not be serialized.
    #[error("failed to encode game state")]
    Encode(#[from] serde_json::Error),
}
