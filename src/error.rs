//! Error types for the bucketkv library.

use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for object storage access.
#[derive(Error, Debug)]
pub enum Error {
    /// Key (or multipart upload) absent from the store
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed key, filter, cursor, or part list
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Object store call failed (network, permission, throttling)
    #[error("object store failure: {0}")]
    Upstream(String),

    /// Multipart upload failed after at least one part succeeded.
    ///
    /// The upload id has been aborted (best effort); the original cause is
    /// carried as the source.
    #[error("multipart upload aborted: {source}")]
    UploadAborted {
        /// Failure that triggered the abort
        source: Box<Error>,
    },

    /// Value could not be encoded or decoded
    #[error("codec error: {0}")]
    Codec(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error from a byte stream producer
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the error reports an absent key.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Codec(err.to_string())
    }
}
