//! Error types for sheetsync-core

/// Result type for sheetsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sheetsync-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Project missing, manifest table missing/empty/corrupt, or bad config
    #[error("Configuration error: {0}")]
    Config(String),

    /// The operation would break a project invariant; nothing was written
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A call into the remote spreadsheet failed
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// User-supplied data failed validation before any mutation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from sheetsync-fs
    #[error(transparent)]
    Fs(#[from] sheetsync_fs::Error),

    /// Table error from sheetsync-table
    #[error(transparent)]
    Table(#[from] sheetsync_table::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Manifest table (de)serialization error
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// A failed remote call, tagged with the operation that failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Remote call '{operation}' failed: {message}")]
pub struct RemoteError {
    pub operation: String,
    pub message: String,
}

impl RemoteError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}
