//! Error types for sheetsync-table

/// Result type for sheetsync-table operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while addressing, reading or writing tables
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed A1 cell address
    #[error("Invalid cell address '{0}'")]
    InvalidAddress(String),

    /// Malformed or inverted A1 range
    #[error("Invalid range '{0}'")]
    InvalidRange(String),

    /// Filesystem error from sheetsync-fs
    #[error(transparent)]
    Fs(#[from] sheetsync_fs::Error),

    /// Delimited-text parse or write error
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
