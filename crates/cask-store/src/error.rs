//! Error types for blob-store operations.

/// Errors that can occur at the blob-store boundary.
///
/// Transport failures are surfaced, never auto-retried here; retry
/// policy belongs to the caller.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A network round trip failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The upload URL was not one this store issued.
    #[error("bad upload url: {0:?}")]
    BadUploadUrl(String),
}
