//! Error types for chunking and encoding.

use cask_types::SchemaError;

/// Errors that can occur while chunking a source or encoding its tree.
#[derive(Debug, thiserror::Error)]
pub enum CasError {
    /// An I/O error occurred while reading the source.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema serialization failed while encoding the chunk tree.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The source yielded a different number of bytes than it declared.
    #[error("source declared {declared} bytes but yielded {read}")]
    SourceSizeMismatch {
        /// Length the source declared up front.
        declared: u64,
        /// Bytes actually read before end of stream.
        read: u64,
    },
}
