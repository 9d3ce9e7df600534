//! Error types for the client.

use cask_cas::CasError;
use cask_store::StoreError;
use cask_types::{BlobRef, SchemaError};

use crate::client::PutBlobsResult;

/// Errors that can occur during client operations.
///
/// Failures are aggregated per operation rather than aborting on the
/// first error: an incomplete upload carries the complete
/// received/skipped/failed partition so the caller can decide what to
/// retry.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A network round trip failed.
    #[error("transport error: {0}")]
    Transport(#[from] StoreError),

    /// A requested blob is absent from the store.
    #[error("blob not found: {0}")]
    NotFound(BlobRef),

    /// A schema blob could not be decoded.
    #[error("malformed schema: {0}")]
    MalformedSchema(#[from] SchemaError),

    /// Chunking the source failed.
    #[error("chunking error: {0}")]
    Chunking(#[from] CasError),

    /// Some blobs were neither received nor skipped after all batches.
    #[error("upload incomplete: {} blobs unconfirmed", .result.failed.len())]
    UploadIncomplete {
        /// The full received/skipped/failed partition of the request.
        result: PutBlobsResult,
    },

    /// Assembled bytes for a part are fewer than its declared size.
    #[error("short read for {blob_ref}: declared {declared} bytes, assembled {got}")]
    ShortRead {
        /// The part whose content came up short.
        blob_ref: BlobRef,
        /// Size the schema declared.
        declared: u64,
        /// Bytes actually assembled.
        got: u64,
    },
}
