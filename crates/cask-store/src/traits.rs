//! Capability interface to a remote blob store.

use bytes::Bytes;
use cask_types::{BlobRef, StatResponse, UploadResponse};

use crate::error::StoreError;

/// The stat/upload/fetch surface of a remote blob store.
///
/// The client core consumes this capability instead of touching server
/// configuration or transport state directly, so stores are swappable
/// and tests can inject faults. All implementations must be
/// `Send + Sync`; payloads are [`Bytes`] so blobs move through the
/// pipeline without copies.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Batched existence query.
    ///
    /// The response lists which of `refs` are already stored (with
    /// sizes) and carries the upload URL and size limit for subsequent
    /// uploads.
    async fn stat(&self, refs: &[BlobRef]) -> Result<StatResponse, StoreError>;

    /// One multi-part upload of `blobs` to `upload_url`.
    ///
    /// The response lists what the server confirmed and the URL for the
    /// next batch. Uploads are idempotent: blobs are content-hash keyed,
    /// so re-issuing an identical upload is always safe.
    async fn upload(
        &self,
        upload_url: &str,
        blobs: Vec<(BlobRef, Bytes)>,
    ) -> Result<UploadResponse, StoreError>;

    /// Fetch a blob by content hash.
    ///
    /// `None` means the blob is absent from the store; transport
    /// failures are errors. The two outcomes are never conflated.
    async fn fetch(&self, blob_ref: BlobRef) -> Result<Option<Bytes>, StoreError>;
}
