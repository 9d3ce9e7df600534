//! A [`BlobStore`] wrapper that loses data on upload.
//!
//! `LossyStore` wraps any `Arc<dyn BlobStore>` and silently drops
//! configured refs from upload payloads, so they are never stored and
//! never confirmed. It can also fail the first N upload calls outright.
//! Used in tests to drive the incomplete-upload reporting path.
//!
//! # Example
//!
//! ```ignore
//! let lossy = LossyStore::new(inner)
//!     .drop_ref(doomed_ref)
//!     .fail_uploads(1); // first upload call errors
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use cask_types::{BlobRef, StatResponse, UploadResponse};

use crate::error::StoreError;
use crate::traits::BlobStore;

/// A [`BlobStore`] wrapper that injects upload faults.
pub struct LossyStore {
    inner: Arc<dyn BlobStore>,
    drop_refs: HashSet<BlobRef>,
    fail_uploads: AtomicU64,
}

impl LossyStore {
    /// Wrap an existing store as a fault-free pass-through.
    pub fn new(inner: Arc<dyn BlobStore>) -> Self {
        Self {
            inner,
            drop_refs: HashSet::new(),
            fail_uploads: AtomicU64::new(0),
        }
    }

    /// Silently drop this ref from every upload payload.
    pub fn drop_ref(mut self, blob_ref: BlobRef) -> Self {
        self.drop_refs.insert(blob_ref);
        self
    }

    /// Silently drop all of these refs from every upload payload.
    pub fn drop_refs(mut self, refs: impl IntoIterator<Item = BlobRef>) -> Self {
        self.drop_refs.extend(refs);
        self
    }

    /// Fail the next `count` upload calls with a transport error.
    pub fn fail_uploads(self, count: u64) -> Self {
        self.fail_uploads.store(count, Ordering::SeqCst);
        self
    }
}

#[async_trait::async_trait]
impl BlobStore for LossyStore {
    async fn stat(&self, refs: &[BlobRef]) -> Result<StatResponse, StoreError> {
        self.inner.stat(refs).await
    }

    async fn upload(
        &self,
        upload_url: &str,
        blobs: Vec<(BlobRef, Bytes)>,
    ) -> Result<UploadResponse, StoreError> {
        let fail = self
            .fail_uploads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(StoreError::Transport("injected upload failure".to_string()));
        }

        let kept = blobs
            .into_iter()
            .filter(|(blob_ref, _)| !self.drop_refs.contains(blob_ref))
            .collect();
        self.inner.upload(upload_url, kept).await
    }

    async fn fetch(&self, blob_ref: BlobRef) -> Result<Option<Bytes>, StoreError> {
        self.inner.fetch(blob_ref).await
    }
}
