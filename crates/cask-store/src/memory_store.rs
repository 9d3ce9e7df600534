//! In-memory blob store.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use cask_types::{BlobRef, BlobStat, StatResponse, UploadResponse};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::traits::BlobStore;

/// Default maximum payload bytes per upload request (32 MiB).
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 32 << 20;

const UPLOAD_URL_PREFIX: &str = "memory://upload/";

/// In-memory blob store backed by a `RwLock<HashMap>`.
///
/// The reference implementation of the store protocol, used by tests
/// and memory-only setups. It verifies content hashes on upload (a blob
/// whose bytes don't match its claimed ref is not received), enforces
/// the per-request upload size limit, and hands out a fresh upload URL
/// with every response. `stat`/`upload` calls are counted so tests can
/// assert batching behavior.
pub struct MemoryStore {
    blobs: RwLock<HashMap<BlobRef, Bytes>>,
    max_upload_size: u64,
    upload_seq: AtomicU64,
    stat_calls: AtomicU64,
    upload_calls: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store with the default upload size limit.
    pub fn new() -> Self {
        Self::with_max_upload_size(DEFAULT_MAX_UPLOAD_SIZE)
    }

    /// Create an empty store with an explicit upload size limit.
    pub fn with_max_upload_size(max_upload_size: u64) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            max_upload_size,
            upload_seq: AtomicU64::new(0),
            stat_calls: AtomicU64::new(0),
            upload_calls: AtomicU64::new(0),
        }
    }

    /// Store a blob directly, bypassing the upload protocol.
    pub fn insert(&self, data: impl Into<Bytes>) -> BlobRef {
        let data = data.into();
        let blob_ref = BlobRef::from_data(&data);
        let mut map = self.blobs.write().expect("lock poisoned");
        map.insert(blob_ref, data);
        blob_ref
    }

    /// Check whether a blob is stored.
    pub fn contains(&self, blob_ref: BlobRef) -> bool {
        let map = self.blobs.read().expect("lock poisoned");
        map.contains_key(&blob_ref)
    }

    /// Number of blobs stored.
    pub fn blob_count(&self) -> usize {
        let map = self.blobs.read().expect("lock poisoned");
        map.len()
    }

    /// Number of `stat` requests served.
    pub fn stat_calls(&self) -> u64 {
        self.stat_calls.load(Ordering::SeqCst)
    }

    /// Number of `upload` requests served.
    pub fn upload_calls(&self) -> u64 {
        self.upload_calls.load(Ordering::SeqCst)
    }

    fn next_upload_url(&self) -> String {
        let seq = self.upload_seq.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{UPLOAD_URL_PREFIX}{seq}")
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryStore {
    async fn stat(&self, refs: &[BlobRef]) -> Result<StatResponse, StoreError> {
        self.stat_calls.fetch_add(1, Ordering::SeqCst);
        let map = self.blobs.read().expect("lock poisoned");
        let stat = refs
            .iter()
            .filter_map(|blob_ref| {
                map.get(blob_ref).map(|data| BlobStat {
                    blob_ref: *blob_ref,
                    size: data.len() as u64,
                })
            })
            .collect::<Vec<_>>();
        debug!(queried = refs.len(), present = stat.len(), "stat");
        Ok(StatResponse {
            stat,
            upload_url: self.next_upload_url(),
            max_upload_size: self.max_upload_size,
        })
    }

    async fn upload(
        &self,
        upload_url: &str,
        blobs: Vec<(BlobRef, Bytes)>,
    ) -> Result<UploadResponse, StoreError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);

        if !upload_url.starts_with(UPLOAD_URL_PREFIX) {
            return Err(StoreError::BadUploadUrl(upload_url.to_string()));
        }
        let total: u64 = blobs.iter().map(|(_, data)| data.len() as u64).sum();
        if total > self.max_upload_size {
            return Err(StoreError::Transport(format!(
                "upload of {total} bytes exceeds max upload size {}",
                self.max_upload_size
            )));
        }

        let mut map = self.blobs.write().expect("lock poisoned");
        let mut received = Vec::with_capacity(blobs.len());
        for (blob_ref, data) in blobs {
            let computed = BlobRef::from_data(&data);
            if computed != blob_ref {
                warn!(claimed = %blob_ref, %computed, "upload hash mismatch, blob dropped");
                continue;
            }
            let size = data.len() as u64;
            debug!(%blob_ref, size, "storing blob in memory");
            map.insert(blob_ref, data);
            received.push(BlobStat { blob_ref, size });
        }
        Ok(UploadResponse {
            received,
            upload_url: self.next_upload_url(),
        })
    }

    async fn fetch(&self, blob_ref: BlobRef) -> Result<Option<Bytes>, StoreError> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.get(&blob_ref).cloned())
    }
}
