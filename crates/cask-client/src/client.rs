//! Dedup-aware batched blob upload.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;
use cask_store::BlobStore;
use cask_types::{BlobRef, BlobStat, ClientConfig, StatResponse};
use tracing::{debug, info, warn};

use crate::error::ClientError;

/// Outcome of one [`BlobClient::put_blobs`] invocation.
///
/// `received` and `skipped` together are the successful hashes;
/// `failed` is everything requested that neither confirmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutBlobsResult {
    /// Blobs newly uploaded in this call.
    pub received: Vec<BlobStat>,
    /// Blobs the store already had; nothing was sent.
    pub skipped: Vec<BlobStat>,
    /// Requested hashes that were neither received nor skipped.
    pub failed: BTreeSet<BlobRef>,
}

impl PutBlobsResult {
    /// Union of received and skipped refs.
    pub fn success(&self) -> BTreeSet<BlobRef> {
        self.received
            .iter()
            .chain(self.skipped.iter())
            .map(|stat| stat.blob_ref)
            .collect()
    }
}

/// Client over a [`BlobStore`] capability.
///
/// Performs dedup-aware, size-bounded batched uploads: hashes are
/// statted first, already-present blobs are skipped, and the rest are
/// packed into upload requests bounded by the store's
/// `max_upload_size`. Batches within one call are sequential because
/// each batch targets the URL returned by the previous response.
#[derive(Clone)]
pub struct BlobClient {
    store: Arc<dyn BlobStore>,
    config: ClientConfig,
}

impl BlobClient {
    /// Client with the default configuration.
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self::with_config(store, ClientConfig::default())
    }

    /// Client with an explicit configuration.
    pub fn with_config(store: Arc<dyn BlobStore>, config: ClientConfig) -> Self {
        Self { store, config }
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Stat refs in batches of at most `stat_batch_limit`.
    ///
    /// Present sets are merged; the freshest response's upload URL and
    /// size limit win.
    pub async fn stat_all(&self, refs: &[BlobRef]) -> Result<StatResponse, ClientError> {
        let limit = self.config.stat_batch_limit.max(1);
        if refs.len() <= limit {
            return Ok(self.store.stat(refs).await?);
        }

        let mut stat = Vec::new();
        let mut upload_url = String::new();
        let mut max_upload_size = 0;
        for batch in refs.chunks(limit) {
            let resp = self.store.stat(batch).await?;
            stat.extend(resp.stat);
            upload_url = resp.upload_url;
            max_upload_size = resp.max_upload_size;
        }
        Ok(StatResponse {
            stat,
            upload_url,
            max_upload_size,
        })
    }

    /// Upload blobs, skipping whatever the store already has.
    ///
    /// Missing blobs are packed into upload batches bounded by the
    /// store's size limit; a failed batch loses only its own blobs and
    /// is not retried here (uploads are content-keyed, so the caller can
    /// always re-issue). Returns the received/skipped partition, or
    /// [`ClientError::UploadIncomplete`] carrying it when any requested
    /// hash was neither received nor skipped.
    pub async fn put_blobs(&self, blobs: Vec<Bytes>) -> Result<PutBlobsResult, ClientError> {
        // Hash everything, dropping duplicates but preserving first-seen
        // order.
        let mut seen = HashSet::new();
        let mut ordered: Vec<(BlobRef, Bytes)> = Vec::with_capacity(blobs.len());
        for blob in blobs {
            let blob_ref = BlobRef::from_data(&blob);
            if seen.insert(blob_ref) {
                ordered.push((blob_ref, blob));
            }
        }
        let requested: Vec<BlobRef> = ordered.iter().map(|(blob_ref, _)| *blob_ref).collect();

        info!(blobs = requested.len(), "put_blobs: starting upload");

        let stat = self.stat_all(&requested).await?;
        let present: HashMap<BlobRef, u64> = stat
            .stat
            .iter()
            .map(|stat| (stat.blob_ref, stat.size))
            .collect();
        let mut upload_url = stat.upload_url;
        let max_upload_size = stat.max_upload_size;

        let mut result = PutBlobsResult::default();
        let mut missing = Vec::new();
        for (blob_ref, blob) in ordered {
            match present.get(&blob_ref) {
                Some(&size) => result.skipped.push(BlobStat { blob_ref, size }),
                None => missing.push((blob_ref, blob)),
            }
        }
        debug!(
            missing = missing.len(),
            skipped = result.skipped.len(),
            "stat partitioned blobs"
        );

        // Pack missing blobs into size-bounded batches. Each flush
        // yields the URL for the next batch.
        let mut batch: Vec<(BlobRef, Bytes)> = Vec::new();
        let mut batch_size = 0u64;
        for (blob_ref, blob) in missing {
            let blob_size = blob.len() as u64;
            if !batch.is_empty() && batch_size + blob_size > max_upload_size {
                self.flush_batch(&mut upload_url, std::mem::take(&mut batch), &mut result)
                    .await;
                batch_size = 0;
            }
            if blob_size > max_upload_size {
                warn!(
                    %blob_ref,
                    size = blob_size,
                    max_upload_size,
                    "blob exceeds max upload size, sending alone"
                );
            }
            batch_size += blob_size;
            batch.push((blob_ref, blob));
        }
        if !batch.is_empty() {
            self.flush_batch(&mut upload_url, batch, &mut result).await;
        }

        let confirmed: HashSet<BlobRef> = result
            .received
            .iter()
            .chain(result.skipped.iter())
            .map(|stat| stat.blob_ref)
            .collect();
        result.failed = requested
            .iter()
            .filter(|blob_ref| !confirmed.contains(*blob_ref))
            .copied()
            .collect();

        if !result.failed.is_empty() {
            warn!(failed = result.failed.len(), "put_blobs: upload incomplete");
            return Err(ClientError::UploadIncomplete { result });
        }
        info!(
            received = result.received.len(),
            skipped = result.skipped.len(),
            "put_blobs: upload complete"
        );
        Ok(result)
    }

    /// Upload a single blob, returning its ref.
    pub async fn put_blob(&self, blob: Bytes) -> Result<BlobRef, ClientError> {
        let blob_ref = BlobRef::from_data(&blob);
        self.put_blobs(vec![blob]).await?;
        Ok(blob_ref)
    }

    /// Fetch a blob by ref. `Ok(None)` means the blob is absent.
    pub async fn get_blob(&self, blob_ref: BlobRef) -> Result<Option<Bytes>, ClientError> {
        Ok(self.store.fetch(blob_ref).await?)
    }

    /// Issue one upload batch. A failure loses only this batch: the
    /// error is logged, its blobs end up in the failed set, and later
    /// batches reuse the last known URL.
    async fn flush_batch(
        &self,
        upload_url: &mut String,
        batch: Vec<(BlobRef, Bytes)>,
        result: &mut PutBlobsResult,
    ) {
        debug!(blobs = batch.len(), "uploading batch");
        match self.store.upload(upload_url, batch).await {
            Ok(resp) => {
                result.received.extend(resp.received);
                *upload_url = resp.upload_url;
            }
            Err(err) => {
                warn!(error = %err, "upload batch failed");
            }
        }
    }
}
