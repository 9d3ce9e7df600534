//! Chunk → encode → upload pipeline for whole streams.

use bytes::Bytes;
use cask_cas::{ByteSource, Chunker, encode_spans};
use cask_types::{BlobRef, Part, Schema};
use tracing::{debug, info};

use crate::client::{BlobClient, PutBlobsResult};
use crate::error::ClientError;

/// Counters for one writer's upload activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Blobs newly uploaded.
    pub uploaded: u64,
    /// Bytes newly uploaded.
    pub uploaded_bytes: u64,
    /// Blobs the store already had.
    pub skipped: u64,
    /// Bytes skipped as already present.
    pub skipped_bytes: u64,
}

impl WriteStats {
    fn record(&mut self, result: &PutBlobsResult) {
        for stat in &result.received {
            self.uploaded += 1;
            self.uploaded_bytes += stat.size;
        }
        for stat in &result.skipped {
            self.skipped += 1;
            self.skipped_bytes += stat.size;
        }
    }
}

/// Writes a byte stream to the store as a chunk tree.
///
/// Drives the [`Chunker`] over a [`ByteSource`], queueing flushed
/// chunks and uploading them in groups of `upload_queue_len` while the
/// scan is still running, so memory stays bounded by the queue rather
/// than the stream. The resulting span tree is encoded into schemas,
/// nested schema blobs are uploaded, and the root schema ref is
/// returned.
pub struct FileWriter {
    client: BlobClient,
    queue: Vec<Bytes>,
    stats: WriteStats,
}

impl FileWriter {
    /// Writer over the given client.
    pub fn new(client: BlobClient) -> Self {
        Self {
            client,
            queue: Vec::new(),
            stats: WriteStats::default(),
        }
    }

    /// Upload counters accumulated by this writer.
    pub fn stats(&self) -> WriteStats {
        self.stats
    }

    /// Write a stream and return the ref of its root Bytes schema.
    pub async fn put_bytes(&mut self, source: ByteSource) -> Result<BlobRef, ClientError> {
        let (parts, _) = self.write_parts(source).await?;
        let root = Schema::bytes(parts);
        let root_ref = self
            .client
            .put_blob(Bytes::from(root.canonical_bytes()?))
            .await?;
        self.log_report();
        Ok(root_ref)
    }

    /// Write a stream and return the ref of its File schema.
    ///
    /// When chunking needed no nested schema, the chunk parts are
    /// inlined into the File schema directly; otherwise the File schema
    /// carries a single `bytesRef` part naming the uploaded root Bytes
    /// schema.
    pub async fn put_file(
        &mut self,
        file_name: Option<&str>,
        source: ByteSource,
    ) -> Result<BlobRef, ClientError> {
        let total_size = source.len();
        let (parts, nested_count) = self.write_parts(source).await?;

        let file = if nested_count == 0 {
            Schema::file(file_name.map(str::to_owned), parts)
        } else {
            let root = Schema::bytes(parts);
            let root_ref = self
                .client
                .put_blob(Bytes::from(root.canonical_bytes()?))
                .await?;
            Schema::file(
                file_name.map(str::to_owned),
                vec![Part::Bytes {
                    bytes_ref: root_ref,
                    size: total_size,
                }],
            )
        };

        let file_ref = self
            .client
            .put_blob(Bytes::from(file.canonical_bytes()?))
            .await?;
        self.log_report();
        Ok(file_ref)
    }

    /// Chunk the source, uploading along the way; returns the root
    /// parts list and how many nested schemas were built.
    async fn write_parts(
        &mut self,
        source: ByteSource,
    ) -> Result<(Vec<Part>, usize), ClientError> {
        let total = source.len();
        info!(total, "file write: chunking");

        let mut chunker = Chunker::new(source);
        while let Some(chunk) = chunker.next_chunk()? {
            self.queue.push(chunk.data);
            if self.queue.len() >= self.client.config().upload_queue_len {
                self.flush_queue().await?;
            }
        }
        let spans = chunker.into_spans();
        debug!(spans = spans.len(), "chunking complete");

        let (parts, nested) = encode_spans(&spans)?;
        let nested_count = nested.len();
        for schema_blob in nested {
            self.queue.push(schema_blob.bytes);
        }
        self.flush_queue().await?;

        Ok((parts, nested_count))
    }

    async fn flush_queue(&mut self) -> Result<(), ClientError> {
        if self.queue.is_empty() {
            return Ok(());
        }
        let blobs = std::mem::take(&mut self.queue);
        let result = self.client.put_blobs(blobs).await?;
        self.stats.record(&result);
        Ok(())
    }

    fn log_report(&self) {
        info!(
            uploaded = self.stats.uploaded,
            uploaded_bytes = self.stats.uploaded_bytes,
            skipped = self.stats.skipped,
            skipped_bytes = self.stats.skipped_bytes,
            "file write complete"
        );
    }
}
