//! Wire records of the remote blob-store protocol.
//!
//! Three round trips: `STAT` (which refs exist, plus upload parameters),
//! `UPLOAD` (multi-part upload of missing blobs), and `FETCH` (raw bytes
//! by ref, handled as plain payloads rather than a record type).

use serde::{Deserialize, Serialize};

use crate::BlobRef;

/// One stored blob as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobStat {
    /// Content address of the blob.
    pub blob_ref: BlobRef,
    /// Stored size in bytes.
    pub size: u64,
}

/// Response to a batched existence query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatResponse {
    /// The subset of the queried refs that are already stored.
    pub stat: Vec<BlobStat>,
    /// Target URL for the next upload batch.
    pub upload_url: String,
    /// Maximum total payload bytes accepted per upload request.
    pub max_upload_size: u64,
}

/// Response to a multi-part upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Blobs the server confirmed receiving in this request.
    pub received: Vec<BlobStat>,
    /// Target URL for the next upload batch.
    pub upload_url: String,
}
