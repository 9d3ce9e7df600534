//! Shared types and identifiers for Cask.
//!
//! This crate defines the core types used across the Cask workspace:
//! the content address ([`BlobRef`]), the wire schemas ([`Part`],
//! [`BytesSchema`], [`FileSchema`], [`Schema`]), the blob-store protocol
//! records ([`BlobStat`], [`StatResponse`], [`UploadResponse`]), and
//! configuration ([`ClientConfig`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

mod error;
mod protocol;
mod schema;

pub use error::SchemaError;
pub use protocol::{BlobStat, StatResponse, UploadResponse};
pub use schema::{BytesSchema, FileSchema, Part, SCHEMA_VERSION, Schema};

// ---------------------------------------------------------------------------
// BlobRef
// ---------------------------------------------------------------------------

/// Content address of a blob: `sha1(data)`, rendered as
/// `"sha1-" + 40 lowercase hex characters`.
///
/// Parsing accepts exactly that form and nothing else; uppercase hex,
/// a different prefix, or a different length are all rejected.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobRef([u8; 20]);

impl BlobRef {
    /// Compute the content address of a byte sequence.
    pub fn from_data(data: &[u8]) -> Self {
        let mut sha = Sha1::new();
        sha.update(data);
        Self(sha.finalize().into())
    }

    /// Return the raw 20-byte digest.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl From<[u8; 20]> for BlobRef {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for BlobRef {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha1-{}", hex::encode(self.0))
    }
}

impl fmt::Debug for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobRef({self})")
    }
}

impl FromStr for BlobRef {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digest = s
            .strip_prefix("sha1-")
            .ok_or_else(|| SchemaError::InvalidRef(s.to_string()))?;
        let lowercase_hex = digest
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if digest.len() != 40 || !lowercase_hex {
            return Err(SchemaError::InvalidRef(s.to_string()));
        }
        let mut raw = [0u8; 20];
        hex::decode_to_slice(digest, &mut raw)
            .map_err(|_| SchemaError::InvalidRef(s.to_string()))?;
        Ok(Self(raw))
    }
}

impl TryFrom<String> for BlobRef {
    type Error = SchemaError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BlobRef> for String {
    fn from(blob_ref: BlobRef) -> Self {
        blob_ref.to_string()
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Default maximum number of refs per stat request.
pub const MAX_STAT_BLOB: usize = 1000;

/// Default number of flushed chunks buffered before an upload batch.
pub const UPLOAD_QUEUE_LEN: usize = 10;

/// Client tunables that are not protocol constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Maximum refs per stat request; larger sets are split into batches.
    pub stat_batch_limit: usize,
    /// Flushed chunks buffered before an upload batch is issued.
    pub upload_queue_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            stat_batch_limit: MAX_STAT_BLOB,
            upload_queue_len: UPLOAD_QUEUE_LEN,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
