//! Wire schemas describing how a byte stream is reassembled.
//!
//! A [`BytesSchema`] is an ordered parts list; reconstruction is literal
//! left-to-right concatenation of its parts. A [`FileSchema`] wraps a
//! parts list (or a single reference to a root Bytes schema) with file
//! metadata. Schemas are serialized as camelCase JSON and are themselves
//! content-addressed by hashing their canonical serialization.

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::BlobRef;

/// The schema version this client writes and accepts.
pub const SCHEMA_VERSION: u8 = 1;

/// One entry of a parts list: either a raw chunk or a nested schema.
///
/// Order is semantically load-bearing; parts must never be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PartWire", into = "PartWire")]
pub enum Part {
    /// A raw chunk, fetched directly by content hash.
    Blob {
        /// Content address of the chunk.
        blob_ref: BlobRef,
        /// Size of the chunk in bytes.
        size: u64,
    },
    /// A reference to a nested Bytes schema covering a sub-range.
    Bytes {
        /// Content address of the nested schema blob.
        bytes_ref: BlobRef,
        /// Total size in bytes of the range the nested schema covers.
        size: u64,
    },
}

impl Part {
    /// Declared size of the range this part covers.
    pub fn size(&self) -> u64 {
        match self {
            Part::Blob { size, .. } | Part::Bytes { size, .. } => *size,
        }
    }
}

/// Serde mirror of [`Part`].
///
/// The wire form must carry exactly one of `blobRef`/`bytesRef`; a part
/// with both or neither is rejected at decode time.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    blob_ref: Option<BlobRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bytes_ref: Option<BlobRef>,
    size: u64,
}

impl TryFrom<PartWire> for Part {
    type Error = SchemaError;

    fn try_from(wire: PartWire) -> Result<Self, Self::Error> {
        match (wire.blob_ref, wire.bytes_ref) {
            (Some(blob_ref), None) => Ok(Part::Blob {
                blob_ref,
                size: wire.size,
            }),
            (None, Some(bytes_ref)) => Ok(Part::Bytes {
                bytes_ref,
                size: wire.size,
            }),
            (Some(_), Some(_)) => Err(SchemaError::AmbiguousPart),
            (None, None) => Err(SchemaError::DanglingPart),
        }
    }
}

impl From<Part> for PartWire {
    fn from(part: Part) -> Self {
        match part {
            Part::Blob { blob_ref, size } => PartWire {
                blob_ref: Some(blob_ref),
                bytes_ref: None,
                size,
            },
            Part::Bytes { bytes_ref, size } => PartWire {
                blob_ref: None,
                bytes_ref: Some(bytes_ref),
                size,
            },
        }
    }
}

/// An ordered parts list describing how to reassemble a byte range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BytesSchema {
    /// Schema format version.
    pub version: u8,
    /// Parts in reassembly order.
    pub parts: Vec<Part>,
}

/// A file: its name plus the parts describing its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSchema {
    /// Schema format version.
    pub version: u8,
    /// Original file name, when known.
    #[serde(rename = "fileName", default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Parts in reassembly order — either the chunk parts inlined, or a
    /// single `bytesRef` part naming the root Bytes schema.
    pub parts: Vec<Part>,
}

/// Envelope over the schema kinds, tagged by the wire `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Schema {
    /// `{"type": "bytes", ...}`
    #[serde(rename = "bytes")]
    Bytes(BytesSchema),
    /// `{"type": "file", ...}`
    #[serde(rename = "file")]
    File(FileSchema),
}

impl Schema {
    /// Build a Bytes schema at the current version.
    pub fn bytes(parts: Vec<Part>) -> Self {
        Schema::Bytes(BytesSchema {
            version: SCHEMA_VERSION,
            parts,
        })
    }

    /// Build a File schema at the current version.
    pub fn file(file_name: Option<String>, parts: Vec<Part>) -> Self {
        Schema::File(FileSchema {
            version: SCHEMA_VERSION,
            file_name,
            parts,
        })
    }

    /// Schema format version.
    pub fn version(&self) -> u8 {
        match self {
            Schema::Bytes(s) => s.version,
            Schema::File(s) => s.version,
        }
    }

    /// The wire `type` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            Schema::Bytes(_) => "bytes",
            Schema::File(_) => "file",
        }
    }

    /// Parts in reassembly order.
    pub fn parts(&self) -> &[Part] {
        match self {
            Schema::Bytes(s) => &s.parts,
            Schema::File(s) => &s.parts,
        }
    }

    /// Consume the schema, returning its parts.
    pub fn into_parts(self) -> Vec<Part> {
        match self {
            Schema::Bytes(s) => s.parts,
            Schema::File(s) => s.parts,
        }
    }

    /// The deterministic serialization that is content-hashed and stored.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, SchemaError> {
        serde_json::to_vec(self).map_err(|e| SchemaError::Serialization(e.to_string()))
    }

    /// Content address of this schema's canonical serialization.
    pub fn blob_ref(&self) -> Result<BlobRef, SchemaError> {
        Ok(BlobRef::from_data(&self.canonical_bytes()?))
    }

    /// Decode a schema blob.
    ///
    /// Rejects unknown `type` tags, malformed parts, and unsupported
    /// versions rather than silently misinterpreting data.
    pub fn decode(bytes: &[u8]) -> Result<Self, SchemaError> {
        let schema: Schema =
            serde_json::from_slice(bytes).map_err(|e| SchemaError::Serialization(e.to_string()))?;
        if schema.version() != SCHEMA_VERSION {
            return Err(SchemaError::UnsupportedVersion {
                found: schema.version(),
                supported: SCHEMA_VERSION,
            });
        }
        Ok(schema)
    }
}
