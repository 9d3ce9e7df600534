//! Chunk tree → Bytes-schema parts.
//!
//! Encoding recurses over a span list and produces the ordered parts of
//! a Bytes schema, plus the nested schema blobs built along the way.
//! Content addressing is applied at every tree level: each nested schema
//! is hashed as soon as it is assembled, so the caller can upload it
//! immediately and release it.

use bytes::Bytes;
use cask_types::{BlobRef, Part, Schema};

use crate::chunker::Span;
use crate::error::CasError;

/// A nested Bytes schema produced during encoding, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaBlob {
    /// Content address of the serialized schema.
    pub blob_ref: BlobRef,
    /// Canonical serialization of the schema.
    pub bytes: Bytes,
}

/// Encode a span list into ordered parts plus the nested schema blobs.
///
/// Per span, in order:
/// - a single child that is itself a leaf collapses into a plain
///   `blobRef` part instead of a one-entry nested schema;
/// - otherwise children become a recursively encoded nested schema,
///   emitted as a `bytesRef` part **before** the span's own part;
/// - the span's own leaf payload is always emitted last as a `blobRef`
///   part.
pub fn encode_spans(spans: &[Span]) -> Result<(Vec<Part>, Vec<SchemaBlob>), CasError> {
    let mut nested = Vec::new();
    let parts = encode_level(spans, &mut nested)?;
    Ok((parts, nested))
}

fn encode_level(spans: &[Span], nested: &mut Vec<SchemaBlob>) -> Result<Vec<Part>, CasError> {
    let mut parts = Vec::new();
    for span in spans {
        match span.children.as_slice() {
            [child] if child.is_leaf() => {
                parts.push(Part::Blob {
                    blob_ref: child.blob_ref,
                    size: child.size(),
                });
            }
            [] => {}
            children => {
                let child_parts = encode_level(children, nested)?;
                let schema = Schema::bytes(child_parts);
                let bytes = Bytes::from(schema.canonical_bytes()?);
                let blob_ref = BlobRef::from_data(&bytes);
                nested.push(SchemaBlob { blob_ref, bytes });
                parts.push(Part::Bytes {
                    bytes_ref: blob_ref,
                    size: children.iter().map(Span::size).sum(),
                });
            }
        }
        parts.push(Part::Blob {
            blob_ref: span.blob_ref,
            size: span.leaf_size(),
        });
    }
    Ok(parts)
}
