//! Content-defined chunking and chunk-tree encoding.
//!
//! This crate provides:
//! - [`Rollsum`] — rolling checksum emitting boundary signals and strengths.
//! - [`Chunker`] — single-pass chunker producing leaf [`Chunk`]s and a
//!   tree of [`Span`]s whose stronger boundaries subsume weaker ones.
//! - [`encode_spans`] — converts a span tree into ordered Bytes-schema
//!   parts, content-addressing every nesting level.
//!
//! Chunk boundaries are purely content-determined, so edits perturb only
//! nearby chunks and identical content always hashes identically.

mod chunker;
mod encoder;
mod error;
mod rollsum;
mod source;

pub use chunker::{
    BUFFER_SIZE, Chunk, Chunker, FIRST_CHUNK_SIZE, MAX_BLOB_SIZE, Span, TOO_SMALL_THRESHOLD,
};
pub use encoder::{SchemaBlob, encode_spans};
pub use error::CasError;
pub use rollsum::{BLOB_BITS, Rollsum, WINDOW_SIZE};
pub use source::ByteSource;
