//! Content-defined chunker producing a tree of spans.
//!
//! A single forward scan feeds every byte to the rolling checksum while
//! accumulating it in a pending buffer. Each split flushes the buffer as
//! a leaf chunk and records a [`Span`]; rarer (stronger) boundaries
//! subsume the trailing run of weaker spans as children, so the tree
//! self-balances with depth proportional to boundary-strength variance
//! rather than stream length.
//!
//! Chunking is strictly single-pass: checksum state is a function of
//! byte order, so boundary decisions for one stream cannot be
//! parallelized. Distinct streams are independent units of work.

use std::io::Read;

use bytes::Bytes;
use cask_types::BlobRef;
use tracing::debug;

use crate::error::CasError;
use crate::rollsum::Rollsum;
use crate::source::ByteSource;

/// Hard ceiling on a single chunk; a split at this size always wins,
/// even inside the end-of-stream reserve.
pub const MAX_BLOB_SIZE: usize = 1 << 20;

/// Position of the first forced split when nothing triggered earlier.
pub const FIRST_CHUNK_SIZE: u64 = 256 << 10;

/// Minimum pending size before a checksum split is honored.
pub const TOO_SMALL_THRESHOLD: usize = 64 << 10;

/// End-of-stream reserve: while the remaining input is smaller than
/// this, splits are deferred so no artificially small trailing chunk is
/// created.
pub const BUFFER_SIZE: u64 = 32 << 10;

/// Boundary strength assigned to the forced `MAX_BLOB_SIZE` split.
const MAX_SPLIT_BITS: u32 = 20;

/// Boundary strength assigned to the first forced split.
const FIRST_SPLIT_BITS: u32 = 18;

/// Read-ahead block for pulling bytes off the source.
const READ_BLOCK: usize = 8 << 10;

/// A chunk-tree node covering `[from, to)` of the source stream.
///
/// Children tile the front of the range in list order; the node's own
/// leaf payload is the trailing `[leaf_from, to)` slice. Spans are
/// created during the scan and never mutated afterwards; ownership moves
/// to the parent on attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Start of the covered range.
    pub from: u64,
    /// End of the covered range (exclusive).
    pub to: u64,
    /// Boundary strength of the split that closed this span.
    pub bits: u32,
    /// Content address of the span's own leaf payload.
    pub blob_ref: BlobRef,
    /// Subsumed weaker spans, tiling `[from, leaf_from)`.
    pub children: Vec<Span>,
    /// Monotone creation index within the scan.
    pub seq: u64,
}

impl Span {
    /// Returns `true` if the span has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total bytes the span covers, children included.
    pub fn size(&self) -> u64 {
        self.to - self.from
    }

    /// Start of the span's own leaf payload.
    pub fn leaf_from(&self) -> u64 {
        self.children.last().map_or(self.from, |child| child.to)
    }

    /// Size of the span's own leaf payload.
    pub fn leaf_size(&self) -> u64 {
        self.to - self.leaf_from()
    }
}

/// A flushed leaf chunk, yielded once per split.
///
/// The payload leaves the chunker with the chunk; only the span stack
/// and the current pending buffer are retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Content address of the payload.
    pub blob_ref: BlobRef,
    /// The raw payload.
    pub data: Bytes,
    /// Byte offset of the payload in the source stream.
    pub from: u64,
    /// End offset (exclusive).
    pub to: u64,
    /// Boundary strength of the split that produced this chunk.
    pub bits: u32,
    /// Monotone creation index within the scan.
    pub seq: u64,
}

/// Single-pass content-defined chunker over a [`ByteSource`].
///
/// Pull one [`Chunk`] at a time with [`next_chunk`](Self::next_chunk);
/// after the stream is drained, [`into_spans`](Self::into_spans) returns
/// the assembled chunk tree.
pub struct Chunker {
    source: ByteSource,
    rollsum: Rollsum,
    buf: Vec<u8>,
    spans: Vec<Span>,
    consumed: u64,
    last: u64,
    seq: u64,
    block: [u8; READ_BLOCK],
    block_pos: usize,
    block_len: usize,
    done: bool,
}

impl Chunker {
    /// Chunker over the given source.
    pub fn new(source: ByteSource) -> Self {
        Self {
            source,
            rollsum: Rollsum::new(),
            buf: Vec::new(),
            spans: Vec::new(),
            consumed: 0,
            last: 0,
            seq: 0,
            block: [0u8; READ_BLOCK],
            block_pos: 0,
            block_len: 0,
            done: false,
        }
    }

    /// Total bytes consumed so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Pull the next flushed chunk, or `None` once the stream is drained.
    ///
    /// Split decisions are evaluated after every byte, in priority
    /// order: the `MAX_BLOB_SIZE` ceiling always wins; inside the
    /// end-of-stream reserve all other conditions are deferred; then a
    /// checksum boundary past `FIRST_CHUNK_SIZE` with enough pending
    /// bytes; then the forced first split at exactly `FIRST_CHUNK_SIZE`.
    /// The remainder is flushed unconditionally at end of stream.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, CasError> {
        if self.done {
            return Ok(None);
        }
        loop {
            let Some(byte) = self.next_byte()? else {
                self.done = true;
                if self.consumed != self.source.len() {
                    return Err(CasError::SourceSizeMismatch {
                        declared: self.source.len(),
                        read: self.consumed,
                    });
                }
                return Ok(Some(self.flush(0)));
            };
            self.buf.push(byte);
            self.consumed += 1;
            self.rollsum.roll(byte);

            let bits = if self.buf.len() == MAX_BLOB_SIZE {
                MAX_SPLIT_BITS
            } else if self.consumed + BUFFER_SIZE > self.source.len() {
                continue;
            } else if self.rollsum.on_split()
                && self.consumed > FIRST_CHUNK_SIZE
                && self.buf.len() > TOO_SMALL_THRESHOLD
            {
                self.rollsum.bits()
            } else if self.consumed == FIRST_CHUNK_SIZE {
                FIRST_SPLIT_BITS
            } else {
                continue;
            };
            return Ok(Some(self.flush(bits)));
        }
    }

    /// Return the root span list once the stream is drained.
    pub fn into_spans(self) -> Vec<Span> {
        debug_assert!(self.done, "into_spans called before the stream was drained");
        self.spans
    }

    fn next_byte(&mut self) -> Result<Option<u8>, CasError> {
        if self.block_pos == self.block_len {
            self.block_len = self.source.read(&mut self.block)?;
            self.block_pos = 0;
            if self.block_len == 0 {
                return Ok(None);
            }
        }
        let byte = self.block[self.block_pos];
        self.block_pos += 1;
        Ok(Some(byte))
    }

    /// Flush the pending buffer as a leaf chunk and record its span.
    ///
    /// Trailing spans with a strictly weaker boundary are popped off the
    /// stack and attached, in original order, as the new span's children.
    fn flush(&mut self, bits: u32) -> Chunk {
        let data = Bytes::from(std::mem::take(&mut self.buf));
        let blob_ref = BlobRef::from_data(&data);

        let mut split_at = self.spans.len();
        while split_at > 0 && self.spans[split_at - 1].bits < bits {
            split_at -= 1;
        }
        let children = self.spans.split_off(split_at);
        let from = children.first().map_or(self.last, |child| child.from);

        debug!(
            from = self.last,
            to = self.consumed,
            bits,
            children = children.len(),
            "flushed chunk"
        );

        let chunk = Chunk {
            blob_ref,
            data,
            from: self.last,
            to: self.consumed,
            bits,
            seq: self.seq,
        };
        self.spans.push(Span {
            from,
            to: self.consumed,
            bits,
            blob_ref,
            children,
            seq: self.seq,
        });
        self.last = self.consumed;
        self.seq += 1;
        chunk
    }
}
