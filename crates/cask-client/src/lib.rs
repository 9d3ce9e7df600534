//! Dedup-aware client for a content-addressable blob store.
//!
//! This crate ties the chunking engine to the store capability:
//!
//! - [`BlobClient`] — batched stat, dedup-aware size-bounded uploads,
//!   and fetch by ref.
//! - [`FileWriter`] — chunks a stream, uploads flushed chunks and
//!   nested schemas along the way, and returns the root schema ref.
//! - [`StreamAssembler`] — resolves a root schema ref back into the
//!   exact original bytes.

mod assembler;
mod client;
mod error;
mod writer;

pub use assembler::StreamAssembler;
pub use client::{BlobClient, PutBlobsResult};
pub use error::ClientError;
pub use writer::{FileWriter, WriteStats};
