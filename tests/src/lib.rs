//! Shared test harness for Cask integration tests.
//!
//! Provides an in-memory store/client fixture and deterministic
//! test-data generators. No wall-clock time or OS randomness in any
//! test: the same inputs always chunk, hash, and batch identically.

use std::sync::Arc;

use cask_client::BlobClient;
use cask_store::MemoryStore;

/// Install a compact tracing subscriber honoring `RUST_LOG` (idempotent).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An in-memory store plus a client over it.
pub fn memory_client() -> (Arc<MemoryStore>, BlobClient) {
    memory_client_with(cask_store::DEFAULT_MAX_UPLOAD_SIZE)
}

/// Same, with an explicit `max_upload_size` for batching tests.
pub fn memory_client_with(max_upload_size: u64) -> (Arc<MemoryStore>, BlobClient) {
    init_tracing();
    let store = Arc::new(MemoryStore::with_max_upload_size(max_upload_size));
    let client = BlobClient::new(store.clone());
    (store, client)
}

/// Generate deterministic, non-repeating test data.
pub fn test_data(size: usize) -> Vec<u8> {
    test_data_seeded(size, 0xDEAD_BEEF)
}

/// Generate test data with a specific seed (for unique blobs).
pub fn test_data_seeded(size: usize, seed: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = seed;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}
