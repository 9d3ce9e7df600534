//! Integration test: chunk-tree shape and dedup locality.

use cask_cas::{
    ByteSource, Chunk, Chunker, FIRST_CHUNK_SIZE, MAX_BLOB_SIZE, Span, encode_spans,
};
use cask_client::FileWriter;
use cask_integration_tests::{memory_client, test_data};
use cask_types::Part;

fn drain(data: Vec<u8>) -> (Vec<Chunk>, Vec<Span>) {
    let mut chunker = Chunker::new(ByteSource::from_bytes(data));
    let mut chunks = Vec::new();
    while let Some(chunk) = chunker.next_chunk().unwrap() {
        chunks.push(chunk);
    }
    (chunks, chunker.into_spans())
}

#[test]
fn test_first_split_at_exactly_first_chunk_size() {
    // With no earlier trigger possible, the first boundary is the
    // forced one at exactly FIRST_CHUNK_SIZE.
    let (chunks, _) = drain(test_data(1 << 20));
    assert_eq!(chunks[0].from, 0);
    assert_eq!(chunks[0].to, FIRST_CHUNK_SIZE);
    assert_eq!(chunks[0].bits, 18);
}

#[test]
fn test_quiet_scenario_tiling() {
    // 1536 KiB with no content boundaries: the forced first split at
    // 256 KiB, the 1 MiB ceiling split at 1280 KiB (which subsumes the
    // weaker first span), and the trailing leaf.
    let total: u64 = 1536 << 10;
    let (chunks, spans) = drain(vec![0u8; total as usize]);

    let boundaries: Vec<(u64, u64, u32)> = chunks.iter().map(|c| (c.from, c.to, c.bits)).collect();
    assert_eq!(
        boundaries,
        vec![
            (0, 256 << 10, 18),
            (256 << 10, 1280 << 10, 20),
            (1280 << 10, total, 0),
        ]
    );

    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0].bits, 20);
    assert_eq!(spans[0].children.len(), 1);
    assert_eq!(spans[0].children[0].bits, 18);

    // The lone leaf child collapses, so the schema is three plain
    // chunk parts covering the stream.
    let (parts, nested) = encode_spans(&spans).unwrap();
    assert!(nested.is_empty());
    let sizes: Vec<u64> = parts.iter().map(Part::size).collect();
    assert_eq!(sizes, vec![256 << 10, MAX_BLOB_SIZE as u64, 256 << 10]);
}

#[test]
fn test_chunking_deterministic_across_runs() {
    let data = test_data(2 << 20);
    let (chunks1, spans1) = drain(data.clone());
    let (chunks2, spans2) = drain(data);
    assert_eq!(chunks1, chunks2);
    assert_eq!(spans1, spans2);
}

#[test]
fn test_insertion_preserves_downstream_chunks() {
    // Content-defined boundaries localize edits: one byte inserted near
    // the start must leave over 90% of chunk hashes unchanged.
    let base = test_data(2 << 20);
    let mut edited = base.clone();
    edited.insert(100, 0x42);

    let (chunks1, _) = drain(base);
    let (chunks2, _) = drain(edited);

    let set2: std::collections::HashSet<_> = chunks2.iter().map(|c| c.blob_ref).collect();
    let shared = chunks1.iter().filter(|c| set2.contains(&c.blob_ref)).count();
    assert!(
        shared as f64 / chunks1.len() as f64 > 0.9,
        "expected >90% unchanged chunks, got {shared}/{}",
        chunks1.len()
    );
}

#[tokio::test]
async fn test_insertion_uploads_only_perturbed_chunks() {
    // The same locality, observed end to end through dedup: writing the
    // edited stream into a store that already has the original re-sends
    // only the chunks around the insertion point.
    let (_store, client) = memory_client();
    let base = test_data(2 << 20);
    let mut edited = base.clone();
    edited.insert(100, 0x42);

    let mut first = FileWriter::new(client.clone());
    first
        .put_bytes(ByteSource::from_bytes(base.clone()))
        .await
        .unwrap();

    let mut second = FileWriter::new(client);
    second
        .put_bytes(ByteSource::from_bytes(edited))
        .await
        .unwrap();

    let stats = second.stats();
    assert!(stats.skipped > 0, "unchanged chunks must be deduplicated");
    assert!(
        stats.uploaded_bytes < (base.len() / 4) as u64,
        "re-uploaded {} bytes of a {} byte stream",
        stats.uploaded_bytes,
        base.len()
    );
}
