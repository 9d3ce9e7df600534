//! Integration test: malformed schemas fail explicitly.
//!
//! A truncated or inconsistent schema must error rather than silently
//! returning partial content.

use cask_client::{BlobClient, ClientError, StreamAssembler};
use cask_integration_tests::memory_client;
use cask_types::{BlobRef, Part, Schema, SchemaError};

fn assembler(client: BlobClient) -> StreamAssembler {
    StreamAssembler::new(client)
}

#[tokio::test]
async fn test_missing_root_is_not_found() {
    let (_store, client) = memory_client();
    let absent = BlobRef::from_data(b"no such schema");
    let err = assembler(client).assemble(absent).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(r) if r == absent));
}

#[tokio::test]
async fn test_non_json_root_is_malformed() {
    let (store, client) = memory_client();
    let junk = store.insert(&b"\x00\x01\x02 raw chunk bytes"[..]);
    let err = assembler(client).assemble(junk).await.unwrap_err();
    assert!(matches!(err, ClientError::MalformedSchema(_)));
}

#[tokio::test]
async fn test_truncated_schema_json_is_malformed() {
    let (store, client) = memory_client();
    let truncated = store.insert(&br#"{"type": "bytes", "version": 1, "parts": [{"blo"#[..]);
    let err = assembler(client).assemble(truncated).await.unwrap_err();
    assert!(matches!(err, ClientError::MalformedSchema(_)));
}

#[tokio::test]
async fn test_ambiguous_part_is_rejected() {
    let (store, client) = memory_client();
    let r = BlobRef::from_data(b"some chunk");
    let raw = format!(
        r#"{{"type": "bytes", "version": 1, "parts": [{{"blobRef": "{r}", "bytesRef": "{r}", "size": 10}}]}}"#
    );
    let root = store.insert(raw.into_bytes());
    let err = assembler(client).assemble(root).await.unwrap_err();
    let ClientError::MalformedSchema(inner) = err else {
        panic!("expected MalformedSchema");
    };
    assert!(inner.to_string().contains("blobRef and bytesRef"), "{inner}");
}

#[tokio::test]
async fn test_dangling_part_is_rejected() {
    let (store, client) = memory_client();
    let root = store.insert(&br#"{"type": "bytes", "version": 1, "parts": [{"size": 10}]}"#[..]);
    let err = assembler(client).assemble(root).await.unwrap_err();
    assert!(matches!(err, ClientError::MalformedSchema(_)));
}

#[tokio::test]
async fn test_unsupported_version_is_rejected() {
    let (store, client) = memory_client();
    let root = store.insert(&br#"{"type": "bytes", "version": 2, "parts": []}"#[..]);
    let err = assembler(client).assemble(root).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::MalformedSchema(SchemaError::UnsupportedVersion {
            found: 2,
            supported: 1
        })
    ));
}

#[tokio::test]
async fn test_invalid_ref_string_is_rejected() {
    let (store, client) = memory_client();
    let root = store.insert(
        &br#"{"type": "bytes", "version": 1, "parts": [{"blobRef": "sha1-NOTHEX", "size": 1}]}"#[..],
    );
    let err = assembler(client).assemble(root).await.unwrap_err();
    assert!(matches!(err, ClientError::MalformedSchema(_)));
}

#[tokio::test]
async fn test_dangling_blob_ref_inside_tree_is_not_found() {
    let (store, client) = memory_client();
    let stored = store.insert(&b"present"[..]);
    let missing = BlobRef::from_data(b"absent chunk");
    let schema = Schema::bytes(vec![
        Part::Blob {
            blob_ref: stored,
            size: 7,
        },
        Part::Blob {
            blob_ref: missing,
            size: 12,
        },
    ]);
    let root = store.insert(schema.canonical_bytes().unwrap());

    let err = assembler(client).assemble(root).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(r) if r == missing));
}

#[tokio::test]
async fn test_short_chunk_is_a_short_read() {
    let (store, client) = memory_client();
    let small = store.insert(&b"tiny"[..]);
    let schema = Schema::bytes(vec![Part::Blob {
        blob_ref: small,
        size: 4096,
    }]);
    let root = store.insert(schema.canonical_bytes().unwrap());

    let err = assembler(client).assemble(root).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::ShortRead {
            declared: 4096,
            got: 4,
            ..
        }
    ));
}
