//! Integration test: dedup, batching, and failure aggregation.

use std::sync::Arc;

use bytes::Bytes;
use cask_client::{BlobClient, ClientError};
use cask_integration_tests::{memory_client, memory_client_with, test_data_seeded};
use cask_store::LossyStore;
use cask_types::{BlobRef, ClientConfig};

fn unique_blobs(count: usize, size: usize) -> Vec<Bytes> {
    (0..count)
        .map(|i| Bytes::from(test_data_seeded(size, i as u32 + 1)))
        .collect()
}

#[tokio::test]
async fn test_second_upload_is_all_skipped() {
    let (_store, client) = memory_client();
    let blobs = unique_blobs(8, 2000);

    let first = client.put_blobs(blobs.clone()).await.unwrap();
    assert_eq!(first.received.len(), 8);
    assert!(first.skipped.is_empty());

    let second = client.put_blobs(blobs).await.unwrap();
    assert!(second.received.is_empty(), "nothing may be re-uploaded");
    assert_eq!(second.skipped.len(), 8);
    assert_eq!(second.success(), first.success());
}

#[tokio::test]
async fn test_overflowing_uploads_split_into_batches() {
    // 6 × 30 KiB against a 64 KiB limit: two blobs per request.
    let (store, client) = memory_client_with(64 << 10);
    let blobs = unique_blobs(6, 30 << 10);

    let result = client.put_blobs(blobs).await.unwrap();
    assert_eq!(result.received.len(), 6);
    assert!(result.failed.is_empty());
    assert_eq!(store.upload_calls(), 3, "expected three bounded batches");
    assert_eq!(store.blob_count(), 6);
}

#[tokio::test]
async fn test_stat_requests_are_batched() {
    let (store, _) = memory_client();
    let client = BlobClient::with_config(
        store.clone(),
        ClientConfig {
            stat_batch_limit: 1000,
            ..ClientConfig::default()
        },
    );

    let blobs = unique_blobs(2500, 16);
    let result = client.put_blobs(blobs).await.unwrap();
    assert_eq!(result.received.len(), 2500);
    assert!(
        store.stat_calls() >= 3,
        "2500 refs across a 1000-ref limit need at least 3 stat calls"
    );
}

#[tokio::test]
async fn test_lost_blob_reported_then_clean_retry() {
    // A store that silently loses one blob from upload payloads: the
    // call must report exactly that ref as failed while still
    // confirming the rest, and a retry against the healthy store
    // completes with the failed blob as the only new upload.
    let (store, _) = memory_client();
    let blobs = unique_blobs(3, 5000);
    let refs: Vec<BlobRef> = blobs.iter().map(|b| BlobRef::from_data(b)).collect();

    let lossy = Arc::new(LossyStore::new(store.clone()).drop_ref(refs[1]));
    let lossy_client = BlobClient::new(lossy);

    let err = lossy_client.put_blobs(blobs.clone()).await.unwrap_err();
    let ClientError::UploadIncomplete { result } = err else {
        panic!("expected UploadIncomplete");
    };
    assert_eq!(result.failed.iter().copied().collect::<Vec<_>>(), [refs[1]]);
    assert_eq!(result.received.len(), 2);
    assert!(store.contains(refs[0]));
    assert!(!store.contains(refs[1]));

    // Uploads are content-keyed and idempotent: re-issuing against the
    // healthy store is always safe.
    let healthy = BlobClient::new(store.clone());
    let retry = healthy.put_blobs(blobs).await.unwrap();
    assert_eq!(retry.received.len(), 1);
    assert_eq!(retry.received[0].blob_ref, refs[1]);
    assert_eq!(retry.skipped.len(), 2);
    assert!(store.contains(refs[1]));
}

#[tokio::test]
async fn test_failed_batch_loses_only_itself() {
    // The first upload call fails wholesale; later batches still go
    // through on the last known URL.
    let (store, _) = memory_client_with(64 << 10);
    let lossy = Arc::new(LossyStore::new(store.clone()).fail_uploads(1));
    let client = BlobClient::new(lossy);

    let blobs = unique_blobs(4, 30 << 10);
    let err = client.put_blobs(blobs).await.unwrap_err();
    let ClientError::UploadIncomplete { result } = err else {
        panic!("expected UploadIncomplete");
    };
    assert_eq!(result.failed.len(), 2, "only the first batch is lost");
    assert_eq!(result.received.len(), 2);
    assert_eq!(store.blob_count(), 2);
}

#[tokio::test]
async fn test_concurrent_writers_share_a_store() {
    // Distinct streams are independent units of work over one shared
    // store.
    let (store, client) = memory_client();

    let mut handles = Vec::new();
    for i in 0..4u32 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            let data = test_data_seeded(300_000, 100 + i);
            let mut writer = cask_client::FileWriter::new(client);
            writer
                .put_bytes(cask_cas::ByteSource::from_bytes(data))
                .await
                .unwrap()
        }));
    }

    let mut roots = Vec::new();
    for handle in handles {
        roots.push(handle.await.unwrap());
    }
    roots.sort();
    roots.dedup();
    assert_eq!(roots.len(), 4, "distinct streams yield distinct roots");
    assert!(store.blob_count() >= 8);
}
