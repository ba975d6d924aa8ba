use super::error::ObjectStoreError;
use super::local::LocalObjectStore;
use super::ObjectStore;

fn store() -> (tempfile::TempDir, LocalObjectStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = LocalObjectStore::new(dir.path()).expect("object store");
    (dir, store)
}

#[tokio::test]
async fn test_put_get_round_trip() {
    let (_dir, store) = store();
    let payload = b"binary answer payload".to_vec();

    let handle = store.put(payload.clone()).await.expect("put");
    assert!(!handle.is_empty());
    assert_eq!(store.get(&handle).await.expect("get"), payload);
}

#[tokio::test]
async fn test_handles_are_unique() {
    let (_dir, store) = store();
    let first = store.put(b"one".to_vec()).await.expect("put");
    let second = store.put(b"one".to_vec()).await.expect("put");
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_get_unknown_handle_is_not_found() {
    let (_dir, store) = store();
    let result = store.get("missing").await;
    assert!(matches!(result, Err(ObjectStoreError::NotFound { .. })));
}

#[tokio::test]
async fn test_delete_removes_blob_and_is_idempotent() {
    let (_dir, store) = store();
    let handle = store.put(b"data".to_vec()).await.expect("put");

    store.delete(&handle).await.expect("delete");
    assert!(matches!(
        store.get(&handle).await,
        Err(ObjectStoreError::NotFound { .. })
    ));
    store.delete(&handle).await.expect("second delete is a no-op");
}

#[tokio::test]
async fn test_path_escaping_handles_are_rejected() {
    let (_dir, store) = store();
    for handle in ["../etc/passwd", "a/b", "a\\b"] {
        assert!(matches!(
            store.get(handle).await,
            Err(ObjectStoreError::NotFound { .. })
        ));
    }
}
