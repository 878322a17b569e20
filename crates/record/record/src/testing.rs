use crate::error::RecordError;
use crate::record::MediaId;
use crate::store::MediaRecordStore;

/// Run the full record store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_record_store_conformance_tests(
    store: &dyn MediaRecordStore,
) -> Result<(), RecordError> {
    test_get_missing(store).await?;
    test_insert_populates_record(store).await?;
    test_insert_never_reuses_ids(store).await?;
    test_set_animated(store).await?;
    test_set_animated_missing(store).await?;
    test_delete(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn MediaRecordStore) -> Result<(), RecordError> {
    let record = store.get(MediaId(i64::MAX)).await?;
    assert!(record.is_none(), "get on missing id should return None");
    Ok(())
}

async fn test_insert_populates_record(store: &dyn MediaRecordStore) -> Result<(), RecordError> {
    let record = store.insert("jpg", "image/jpeg").await?;
    assert_eq!(record.extension, "jpg");
    assert_eq!(record.mimetype, "image/jpeg");
    assert!(!record.is_animated, "fresh records start non-animated");

    let fetched = store.get(record.id).await?;
    assert_eq!(fetched.as_ref(), Some(&record));
    Ok(())
}

async fn test_insert_never_reuses_ids(store: &dyn MediaRecordStore) -> Result<(), RecordError> {
    let mut seen = Vec::new();
    for _ in 0..10 {
        let record = store.insert("png", "image/png").await?;
        assert!(
            !seen.contains(&record.id),
            "insert reused id {}",
            record.id
        );
        seen.push(record.id);
    }

    // Ids stay unique even across a delete of an earlier record.
    let first = seen[0];
    store.delete(first).await?;
    let record = store.insert("png", "image/png").await?;
    assert!(
        !seen.contains(&record.id),
        "insert reused id {} after delete",
        record.id
    );
    Ok(())
}

async fn test_set_animated(store: &dyn MediaRecordStore) -> Result<(), RecordError> {
    let record = store.insert("gif", "image/gif").await?;
    store.set_animated(record.id, true).await?;
    let fetched = store.get(record.id).await?.expect("record should exist");
    assert!(fetched.is_animated, "animated flag should persist");
    assert_eq!(fetched.extension, "gif", "other fields should be untouched");
    Ok(())
}

async fn test_set_animated_missing(store: &dyn MediaRecordStore) -> Result<(), RecordError> {
    let result = store.set_animated(MediaId(i64::MAX), true).await;
    assert!(
        matches!(result, Err(RecordError::NotFound(_))),
        "set_animated on missing id should be NotFound"
    );
    Ok(())
}

async fn test_delete(store: &dyn MediaRecordStore) -> Result<(), RecordError> {
    let record = store.insert("webm", "video/webm").await?;
    let existed = store.delete(record.id).await?;
    assert!(existed, "delete should return true for existing record");

    let fetched = store.get(record.id).await?;
    assert!(fetched.is_none(), "get after delete should return None");

    let existed = store.delete(record.id).await?;
    assert!(!existed, "delete on missing record should return false");
    Ok(())
}
