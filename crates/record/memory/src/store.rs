use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use tansu_record::error::RecordError;
use tansu_record::record::{MediaId, MediaRecord};
use tansu_record::store::MediaRecordStore;

/// In-memory [`MediaRecordStore`] backed by a [`DashMap`].
///
/// Ids come from a monotonically increasing [`AtomicI64`], so allocation is
/// atomic and ids are never reused within the lifetime of the store. Intended
/// for tests and ephemeral deployments; rows do not survive a restart.
#[derive(Debug, Default)]
pub struct MemoryMediaStore {
    records: DashMap<MediaId, MediaRecord>,
    next_id: AtomicI64,
}

impl MemoryMediaStore {
    /// Create a new, empty in-memory record store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MediaRecordStore for MemoryMediaStore {
    async fn insert(&self, extension: &str, mimetype: &str) -> Result<MediaRecord, RecordError> {
        let id = MediaId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let record = MediaRecord {
            id,
            extension: extension.to_owned(),
            mimetype: mimetype.to_owned(),
            is_animated: false,
        };
        self.records.insert(id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: MediaId) -> Result<Option<MediaRecord>, RecordError> {
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    async fn set_animated(&self, id: MediaId, is_animated: bool) -> Result<(), RecordError> {
        match self.records.get_mut(&id) {
            Some(mut entry) => {
                entry.is_animated = is_animated;
                Ok(())
            }
            None => Err(RecordError::NotFound(id.to_string())),
        }
    }

    async fn delete(&self, id: MediaId) -> Result<bool, RecordError> {
        Ok(self.records.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tansu_record::testing::run_record_store_conformance_tests;

    #[tokio::test]
    async fn conformance() {
        let store = MemoryMediaStore::new();
        run_record_store_conformance_tests(&store)
            .await
            .expect("conformance suite should pass");
    }

    #[tokio::test]
    async fn ids_are_sequential_from_one() {
        let store = MemoryMediaStore::new();
        let first = store.insert("jpg", "image/jpeg").await.unwrap();
        let second = store.insert("png", "image/png").await.unwrap();
        assert_eq!(first.id, MediaId(1));
        assert_eq!(second.id, MediaId(2));
    }

    #[tokio::test]
    async fn concurrent_inserts_allocate_distinct_ids() {
        use std::sync::Arc;

        let store = Arc::new(MemoryMediaStore::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.insert("jpg", "image/jpeg").await.unwrap().id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 16, "every insert should get a distinct id");
    }
}
