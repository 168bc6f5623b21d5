use super::schema::{ContentKind, HistoryRecord};
use super::storage::{KeyValueStore, StorageError};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Records kept per kind unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 3;

/// Which write tier a `save` ended on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Full list written.
    Stored,
    /// Quota hit; only the saved record was kept.
    TrimmedToLatest,
    /// Quota hit twice; only the saved record was kept, without its payload.
    PayloadDropped,
    /// Nothing written.
    Failed,
}

/// Capacity-bounded, most-recent-first history for one content kind.
///
/// The store never surfaces errors: unreadable or corrupt storage reads as an
/// empty history, and quota failures on write degrade through the tiers in
/// [`SaveOutcome`].
#[derive(Clone)]
pub struct HistoryStore {
    kind: ContentKind,
    kv: Arc<dyn KeyValueStore>,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(kind: ContentKind, kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_capacity(kind, kv, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(kind: ContentKind, kv: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        Self {
            kind,
            kv,
            capacity: capacity.max(1),
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert or replace `record`, dropping its file handle first.
    pub fn save(&self, record: &HistoryRecord) -> SaveOutcome {
        let to_save = record.detached();
        let mut records = self.list();

        if let Some(existing) = records.iter_mut().find(|r| r.id == to_save.id) {
            *existing = to_save.clone();
            debug!(kind = %self.kind, id = %to_save.id, "Updating history record");
        } else {
            records.insert(0, to_save.clone());
            records.truncate(self.capacity);
            debug!(kind = %self.kind, id = %to_save.id, "Adding history record");
        }

        match self.write(&records) {
            Ok(()) => SaveOutcome::Stored,
            Err(e) if e.is_quota_exceeded() => self.degrade(to_save, &e),
            Err(e) => {
                error!(kind = %self.kind, id = %to_save.id, error = %e, "Failed to save history");
                SaveOutcome::Failed
            }
        }
    }

    /// Persisted records, newest first. Empty when nothing usable is stored.
    pub fn list(&self) -> Vec<HistoryRecord> {
        let stored = match self.kv.get(self.kind.storage_key()) {
            Ok(Some(stored)) => stored,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(kind = %self.kind, error = %e, "History storage unreadable");
                return Vec::new();
            }
        };

        match serde_json::from_str(&stored) {
            Ok(records) => records,
            Err(e) => {
                warn!(kind = %self.kind, error = %e, "Discarding corrupt history");
                Vec::new()
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<HistoryRecord> {
        self.list().into_iter().find(|r| r.id == id)
    }

    pub fn clear(&self) {
        if let Err(e) = self.kv.remove(self.kind.storage_key()) {
            warn!(kind = %self.kind, error = %e, "Failed to clear history");
        }
    }

    fn write(&self, records: &[HistoryRecord]) -> Result<(), StorageError> {
        let json =
            serde_json::to_string(records).map_err(|e| StorageError::Unavailable(e.to_string()))?;
        self.kv.set(self.kind.storage_key(), &json)
    }

    // Each tier replaces whatever the kind had stored.
    fn degrade(&self, record: HistoryRecord, cause: &StorageError) -> SaveOutcome {
        warn!(
            kind = %self.kind,
            id = %record.id,
            error = %cause,
            "History over quota, keeping latest record only"
        );

        if let Err(e) = self.kv.remove(self.kind.storage_key()) {
            warn!(kind = %self.kind, error = %e, "Failed to drop history before retry");
        }
        let retry_err = match self.write(std::slice::from_ref(&record)) {
            Ok(()) => return SaveOutcome::TrimmedToLatest,
            Err(e) => e,
        };

        warn!(
            kind = %self.kind,
            id = %record.id,
            error = %retry_err,
            "Retry failed, dropping cached payload"
        );
        let stripped = HistoryRecord {
            payload_base64: String::new(),
            ..record
        };
        match self.write(std::slice::from_ref(&stripped)) {
            Ok(()) => SaveOutcome::PayloadDropped,
            Err(e) => {
                error!(
                    kind = %self.kind,
                    id = %stripped.id,
                    error = %e,
                    "History could not be saved"
                );
                SaveOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::schema::UploadFile;
    use crate::review::storage::MemoryKeyValueStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(id: &str) -> HistoryRecord {
        HistoryRecord {
            id: id.into(),
            name: format!("project-{id}"),
            file_name: format!("project-{id}.pdf"),
            upload_time: "2026-03-01T10:00:00Z".into(),
            payload_base64: "data:application/pdf;base64,JVBERi0=".into(),
            suggestion_text: format!("suggestion {id}"),
            transcription_text: None,
            file: None,
        }
    }

    fn ids(records: &[HistoryRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    fn memory_store() -> (Arc<MemoryKeyValueStore>, HistoryStore) {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let store = HistoryStore::new(ContentKind::Portfolio, kv.clone());
        (kv, store)
    }

    #[test]
    fn empty_store_lists_nothing() {
        let (_, store) = memory_store();
        assert!(store.list().is_empty());
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn newest_first_and_oldest_evicted() {
        let (_, store) = memory_store();
        for id in ["1", "2", "3", "4"] {
            assert_eq!(store.save(&record(id)), SaveOutcome::Stored);
        }
        let listed = store.list();
        assert_eq!(ids(&listed), ["4", "3", "2"]);
        assert_eq!(store.get("1"), None);
    }

    #[test]
    fn list_never_exceeds_capacity() {
        let (_, store) = memory_store();
        for i in 0..10 {
            store.save(&record(&i.to_string()));
            assert!(store.list().len() <= DEFAULT_CAPACITY);
        }
    }

    #[test]
    fn saving_existing_id_replaces_in_place() {
        let (_, store) = memory_store();
        for id in ["1", "2", "3"] {
            store.save(&record(id));
        }
        let mut updated = record("2");
        updated.suggestion_text = "rewritten".into();
        store.save(&updated);

        let listed = store.list();
        assert_eq!(ids(&listed), ["3", "2", "1"]);
        assert_eq!(listed[1].suggestion_text, "rewritten");
    }

    #[test]
    fn file_handle_is_never_persisted() {
        let (kv, store) = memory_store();
        let mut with_file = record("1");
        with_file.file = Some(Arc::new(UploadFile::new("a.pdf", "application/pdf", vec![1, 2])));
        store.save(&with_file);

        assert!(store.get("1").unwrap().file.is_none());
        let raw = kv.get(ContentKind::Portfolio.storage_key()).unwrap().unwrap();
        assert!(!raw.contains("\"file\""));
    }

    #[test]
    fn corrupt_storage_reads_as_empty() {
        let (kv, store) = memory_store();
        kv.set(ContentKind::Portfolio.storage_key(), "{not json").unwrap();
        assert!(store.list().is_empty());
        assert_eq!(store.get("1"), None);

        // A save over corrupt data starts a fresh list.
        assert_eq!(store.save(&record("9")), SaveOutcome::Stored);
        assert_eq!(ids(&store.list()), ["9"]);
    }

    #[test]
    fn kinds_are_isolated() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        let portfolio = HistoryStore::new(ContentKind::Portfolio, kv.clone());
        let audio = HistoryStore::new(ContentKind::Audio, kv);

        portfolio.save(&record("p"));
        audio.save(&record("a"));
        portfolio.clear();

        assert!(portfolio.list().is_empty());
        assert_eq!(ids(&audio.list()), ["a"]);
    }

    #[test]
    fn quota_keeps_only_latest_record() {
        let first = serde_json::to_string(&[record("1")]).unwrap();
        let key_len = ContentKind::Portfolio.storage_key().len();
        // Room for one record but not two.
        let kv = Arc::new(MemoryKeyValueStore::with_quota(key_len + first.len() + 8));
        let store = HistoryStore::new(ContentKind::Portfolio, kv);

        assert_eq!(store.save(&record("1")), SaveOutcome::Stored);
        assert_eq!(store.save(&record("2")), SaveOutcome::TrimmedToLatest);
        let listed = store.list();
        assert_eq!(ids(&listed), ["2"]);
        assert!(!listed[0].payload_base64.is_empty());
    }

    #[test]
    fn quota_drops_payload_as_last_resort() {
        let mut big = record("big");
        big.payload_base64 = format!("data:application/pdf;base64,{}", "A".repeat(4096));
        let kv = Arc::new(MemoryKeyValueStore::with_quota(512));
        let store = HistoryStore::new(ContentKind::Portfolio, kv);

        assert_eq!(store.save(&big), SaveOutcome::PayloadDropped);
        let kept = store.get("big").unwrap();
        assert_eq!(kept.payload_base64, "");
        assert_eq!(kept.file_name, "project-big.pdf");
        assert_eq!(kept.suggestion_text, "suggestion big");
    }

    #[test]
    fn degrade_replaces_prior_history() {
        let kv = Arc::new(MemoryKeyValueStore::with_quota(1024));
        let store = HistoryStore::new(ContentKind::Portfolio, kv);
        store.save(&record("1"));
        store.save(&record("2"));

        let mut big = record("3");
        big.payload_base64 = "A".repeat(900);
        assert_eq!(store.save(&big), SaveOutcome::PayloadDropped);
        assert_eq!(ids(&store.list()), ["3"]);
    }

    #[test]
    fn metadata_too_large_for_any_tier_fails() {
        let kv = Arc::new(MemoryKeyValueStore::with_quota(16));
        let store = HistoryStore::new(ContentKind::Portfolio, kv);
        assert_eq!(store.save(&record("1")), SaveOutcome::Failed);
        assert!(store.list().is_empty());
    }

    /// Accepts the first `allowed` writes, then reports storage unavailable.
    struct FailingWrites {
        inner: MemoryKeyValueStore,
        allowed: AtomicUsize,
    }

    impl KeyValueStore for FailingWrites {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            let left = self.allowed.load(Ordering::SeqCst);
            if left == 0 {
                return Err(StorageError::Unavailable("storage disabled".into()));
            }
            self.allowed.store(left - 1, Ordering::SeqCst);
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn non_quota_write_failure_keeps_existing_history() {
        let kv = Arc::new(FailingWrites {
            inner: MemoryKeyValueStore::new(),
            allowed: AtomicUsize::new(1),
        });
        let store = HistoryStore::new(ContentKind::Portfolio, kv);

        assert_eq!(store.save(&record("1")), SaveOutcome::Stored);
        assert_eq!(store.save(&record("2")), SaveOutcome::Failed);
        assert_eq!(ids(&store.list()), ["1"]);
    }

    #[test]
    fn custom_capacity_is_respected() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let store = HistoryStore::with_capacity(ContentKind::Audio, kv, 5);
        for i in 0..8 {
            store.save(&record(&i.to_string()));
        }
        assert_eq!(ids(&store.list()), ["7", "6", "5", "4", "3"]);
    }
}
