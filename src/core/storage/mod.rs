// Storage core: the document port and the cached database in front of it.

pub mod database;
pub mod defaults;
pub mod document_store;

pub use database::Database;
pub use document_store::{
    new_record_id, Document, DocumentKind, DocumentStore, DomainError, StoreError,
};

#[cfg(test)]
pub mod test_support {
    use super::{Database, DocumentKind, DocumentStore, StoreError};
    use async_trait::async_trait;
    use dashmap::{DashMap, DashSet};
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    /// Holds one load after it has read its value. `started` fires once the
    /// load is parked, `release` lets it return.
    #[derive(Clone, Default)]
    pub struct LoadGate {
        pub started: Arc<Notify>,
        pub release: Arc<Notify>,
    }

    /// In-memory store for testing. Counts loads per document so cache
    /// behaviour can be asserted.
    pub struct MemoryStore {
        documents: DashMap<DocumentKind, Value>,
        loads: DashMap<DocumentKind, usize>,
        saves: AtomicUsize,
        fail_loads: AtomicBool,
        failing_saves: DashSet<DocumentKind>,
        load_gate: Mutex<Option<LoadGate>>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self {
                documents: DashMap::new(),
                loads: DashMap::new(),
                saves: AtomicUsize::new(0),
                fail_loads: AtomicBool::new(false),
                failing_saves: DashSet::new(),
                load_gate: Mutex::new(None),
            }
        }

        /// Replace a document behind the cache's back.
        pub fn put(&self, kind: DocumentKind, value: Value) {
            self.documents.insert(kind, value);
        }

        pub fn get(&self, kind: DocumentKind) -> Option<Value> {
            self.documents.get(&kind).map(|v| v.clone())
        }

        pub fn load_count(&self, kind: DocumentKind) -> usize {
            self.loads.get(&kind).map(|c| *c).unwrap_or(0)
        }

        pub fn save_count(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }

        pub fn fail_loads(&self, fail: bool) {
            self.fail_loads.store(fail, Ordering::SeqCst);
        }

        /// Make every save of `kind` fail until the store is dropped.
        pub fn fail_saves_for(&self, kind: DocumentKind) {
            self.failing_saves.insert(kind);
        }

        /// Park the next load until the returned gate is released.
        pub fn pause_next_load(&self) -> LoadGate {
            let gate = LoadGate::default();
            *self.load_gate.lock().unwrap() = Some(gate.clone());
            gate
        }
    }

    #[async_trait]
    impl DocumentStore for MemoryStore {
        async fn load(&self, kind: DocumentKind) -> Result<Option<Value>, StoreError> {
            *self.loads.entry(kind).or_insert(0) += 1;
            if self.fail_loads.load(Ordering::SeqCst) {
                return Err(StoreError::Io(std::io::Error::other("disk unavailable")));
            }
            let value = self.documents.get(&kind).map(|v| v.clone());
            let gate = self.load_gate.lock().unwrap().take();
            if let Some(gate) = gate {
                gate.started.notify_one();
                gate.release.notified().await;
            }
            Ok(value)
        }

        async fn save(&self, kind: DocumentKind, value: &Value) -> Result<(), StoreError> {
            if self.failing_saves.contains(&kind) {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.documents.insert(kind, value.clone());
            Ok(())
        }
    }

    pub fn memory_database() -> Arc<Database<MemoryStore>> {
        Arc::new(Database::new(MemoryStore::new()))
    }
}
