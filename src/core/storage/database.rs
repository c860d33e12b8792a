// Read-through cache in front of a DocumentStore.
//
// Reads are served from memory while the cached copy is younger than the TTL.
// Writes go to the store first and then replace the cached copy, so a write
// is visible to the very next read no matter how old the entry was.
//
// Every write bumps a per-document generation. A load only fills the cache
// if no write landed while it was in flight, so an old copy never replaces
// a newer one.

use super::defaults::default_shape;
use super::document_store::{Document, DocumentKind, DocumentStore, StoreError};
use dashmap::DashMap;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// How long a document read from disk is trusted.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(5000);

struct CachedDocument {
    value: Value,
    loaded_at: Instant,
}

pub struct Database<S: DocumentStore> {
    store: S,
    ttl: Duration,
    cache: DashMap<DocumentKind, CachedDocument>,
    generations: DashMap<DocumentKind, u64>,
    // Serializes read-modify-write cycles across tasks.
    write_lock: Mutex<()>,
}

impl<S: DocumentStore> Database<S> {
    pub fn new(store: S) -> Self {
        Self::with_ttl(store, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(store: S, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            cache: DashMap::new(),
            generations: DashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Write the default shape of every document that doesn't exist yet.
    pub async fn ensure_defaults(&self) -> Result<(), StoreError> {
        for kind in DocumentKind::ALL {
            if self.store.load(kind).await?.is_none() {
                let value = default_shape(kind)?;
                self.store.save(kind, &value).await?;
                tracing::info!(document = %kind, "Created default document");
            }
        }
        Ok(())
    }

    /// Read a typed document, going to the store only when the cache is stale.
    pub async fn read<D: Document>(&self) -> Result<D, StoreError> {
        let value = self.read_value(D::KIND).await?;
        serde_json::from_value(value).map_err(|e| {
            tracing::error!(document = %D::KIND, error = %e, "Failed to parse document");
            StoreError::from(e)
        })
    }

    /// Persist a typed document and refresh its cache entry.
    pub async fn write<D: Document>(&self, document: &D) -> Result<(), StoreError> {
        let value = serde_json::to_value(document)?;
        self.write_value(D::KIND, value).await
    }

    /// Read-modify-write. The document is only written back when `f` succeeds.
    pub async fn try_update<D, R, E, F>(&self, f: F) -> Result<R, E>
    where
        D: Document,
        E: From<StoreError>,
        F: FnOnce(&mut D) -> Result<R, E> + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read::<D>().await?;
        let result = f(&mut document)?;
        self.write(&document).await?;
        Ok(result)
    }

    /// Infallible variant of [`Database::try_update`].
    pub async fn update<D, R, F>(&self, f: F) -> Result<R, StoreError>
    where
        D: Document,
        F: FnOnce(&mut D) -> R + Send,
    {
        self.try_update::<D, R, StoreError, _>(|doc| Ok(f(doc)))
            .await
    }

    /// Drop every cached document so the next reads hit the store.
    pub fn invalidate(&self) {
        for kind in DocumentKind::ALL {
            let mut generation = self.generations.entry(kind).or_insert(0);
            *generation += 1;
            self.cache.remove(&kind);
        }
    }

    pub fn cached_documents(&self) -> usize {
        self.cache.len()
    }

    async fn read_value(&self, kind: DocumentKind) -> Result<Value, StoreError> {
        let cached = self
            .cache
            .get(&kind)
            .filter(|entry| entry.loaded_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone());
        if let Some(value) = cached {
            return Ok(value);
        }

        let started = self.generations.get(&kind).map(|g| *g).unwrap_or(0);
        let value = match self.store.load(kind).await {
            Ok(Some(value)) => value,
            Ok(None) => default_shape(kind)?,
            Err(e) => {
                tracing::error!(document = %kind, error = %e, "Failed to read document");
                return Err(e);
            }
        };

        // Held until the insert so a concurrent write can't slip in between.
        let generation = self.generations.entry(kind).or_insert(0);
        if *generation != started {
            tracing::debug!(document = %kind, "Document written during load, keeping newer copy");
            let newer = self.cache.get(&kind).map(|entry| entry.value.clone());
            return Ok(newer.unwrap_or(value));
        }
        self.cache.insert(
            kind,
            CachedDocument {
                value: value.clone(),
                loaded_at: Instant::now(),
            },
        );
        drop(generation);
        Ok(value)
    }

    async fn write_value(&self, kind: DocumentKind, value: Value) -> Result<(), StoreError> {
        if let Err(e) = self.store.save(kind, &value).await {
            tracing::error!(document = %kind, error = %e, "Failed to write document");
            return Err(e);
        }

        let mut generation = self.generations.entry(kind).or_insert(0);
        *generation += 1;
        self.cache.insert(
            kind,
            CachedDocument {
                value,
                loaded_at: Instant::now(),
            },
        );
        drop(generation);
        Ok(())
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::permissions::Permissions;
    use crate::core::storage::test_support::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_second_read_within_ttl_hits_cache() {
        let db = Database::new(MemoryStore::new());

        let first: Permissions = db.read().await.unwrap();
        let second: Permissions = db.read().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(db.store().load_count(DocumentKind::Permissions), 1);
    }

    #[tokio::test]
    async fn test_cached_read_ignores_changes_on_disk() {
        let db = Database::new(MemoryStore::new());
        let _: Permissions = db.read().await.unwrap();

        db.store()
            .put(DocumentKind::Permissions, json!({ "owner": 42, "admins": [] }));

        let cached: Permissions = db.read().await.unwrap();
        assert_eq!(cached.owner, None);
    }

    #[tokio::test]
    async fn test_stale_entry_is_reloaded() {
        let db = Database::with_ttl(MemoryStore::new(), Duration::ZERO);
        let _: Permissions = db.read().await.unwrap();

        db.store()
            .put(DocumentKind::Permissions, json!({ "owner": 42, "admins": [] }));

        let fresh: Permissions = db.read().await.unwrap();
        assert_eq!(fresh.owner, Some(42));
        assert_eq!(db.store().load_count(DocumentKind::Permissions), 2);
    }

    #[tokio::test]
    async fn test_write_is_visible_immediately_without_reload() {
        let db = Database::new(MemoryStore::new());
        let _: Permissions = db.read().await.unwrap();

        let written = Permissions {
            owner: Some(7),
            admins: vec![8, 9],
        };
        db.write(&written).await.unwrap();

        let read: Permissions = db.read().await.unwrap();
        assert_eq!(read, written);
        assert_eq!(db.store().load_count(DocumentKind::Permissions), 1);
    }

    #[tokio::test]
    async fn test_failed_update_does_not_write() {
        let db = Database::new(MemoryStore::new());

        let result: Result<(), StoreError> = db
            .try_update::<Permissions, _, _, _>(|doc| {
                doc.owner = Some(1);
                Err(StoreError::Io(std::io::Error::other("rejected")))
            })
            .await;

        assert!(result.is_err());
        let read: Permissions = db.read().await.unwrap();
        assert_eq!(read.owner, None);
        assert_eq!(db.store().save_count(), 0);
    }

    #[tokio::test]
    async fn test_load_failure_is_reported() {
        let store = MemoryStore::new();
        store.fail_loads(true);
        let db = Database::new(store);

        assert!(db.read::<Permissions>().await.is_err());
    }

    #[tokio::test]
    async fn test_ensure_defaults_creates_missing_documents_only() {
        let store = MemoryStore::new();
        store.put(DocumentKind::Permissions, json!({ "owner": 3, "admins": [] }));
        let db = Database::new(store);

        db.ensure_defaults().await.unwrap();

        assert_eq!(db.store().save_count(), DocumentKind::ALL.len() - 1);
        let perms: Permissions = db.read().await.unwrap();
        assert_eq!(perms.owner, Some(3));
    }

    #[tokio::test]
    async fn test_load_racing_a_write_does_not_overwrite_newer_copy() {
        let db = Arc::new(Database::new(MemoryStore::new()));
        db.store()
            .put(DocumentKind::Permissions, json!({ "owner": null, "admins": [1] }));
        let gate = db.store().pause_next_load();

        let reader = {
            let db = Arc::clone(&db);
            tokio::spawn(async move { db.read::<Permissions>().await })
        };
        // The reader has its copy of the file but hasn't cached it yet.
        gate.started.notified().await;

        db.update(|p: &mut Permissions| p.admins.push(2))
            .await
            .unwrap();
        gate.release.notify_one();

        let raced = reader.await.unwrap().unwrap();
        assert_eq!(raced.admins, vec![1, 2]);

        let cached: Permissions = db.read().await.unwrap();
        assert_eq!(cached.admins, vec![1, 2]);

        db.update(|p: &mut Permissions| p.admins.push(3))
            .await
            .unwrap();
        let stored: Permissions =
            serde_json::from_value(db.store().get(DocumentKind::Permissions).unwrap()).unwrap();
        assert_eq!(stored.admins, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let db = Database::new(MemoryStore::new());
        let _: Permissions = db.read().await.unwrap();
        assert_eq!(db.cached_documents(), 1);

        db.invalidate();
        let _: Permissions = db.read().await.unwrap();

        assert_eq!(db.store().load_count(DocumentKind::Permissions), 2);
    }
}
