use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

use crate::core::storage::{DocumentKind, DocumentStore, StoreError};

/// One pretty-printed JSON file per document, all in the same directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_of(&self, kind: DocumentKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn load(&self, kind: DocumentKind) -> Result<Option<Value>, StoreError> {
        let path = self.path_of(kind);
        if !path.exists() {
            return Ok(None);
        }

        let text = fs::read_to_string(&path).await?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn save(&self, kind: DocumentKind, value: &Value) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).await?;
        let text = serde_json::to_string_pretty(value)?;
        fs::write(self.path_of(kind), text).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bookings::BookingsDocument;
    use crate::core::permissions::Permissions;
    use crate::core::storage::Database;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        assert!(store.load(DocumentKind::Users).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested"));
        let value = json!({ "owner": 1, "admins": [2, 3] });

        store.save(DocumentKind::Permissions, &value).await.unwrap();

        let loaded = store.load(DocumentKind::Permissions).await.unwrap();
        assert_eq!(loaded, Some(value));
        assert!(dir.path().join("nested/permissions.json").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("alliance.json"), "{ not json").unwrap();
        let store = JsonFileStore::new(dir.path());

        let result = store.load(DocumentKind::Alliance).await;

        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_ensure_defaults_creates_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(JsonFileStore::new(dir.path()));

        db.ensure_defaults().await.unwrap();

        for kind in DocumentKind::ALL {
            assert!(dir.path().join(kind.file_name()).exists(), "{kind} missing");
        }
        let bookings: BookingsDocument = db.read().await.unwrap();
        assert!(bookings.building.is_empty());

        db.write(&Permissions {
            owner: Some(9),
            admins: vec![],
        })
        .await
        .unwrap();
        let text = std::fs::read_to_string(dir.path().join("permissions.json")).unwrap();
        assert!(text.contains("\"owner\": 9"));
    }
}
