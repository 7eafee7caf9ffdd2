use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::{AppError, AppResult};

/// Fixed keys the pre-migration client stored its state under.
pub const LEGACY_ASSESSMENTS_KEY: &str = "tutoring.assessments.v1";
pub const LEGACY_SESSIONS_KEY: &str = "tutoring.assessment-sessions.v1";

/// The old client-side key-value store. Read once during migration, then the
/// migrated key is deleted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LegacyStore: Send + Sync {
    async fn read(&self, key: &str) -> AppResult<Option<Value>>;
    async fn delete(&self, key: &str) -> AppResult<()>;
}

/// Server rendition of the legacy store: one JSON file mapping keys to the
/// values the old client persisted.
pub struct FileLegacyStore {
    path: PathBuf,
}

impl FileLegacyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_map(&self) -> AppResult<Option<Map<String, Value>>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(AppError::StorageError(format!(
                    "legacy store read failed: {}",
                    err
                )))
            }
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            // An unreadable legacy file is treated as already migrated.
            Ok(_) | Err(_) => Ok(None),
        }
    }
}

#[async_trait]
impl LegacyStore for FileLegacyStore {
    async fn read(&self, key: &str) -> AppResult<Option<Value>> {
        let map = self.read_map().await?;
        Ok(map.and_then(|m| m.get(key).cloned()))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let Some(mut map) = self.read_map().await? else {
            return Ok(());
        };

        if map.remove(key).is_some() {
            let body = serde_json::to_vec(&Value::Object(map))?;
            tokio::fs::write(&self.path, body).await.map_err(|err| {
                AppError::StorageError(format!("legacy store write failed: {}", err))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn missing_file_reads_as_absent() {
        let store = FileLegacyStore::new("/nonexistent/legacy_store.json");
        let value = store.read(LEGACY_ASSESSMENTS_KEY).await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn read_and_delete_round_trip() {
        let dir = std::env::temp_dir().join(format!("legacy-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("legacy_store.json");
        tokio::fs::write(
            &path,
            serde_json::to_vec(&json!({
                LEGACY_ASSESSMENTS_KEY: { "templates": [] },
                LEGACY_SESSIONS_KEY: {}
            }))
            .unwrap(),
        )
        .await
        .unwrap();

        let store = FileLegacyStore::new(&path);
        assert!(store.read(LEGACY_ASSESSMENTS_KEY).await.unwrap().is_some());

        store.delete(LEGACY_ASSESSMENTS_KEY).await.unwrap();
        assert!(store.read(LEGACY_ASSESSMENTS_KEY).await.unwrap().is_none());
        // The other key is untouched.
        assert!(store.read(LEGACY_SESSIONS_KEY).await.unwrap().is_some());
    }
}
