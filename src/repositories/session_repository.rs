use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::{
    errors::AppResult,
    models::domain::{AssessmentSession, SessionMap},
    store::{DocumentStore, LegacyStore, ReadOptions, LEGACY_SESSIONS_KEY},
};

/// Adapter for the in-progress session map. Expired entries are invisible to
/// readers and pruned from the stored document on every write.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn read_sessions(&self) -> AppResult<SessionMap>;
    async fn write_sessions(&self, sessions: &SessionMap) -> AppResult<()>;
}

pub struct RemoteSessionRepository {
    store: Arc<dyn DocumentStore>,
    legacy: Arc<dyn LegacyStore>,
    resource: String,
    migration_checked: AtomicBool,
}

impl RemoteSessionRepository {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        legacy: Arc<dyn LegacyStore>,
        resource: &str,
    ) -> Self {
        Self {
            store,
            legacy,
            resource: resource.to_string(),
            migration_checked: AtomicBool::new(false),
        }
    }

    /// Re-arms the one-shot migration check. Test harnesses only.
    pub fn reset_migration_guard(&self) {
        self.migration_checked.store(false, Ordering::SeqCst);
    }

    /// Entries that fail to decode are dropped individually rather than
    /// failing the whole map.
    fn decode(raw: Option<Value>) -> SessionMap {
        let Some(Value::Object(entries)) = raw else {
            return SessionMap::new();
        };

        entries
            .into_iter()
            .filter_map(|(key, value)| {
                match serde_json::from_value::<AssessmentSession>(value) {
                    Ok(session) => Some((key, session)),
                    Err(err) => {
                        log::warn!("dropping undecodable session entry '{}': {}", key, err);
                        None
                    }
                }
            })
            .collect()
    }

    fn live_only(sessions: SessionMap) -> SessionMap {
        let now = Utc::now();
        sessions
            .into_iter()
            .filter(|(_, session)| !session.is_expired(now))
            .collect()
    }

    async fn migrate_legacy(&self, current: &SessionMap) -> AppResult<Option<SessionMap>> {
        if !current.is_empty() {
            return Ok(None);
        }

        let Some(raw) = self.legacy.read(LEGACY_SESSIONS_KEY).await? else {
            return Ok(None);
        };

        // Legacy entries decay under the same TTL.
        let migrated = Self::live_only(Self::decode(Some(raw)));
        if migrated.is_empty() {
            return Ok(None);
        }

        log::info!(
            "migrating {} legacy assessment sessions into the remote store",
            migrated.len()
        );
        self.write_sessions(&migrated).await?;
        self.legacy.delete(LEGACY_SESSIONS_KEY).await?;
        Ok(Some(migrated))
    }
}

#[async_trait]
impl SessionRepository for RemoteSessionRepository {
    async fn read_sessions(&self) -> AppResult<SessionMap> {
        let raw = self
            .store
            .get(&self.resource, ReadOptions::bypass_cache())
            .await?;
        let sessions = Self::live_only(Self::decode(raw));

        if !self.migration_checked.swap(true, Ordering::SeqCst) {
            if let Some(migrated) = self.migrate_legacy(&sessions).await? {
                return Ok(migrated);
            }
        }

        Ok(sessions)
    }

    async fn write_sessions(&self, sessions: &SessionMap) -> AppResult<()> {
        let live = Self::live_only(sessions.clone());
        if live.len() < sessions.len() {
            log::debug!(
                "pruning {} expired assessment sessions on write",
                sessions.len() - live.len()
            );
        }
        let body = serde_json::to_value(&live)?;
        self.store.put(&self.resource, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::document_store::MockDocumentStore;
    use crate::store::legacy_store::MockLegacyStore;
    use chrono::Duration;
    use serde_json::json;
    use std::collections::BTreeMap;

    const RESOURCE: &str = "assessments/sessions";

    fn session_json(updated_days_ago: i64) -> Value {
        let updated = Utc::now() - Duration::days(updated_days_ago);
        json!({
            "studentId": "student-1",
            "courseId": "course-1",
            "testItemId": "test-item-1",
            "templateId": "tpl-1",
            "startedAt": updated.to_rfc3339(),
            "remainingSeconds": 600,
            "currentQuestionIndex": 1,
            "answers": {},
            "updatedAt": updated.to_rfc3339()
        })
    }

    fn repository(
        store: MockDocumentStore,
        legacy: MockLegacyStore,
    ) -> RemoteSessionRepository {
        RemoteSessionRepository::new(Arc::new(store), Arc::new(legacy), RESOURCE)
    }

    #[tokio::test]
    async fn expired_sessions_are_invisible_on_read() {
        let mut store = MockDocumentStore::new();
        store.expect_get().returning(|_, _| {
            Ok(Some(json!({
                "student-1:course-1:test-item-1": session_json(15),
                "student-1:course-1:test-item-2": session_json(13),
            })))
        });

        let mut legacy = MockLegacyStore::new();
        legacy.expect_read().returning(|_| Ok(None));

        let repo = repository(store, legacy);
        let sessions = repo.read_sessions().await.unwrap();

        assert_eq!(sessions.len(), 1);
        assert!(sessions.contains_key("student-1:course-1:test-item-2"));
    }

    #[tokio::test]
    async fn writes_prune_expired_entries() {
        let mut store = MockDocumentStore::new();
        store
            .expect_put()
            .withf(|_, body| body.as_object().map(|m| m.len()) == Some(1))
            .times(1)
            .returning(|_, _| Ok(()));

        let legacy = MockLegacyStore::new();
        let repo = repository(store, legacy);

        let mut sessions = BTreeMap::new();
        let fresh: AssessmentSession =
            serde_json::from_value(session_json(1)).unwrap();
        let stale: AssessmentSession = serde_json::from_value(session_json(20)).unwrap();
        sessions.insert("fresh".to_string(), fresh);
        sessions.insert("stale".to_string(), stale);

        repo.write_sessions(&sessions).await.unwrap();
    }

    #[tokio::test]
    async fn legacy_sessions_migrate_with_ttl_applied() {
        let mut store = MockDocumentStore::new();
        store.expect_get().returning(|_, _| Ok(None));
        store.expect_put().times(1).returning(|_, _| Ok(()));

        let mut legacy = MockLegacyStore::new();
        legacy.expect_read().times(1).returning(|_| {
            Ok(Some(json!({
                "student-1:course-1:test-item-1": session_json(30),
                "student-1:course-1:test-item-2": session_json(2),
            })))
        });
        legacy
            .expect_delete()
            .times(1)
            .withf(|key| key == LEGACY_SESSIONS_KEY)
            .returning(|_| Ok(()));

        let repo = repository(store, legacy);
        let sessions = repo.read_sessions().await.unwrap();

        assert_eq!(sessions.len(), 1);
        assert!(sessions.contains_key("student-1:course-1:test-item-2"));
    }

    #[tokio::test]
    async fn undecodable_entries_are_dropped_individually() {
        let mut store = MockDocumentStore::new();
        store.expect_get().returning(|_, _| {
            Ok(Some(json!({
                "good": session_json(0),
                "bad": { "studentId": 42 },
            })))
        });

        let mut legacy = MockLegacyStore::new();
        legacy.expect_read().returning(|_| Ok(None));

        let repo = repository(store, legacy);
        let sessions = repo.read_sessions().await.unwrap();

        assert_eq!(sessions.len(), 1);
        assert!(sessions.contains_key("good"));
    }
}
