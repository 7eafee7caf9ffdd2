use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    errors::AppResult,
    models::domain::AssessmentsState,
    store::{DocumentStore, LegacyStore, ReadOptions, LEGACY_ASSESSMENTS_KEY},
};

/// The persisted-state adapter. All engine components read and write the
/// assessments aggregate exclusively through this boundary.
#[async_trait]
pub trait AssessmentStateRepository: Send + Sync {
    async fn read_state(&self) -> AppResult<AssessmentsState>;
    async fn write_state(&self, state: &AssessmentsState, reason: &str) -> AppResult<()>;
}

pub struct RemoteStateRepository {
    store: Arc<dyn DocumentStore>,
    legacy: Arc<dyn LegacyStore>,
    resource: String,
    migration_checked: AtomicBool,
}

impl RemoteStateRepository {
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

    /// Decoding is lenient end to end: numeric and enum fields clamp to safe
    /// defaults, and a document that fails to decode at all reads as empty.
    fn decode(raw: Option<Value>) -> AssessmentsState {
        let Some(value) = raw else {
            return AssessmentsState::default();
        };
        match serde_json::from_value(value) {
            Ok(state) => state,
            Err(err) => {
                log::warn!("discarding undecodable assessments state: {}", err);
                AssessmentsState::default()
            }
        }
    }

    /// One-time migration of the legacy client store. Runs at most once per
    /// adapter lifetime; applies only when the remote state is empty and the
    /// legacy key holds non-empty state.
    async fn migrate_legacy(
        &self,
        current: &AssessmentsState,
    ) -> AppResult<Option<AssessmentsState>> {
        if !current.is_empty() {
            return Ok(None);
        }

        let Some(raw) = self.legacy.read(LEGACY_ASSESSMENTS_KEY).await? else {
            return Ok(None);
        };

        // Normalization happens in the clamped decode.
        let legacy_state = Self::decode(Some(raw));
        if legacy_state.is_empty() {
            return Ok(None);
        }

        log::info!("migrating legacy assessments state into the remote store");
        self.write_state(&legacy_state, "legacy migration").await?;
        self.legacy.delete(LEGACY_ASSESSMENTS_KEY).await?;
        Ok(Some(legacy_state))
    }
}

#[async_trait]
impl AssessmentStateRepository for RemoteStateRepository {
    async fn read_state(&self) -> AppResult<AssessmentsState> {
        let raw = self
            .store
            .get(&self.resource, ReadOptions::bypass_cache())
            .await?;
        let state = Self::decode(raw);

        if !self.migration_checked.swap(true, Ordering::SeqCst) {
            if let Some(migrated) = self.migrate_legacy(&state).await? {
                return Ok(migrated);
            }
        }

        Ok(state)
    }

    async fn write_state(&self, state: &AssessmentsState, reason: &str) -> AppResult<()> {
        log::debug!("writing assessments state ({})", reason);
        let body = serde_json::to_value(state)?;
        self.store.put(&self.resource, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::document_store::MockDocumentStore;
    use crate::store::legacy_store::MockLegacyStore;
    use serde_json::json;

    const RESOURCE: &str = "assessments/state";

    fn repository(
        store: MockDocumentStore,
        legacy: MockLegacyStore,
    ) -> RemoteStateRepository {
        RemoteStateRepository::new(Arc::new(store), Arc::new(legacy), RESOURCE)
    }

    #[tokio::test]
    async fn reads_bypass_caching() {
        let mut store = MockDocumentStore::new();
        store
            .expect_get()
            .withf(|path, opts| {
                path == RESOURCE && opts.cache_ttl_ms == 0 && !opts.dedupe
            })
            .returning(|_, _| Ok(Some(json!({ "templates": [] }))));

        let mut legacy = MockLegacyStore::new();
        legacy.expect_read().returning(|_| Ok(None));

        let repo = repository(store, legacy);
        let state = repo.read_state().await.unwrap();
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn migration_runs_once_and_deletes_the_legacy_key() {
        let mut store = MockDocumentStore::new();
        store.expect_get().returning(|_, _| Ok(None));
        // Exactly one write: the migration itself.
        store
            .expect_put()
            .times(1)
            .returning(|_, _| Ok(()));

        let mut legacy = MockLegacyStore::new();
        // The legacy key is consulted once even across repeated reads.
        legacy
            .expect_read()
            .times(1)
            .returning(|_| {
                Ok(Some(json!({
                    "templates": [{
                        "id": "tpl-1",
                        "title": "Migrated",
                        "durationMinutes": "40",
                        "createdByTeacherId": "teacher-1",
                        "createdAt": "2026-01-01T00:00:00Z",
                        "updatedAt": "2026-01-01T00:00:00Z"
                    }]
                })))
            });
        legacy
            .expect_delete()
            .times(1)
            .withf(|key| key == LEGACY_ASSESSMENTS_KEY)
            .returning(|_| Ok(()));

        let repo = repository(store, legacy);

        let first = repo.read_state().await.unwrap();
        assert_eq!(first.templates.len(), 1);
        // Legacy numerics are clamped during migration.
        assert_eq!(first.templates[0].duration_minutes, 40);

        // Second read: remote still empty in this mock, but the guard
        // prevents a second migration attempt.
        let second = repo.read_state().await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn migration_skipped_when_remote_state_is_populated() {
        let mut store = MockDocumentStore::new();
        store.expect_get().returning(|_, _| {
            Ok(Some(json!({
                "templates": [{
                    "id": "tpl-1",
                    "title": "Existing",
                    "createdByTeacherId": "teacher-1",
                    "createdAt": "2026-01-01T00:00:00Z",
                    "updatedAt": "2026-01-01T00:00:00Z"
                }]
            })))
        });
        store.expect_put().times(0);

        let mut legacy = MockLegacyStore::new();
        legacy.expect_read().times(0);
        legacy.expect_delete().times(0);

        let repo = repository(store, legacy);
        let state = repo.read_state().await.unwrap();
        assert_eq!(state.templates.len(), 1);
    }

    #[tokio::test]
    async fn undecodable_document_reads_as_empty() {
        let mut store = MockDocumentStore::new();
        store
            .expect_get()
            .returning(|_, _| Ok(Some(json!("not an object"))));

        let mut legacy = MockLegacyStore::new();
        legacy.expect_read().returning(|_| Ok(None));

        let repo = repository(store, legacy);
        let state = repo.read_state().await.unwrap();
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn reset_migration_guard_rearms_the_check() {
        let mut store = MockDocumentStore::new();
        store.expect_get().returning(|_, _| Ok(None));

        let mut legacy = MockLegacyStore::new();
        legacy.expect_read().times(2).returning(|_| Ok(None));

        let repo = repository(store, legacy);
        repo.read_state().await.unwrap();
        repo.reset_migration_guard();
        repo.read_state().await.unwrap();
    }
}
