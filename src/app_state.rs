use std::sync::Arc;

use crate::{
    config::Config,
    errors::AppResult,
    providers::{
        EntitlementProvider, HttpEntitlementProvider, HttpLessonProvider, LessonProvider,
    },
    repositories::{
        AssessmentStateRepository, RemoteSessionRepository, RemoteStateRepository,
        SessionRepository,
    },
    services::{
        AssessmentAttemptService, AssessmentSessionService, ContentQueueService, TemplateService,
    },
    store::{DocumentStore, FileLegacyStore, HttpDocumentStore, LegacyStore},
};

#[derive(Clone)]
pub struct AppState {
    pub template_service: Arc<TemplateService>,
    pub queue_service: Arc<ContentQueueService>,
    pub attempt_service: Arc<AssessmentAttemptService>,
    pub session_service: Arc<AssessmentSessionService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let store = HttpDocumentStore::new(&config)?;
        store.health_check().await?;
        log::info!("connected to document store at {}", config.store_base_url);

        let store: Arc<dyn DocumentStore> = Arc::new(store);
        let legacy: Arc<dyn LegacyStore> =
            Arc::new(FileLegacyStore::new(&config.legacy_store_path));

        let state_repository: Arc<dyn AssessmentStateRepository> =
            Arc::new(RemoteStateRepository::new(
                store.clone(),
                legacy.clone(),
                &config.assessments_resource,
            ));
        let session_repository: Arc<dyn SessionRepository> =
            Arc::new(RemoteSessionRepository::new(
                store,
                legacy,
                &config.sessions_resource,
            ));

        let lessons: Arc<dyn LessonProvider> = Arc::new(HttpLessonProvider::new(&config)?);
        let entitlements: Arc<dyn EntitlementProvider> =
            Arc::new(HttpEntitlementProvider::new(&config)?);

        Ok(Self::from_parts(
            state_repository,
            session_repository,
            lessons,
            entitlements,
            config,
        ))
    }

    /// Wires the services from already-constructed boundaries. Test
    /// harnesses use this with in-memory implementations.
    pub fn from_parts(
        state_repository: Arc<dyn AssessmentStateRepository>,
        session_repository: Arc<dyn SessionRepository>,
        lessons: Arc<dyn LessonProvider>,
        entitlements: Arc<dyn EntitlementProvider>,
        config: Config,
    ) -> Self {
        let template_service = Arc::new(TemplateService::new(
            state_repository.clone(),
            entitlements,
        ));
        let queue_service = Arc::new(ContentQueueService::new(
            state_repository.clone(),
            lessons,
        ));
        let attempt_service = Arc::new(AssessmentAttemptService::new(
            state_repository,
            session_repository.clone(),
        ));
        let session_service = Arc::new(AssessmentSessionService::new(session_repository));

        Self {
            template_service,
            queue_service,
            attempt_service,
            session_service,
            config: Arc::new(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_cloneable() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }
}
