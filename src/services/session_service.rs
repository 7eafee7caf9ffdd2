use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    errors::AppResult,
    models::{domain::session::AssessmentSession, dto::request::SaveSessionRequest},
    repositories::SessionRepository,
};

/// In-progress test state. The UI drives timers and autosave cadence; this
/// service only persists and restores the snapshot of that state.
pub struct AssessmentSessionService {
    session_repository: Arc<dyn SessionRepository>,
}

impl AssessmentSessionService {
    pub fn new(session_repository: Arc<dyn SessionRepository>) -> Self {
        Self { session_repository }
    }

    /// `None` when no session exists or the stored one has outlived its TTL
    /// (the repository filters expired entries on read).
    pub async fn load_session(
        &self,
        student_id: &str,
        course_id: &str,
        test_item_id: &str,
    ) -> AppResult<Option<AssessmentSession>> {
        let sessions = self.session_repository.read_sessions().await?;
        let key = AssessmentSession::key_for(student_id, course_id, test_item_id);
        Ok(sessions.get(&key).cloned())
    }

    /// Upsert with a fresh `updated_at`. A first autosave creates the
    /// session; an existing live session keeps its original `started_at`.
    pub async fn save_session(
        &self,
        request: SaveSessionRequest,
    ) -> AppResult<AssessmentSession> {
        request.validate()?;

        let mut sessions = self.session_repository.read_sessions().await?;
        let key = AssessmentSession::key_for(
            &request.student_id,
            &request.course_id,
            &request.test_item_id,
        );

        let now = Utc::now();
        let started_at = sessions
            .get(&key)
            .map(|existing| existing.started_at)
            .unwrap_or(now);

        let session = AssessmentSession {
            student_id: request.student_id,
            course_id: request.course_id,
            test_item_id: request.test_item_id,
            template_id: request.template_id,
            started_at,
            remaining_seconds: clamp_seconds(request.remaining_seconds),
            current_question_index: request.current_question_index,
            answers: request.answers,
            updated_at: now,
        };

        sessions.insert(key, session.clone());
        self.session_repository.write_sessions(&sessions).await?;
        Ok(session)
    }

    pub async fn clear_session(
        &self,
        student_id: &str,
        course_id: &str,
        test_item_id: &str,
    ) -> AppResult<()> {
        let mut sessions = self.session_repository.read_sessions().await?;
        let key = AssessmentSession::key_for(student_id, course_id, test_item_id);
        if sessions.remove(&key).is_some() {
            self.session_repository.write_sessions(&sessions).await?;
        }
        Ok(())
    }
}

fn clamp_seconds(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.floor() as u32
    } else {
        0
    }
}
