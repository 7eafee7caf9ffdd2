use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::template::{
            Question, QuestionPrompt, TemplateStatus, TestTemplate,
        },
        dto::request::{QuestionInput, SaveTemplateRequest},
    },
    providers::EntitlementProvider,
    repositories::AssessmentStateRepository,
    services::snapshot_service::TemplateSnapshotService,
};

/// Authoring lifecycle for test templates. Every mutating operation applies
/// freeze-on-write before touching the stored template, so course placements
/// keep the last content students could have seen.
pub struct TemplateService {
    state_repository: Arc<dyn AssessmentStateRepository>,
    entitlements: Arc<dyn EntitlementProvider>,
}

impl TemplateService {
    pub fn new(
        state_repository: Arc<dyn AssessmentStateRepository>,
        entitlements: Arc<dyn EntitlementProvider>,
    ) -> Self {
        Self {
            state_repository,
            entitlements,
        }
    }

    pub async fn list_templates(&self, teacher_id: &str) -> AppResult<Vec<TestTemplate>> {
        let state = self.state_repository.read_state().await?;
        Ok(state
            .templates
            .into_iter()
            .filter(|t| !t.is_deleted() && t.created_by_teacher_id == teacher_id)
            .collect())
    }

    pub async fn get_template(&self, id: &str) -> AppResult<TestTemplate> {
        let state = self.state_repository.read_state().await?;
        state
            .templates
            .into_iter()
            .find(|t| t.id == id && !t.is_deleted())
            .ok_or_else(|| AppError::NotFound(format!("Test template with id '{}' not found", id)))
    }

    pub async fn save_template(
        &self,
        request: SaveTemplateRequest,
        teacher_id: &str,
    ) -> AppResult<TestTemplate> {
        request.validate()?;
        let questions = Self::build_questions(&request.questions);

        let mut state = self.state_repository.read_state().await?;

        let saved = match &request.id {
            Some(id) => {
                let existing = state
                    .templates
                    .iter()
                    .find(|t| t.id == *id && !t.is_deleted())
                    .cloned()
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Test template with id '{}' not found", id))
                    })?;

                if existing.created_by_teacher_id != teacher_id {
                    return Err(AppError::Unauthorized(
                        "Only the template's author can edit it".to_string(),
                    ));
                }

                // Freeze placements against the pre-edit content.
                TemplateSnapshotService::freeze_missing(&mut state, &existing);

                let template = state
                    .template_by_id_mut(id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Test template with id '{}' not found", id))
                    })?;
                template.title = request.title;
                template.description = request.description;
                template.duration_minutes = request.duration_minutes;
                template.assessment_kind = request.assessment_kind;
                template.questions = questions;
                template.recommendation_map = request.recommendation_map;
                template.updated_at = Utc::now();
                template.clone()
            }
            None => {
                let mut template = TestTemplate::new_draft(
                    &request.title,
                    &request.description,
                    request.duration_minutes,
                    request.assessment_kind,
                    teacher_id,
                    questions,
                );
                template.recommendation_map = request.recommendation_map;
                state.templates.push(template.clone());
                template
            }
        };

        self.state_repository
            .write_state(&state, "save template")
            .await?;
        Ok(saved)
    }

    pub async fn publish_template(&self, id: &str, teacher_id: &str) -> AppResult<TestTemplate> {
        let mut state = self.state_repository.read_state().await?;

        let existing = state
            .templates
            .iter()
            .find(|t| t.id == id && !t.is_deleted())
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!("Test template with id '{}' not found", id))
            })?;

        if existing.created_by_teacher_id != teacher_id {
            return Err(AppError::Unauthorized(
                "Only the template's author can publish it".to_string(),
            ));
        }
        Self::validate_for_publish(&existing)?;

        TemplateSnapshotService::freeze_missing(&mut state, &existing);

        let template = state.template_by_id_mut(id).ok_or_else(|| {
            AppError::NotFound(format!("Test template with id '{}' not found", id))
        })?;
        template.status = TemplateStatus::Published;
        template.updated_at = Utc::now();
        let published = template.clone();

        self.state_repository
            .write_state(&state, "publish template")
            .await?;
        Ok(published)
    }

    /// Deletion policy: refused outright while any purchased course embeds
    /// the template; otherwise a soft delete with freeze-on-write, so
    /// existing placements stay gradeable.
    pub async fn delete_template(&self, id: &str, teacher_id: &str) -> AppResult<()> {
        let mut state = self.state_repository.read_state().await?;

        let existing = state
            .templates
            .iter()
            .find(|t| t.id == id && !t.is_deleted())
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!("Test template with id '{}' not found", id))
            })?;

        if existing.created_by_teacher_id != teacher_id {
            return Err(AppError::Unauthorized(
                "Only the template's author can delete it".to_string(),
            ));
        }

        for course_id in state.courses_referencing_template(id) {
            if self.entitlements.has_completed_purchase(&course_id).await? {
                return Err(AppError::Conflict(format!(
                    "Test template '{}' is part of purchased course '{}'; hide it instead of deleting",
                    existing.title, course_id
                )));
            }
        }

        TemplateSnapshotService::freeze_missing(&mut state, &existing);

        let template = state.template_by_id_mut(id).ok_or_else(|| {
            AppError::NotFound(format!("Test template with id '{}' not found", id))
        })?;
        template.deleted_at = Some(Utc::now());
        template.updated_at = Utc::now();

        self.state_repository
            .write_state(&state, "soft delete template")
            .await
    }

    fn build_questions(inputs: &[QuestionInput]) -> Vec<Question> {
        inputs
            .iter()
            .map(|input| Question {
                id: input
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string()),
                prompt: QuestionPrompt {
                    text: input.prompt_text.clone(),
                    attachments: input.attachments.clone(),
                },
                answer_spec: input.answer_spec.clone(),
                feedback: input.feedback.clone(),
                topic_id: input.topic_id.clone(),
            })
            .collect()
    }

    fn validate_for_publish(template: &TestTemplate) -> AppResult<()> {
        if template.title.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Template title cannot be empty".to_string(),
            ));
        }
        if template.duration_minutes == 0 {
            return Err(AppError::ValidationError(
                "Template duration must be set before publishing".to_string(),
            ));
        }
        if template.questions.is_empty() {
            return Err(AppError::ValidationError(
                "Template must have at least one question".to_string(),
            ));
        }
        for question in &template.questions {
            if question.prompt.text.trim().is_empty() {
                return Err(AppError::ValidationError(format!(
                    "Question '{}' has no prompt text",
                    question.id
                )));
            }
            let candidates = question.answer_spec.expected.candidates();
            if candidates.is_empty() || candidates.iter().all(|c| c.trim().is_empty()) {
                return Err(AppError::ValidationError(format!(
                    "Question '{}' has an empty answer set",
                    question.id
                )));
            }
        }
        Ok(())
    }
}
