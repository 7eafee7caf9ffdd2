use crate::{
    errors::{AppError, AppResult},
    models::domain::{
        course_content::{ContentPayload, CourseContentItem},
        state::AssessmentsState,
        template::{TemplateSnapshot, TestTemplate},
    },
};

/// Freezes template content into course placements and resolves which
/// content a student actually sees for an item.
pub struct TemplateSnapshotService;

impl TemplateSnapshotService {
    pub fn capture(template: &TestTemplate) -> TemplateSnapshot {
        TemplateSnapshot::from_template(template)
    }

    /// Backfills a snapshot into every `test` item referencing the template
    /// that does not have one yet. Called with the template's state *before*
    /// an edit or soft delete is applied, so students keep the last version
    /// they could have seen. Items that already carry a snapshot are never
    /// touched. Returns the number of items frozen.
    pub fn freeze_missing(state: &mut AssessmentsState, template: &TestTemplate) -> usize {
        let snapshot = Self::capture(template);
        let mut frozen = 0;

        for items in state.course_content.values_mut() {
            for item in items.iter_mut() {
                if let ContentPayload::Test {
                    template_id,
                    template_snapshot,
                    ..
                } = &mut item.payload
                {
                    if template_id == &template.id && template_snapshot.is_none() {
                        *template_snapshot = Some(Box::new(snapshot.clone()));
                        frozen += 1;
                    }
                }
            }
        }

        frozen
    }

    /// Snapshot first; the live template is only a fallback for items that
    /// were never frozen.
    pub fn resolve_effective(
        item: &CourseContentItem,
        state: &AssessmentsState,
    ) -> AppResult<TemplateSnapshot> {
        match &item.payload {
            ContentPayload::Lesson { .. } => Err(AppError::ValidationError(format!(
                "Content item '{}' is a lesson, not a test",
                item.id
            ))),
            ContentPayload::Test {
                template_id,
                template_snapshot,
                ..
            } => {
                if let Some(snapshot) = template_snapshot {
                    return Ok((**snapshot).clone());
                }
                let template = state.template_by_id(template_id).ok_or_else(|| {
                    AppError::NotFound(format!(
                        "Test template with id '{}' not found",
                        template_id
                    ))
                })?;
                Ok(Self::capture(template))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::template::AssessmentKind;

    fn state_with_placement() -> (AssessmentsState, TestTemplate) {
        let template = TestTemplate::new_draft(
            "Original title",
            "",
            30,
            AssessmentKind::Credit,
            "teacher-1",
            vec![],
        );
        let mut state = AssessmentsState::default();
        state.templates.push(template.clone());
        state.course_content.insert(
            "course-1".to_string(),
            vec![CourseContentItem::new_test(
                "course-1",
                "block-1",
                &template.id,
                &template.title,
            )],
        );
        (state, template)
    }

    #[test]
    fn freeze_fills_only_items_without_a_snapshot() {
        let (mut state, template) = state_with_placement();

        assert_eq!(TemplateSnapshotService::freeze_missing(&mut state, &template), 1);

        let item = &state.course_content["course-1"][0];
        assert_eq!(item.template_snapshot().unwrap().title, "Original title");
    }

    #[test]
    fn freeze_is_one_shot_across_successive_edits() {
        let (mut state, mut template) = state_with_placement();

        // First edit freezes the pre-edit content.
        TemplateSnapshotService::freeze_missing(&mut state, &template);
        template.title = "Edited once".to_string();

        // Second edit must not re-freeze.
        let frozen = TemplateSnapshotService::freeze_missing(&mut state, &template);
        assert_eq!(frozen, 0);

        let item = &state.course_content["course-1"][0];
        assert_eq!(item.template_snapshot().unwrap().title, "Original title");
    }

    #[test]
    fn resolve_prefers_the_item_snapshot_over_the_live_template() {
        let (mut state, template) = state_with_placement();
        TemplateSnapshotService::freeze_missing(&mut state, &template);

        // Live template diverges after the freeze.
        state.template_by_id_mut(&template.id).unwrap().title = "Live edit".to_string();

        let item = state.course_content["course-1"][0].clone();
        let effective = TemplateSnapshotService::resolve_effective(&item, &state).unwrap();
        assert_eq!(effective.title, "Original title");
    }

    #[test]
    fn resolve_falls_back_to_the_live_template_when_unfrozen() {
        let (state, template) = state_with_placement();

        let item = state.course_content["course-1"][0].clone();
        let effective = TemplateSnapshotService::resolve_effective(&item, &state).unwrap();
        assert_eq!(effective.template_id, template.id);
        assert_eq!(effective.title, "Original title");
    }

    #[test]
    fn resolve_rejects_lesson_items() {
        let (mut state, _) = state_with_placement();
        let lesson = CourseContentItem::new_lesson("course-1", "block-1", "lesson-1");
        state
            .course_content
            .get_mut("course-1")
            .unwrap()
            .push(lesson.clone());

        let err = TemplateSnapshotService::resolve_effective(&lesson, &state).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn resolve_reports_missing_template_for_unfrozen_orphan() {
        let (mut state, _) = state_with_placement();
        state.templates.clear();

        let item = state.course_content["course-1"][0].clone();
        let err = TemplateSnapshotService::resolve_effective(&item, &state).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
