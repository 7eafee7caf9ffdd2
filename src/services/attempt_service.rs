use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{
            attempt::AssessmentAttempt, session::AssessmentSession,
        },
        dto::{
            request::SubmitAttemptRequest,
            response::{CourseProgress, KnowledgeProgress, SubmitAttemptResponse},
        },
    },
    repositories::{AssessmentStateRepository, SessionRepository},
    services::{evaluator::AnswerEvaluator, snapshot_service::TemplateSnapshotService},
};

/// Submission and read-side aggregation over the append-only attempt list.
pub struct AssessmentAttemptService {
    state_repository: Arc<dyn AssessmentStateRepository>,
    session_repository: Arc<dyn SessionRepository>,
}

impl AssessmentAttemptService {
    pub fn new(
        state_repository: Arc<dyn AssessmentStateRepository>,
        session_repository: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            state_repository,
            session_repository,
        }
    }

    pub async fn submit_attempt(
        &self,
        request: SubmitAttemptRequest,
    ) -> AppResult<SubmitAttemptResponse> {
        request.validate()?;
        if request.answers.is_empty() {
            return Err(AppError::ValidationError(
                "Cannot submit an attempt with no answers".to_string(),
            ));
        }

        let mut state = self.state_repository.read_state().await?;

        let item = state
            .course_content
            .get(&request.course_id)
            .and_then(|items| items.iter().find(|i| i.id == request.test_item_id))
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Test item '{}' not found in course '{}'",
                    request.test_item_id, request.course_id
                ))
            })?;

        let content = TemplateSnapshotService::resolve_effective(&item, &state)?;
        let outcome = AnswerEvaluator::evaluate(&content, &request.answers);

        let now = Utc::now();
        let attempt = AssessmentAttempt {
            id: Uuid::new_v4().to_string(),
            student_id: request.student_id.clone(),
            course_id: request.course_id.clone(),
            test_item_id: request.test_item_id.clone(),
            template_id: content.template_id.clone(),
            started_at: request.started_at.unwrap_or(now),
            submitted_at: now,
            time_spent_seconds: clamp_seconds(request.time_spent_seconds),
            answers: outcome.checked.clone(),
            score: outcome.score.clone(),
            topic_breakdown: outcome.topic_breakdown.clone(),
            recommendations_computed: outcome.recommendations.clone(),
        };

        state.attempts.push(attempt.clone());
        self.state_repository
            .write_state(&state, "submit attempt")
            .await?;

        // Completion is the attempt itself; the in-progress session goes.
        self.clear_session(&request.student_id, &request.course_id, &request.test_item_id)
            .await?;

        Ok(SubmitAttemptResponse {
            attempt,
            checked: outcome.checked,
        })
    }

    async fn clear_session(
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

    pub async fn get_attempts(
        &self,
        student_id: &str,
        course_id: &str,
        test_item_id: Option<&str>,
    ) -> AppResult<Vec<AssessmentAttempt>> {
        let state = self.state_repository.read_state().await?;
        let mut attempts: Vec<AssessmentAttempt> = state
            .attempts
            .into_iter()
            .filter(|a| {
                a.student_id == student_id
                    && a.course_id == course_id
                    && test_item_id.map_or(true, |item| a.test_item_id == item)
            })
            .collect();
        attempts.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(attempts)
    }

    /// One attempt per test item: the most recently submitted, by append
    /// order so equal timestamps cannot flip the winner.
    pub async fn latest_attempts_map(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> AppResult<BTreeMap<String, AssessmentAttempt>> {
        let state = self.state_repository.read_state().await?;
        Ok(Self::reduce_latest(
            state
                .attempts
                .iter()
                .filter(|a| a.student_id == student_id && a.course_id == course_id),
        ))
    }

    /// One attempt per test item: the highest percent, first attempt wins
    /// ties.
    pub async fn best_attempts_map(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> AppResult<BTreeMap<String, AssessmentAttempt>> {
        let state = self.state_repository.read_state().await?;
        Ok(Self::reduce_best(
            state
                .attempts
                .iter()
                .filter(|a| a.student_id == student_id && a.course_id == course_id),
        ))
    }

    fn reduce_latest<'a>(
        attempts: impl Iterator<Item = &'a AssessmentAttempt>,
    ) -> BTreeMap<String, AssessmentAttempt> {
        let mut map = BTreeMap::new();
        for attempt in attempts {
            map.insert(attempt.test_item_id.clone(), attempt.clone());
        }
        map
    }

    fn reduce_best<'a>(
        attempts: impl Iterator<Item = &'a AssessmentAttempt>,
    ) -> BTreeMap<String, AssessmentAttempt> {
        let mut map: BTreeMap<String, AssessmentAttempt> = BTreeMap::new();
        for attempt in attempts {
            match map.get(&attempt.test_item_id) {
                Some(existing) if existing.score.percent >= attempt.score.percent => {}
                _ => {
                    map.insert(attempt.test_item_id.clone(), attempt.clone());
                }
            }
        }
        map
    }

    /// "How far has the student progressed": completion and average over
    /// the latest attempt per item.
    pub async fn course_progress(
        &self,
        student_id: &str,
        course_id: &str,
        test_item_ids: &[String],
    ) -> AppResult<CourseProgress> {
        let latest = self.latest_attempts_map(student_id, course_id).await?;
        let (completed, average) = Self::completion_stats(&latest, test_item_ids);
        Ok(CourseProgress {
            completed_tests: completed,
            total_tests: test_item_ids.len() as u32,
            average_latest_percent: average,
        })
    }

    /// "How well has the student ever done": the same computation over best
    /// attempts.
    pub async fn knowledge_progress(
        &self,
        student_id: &str,
        course_id: &str,
        test_item_ids: &[String],
    ) -> AppResult<KnowledgeProgress> {
        let best = self.best_attempts_map(student_id, course_id).await?;
        let (completed, average) = Self::completion_stats(&best, test_item_ids);
        Ok(KnowledgeProgress {
            completed_tests: completed,
            total_tests: test_item_ids.len() as u32,
            average_best_percent: average,
        })
    }

    fn completion_stats(
        per_item: &BTreeMap<String, AssessmentAttempt>,
        test_item_ids: &[String],
    ) -> (u32, f64) {
        let percents: Vec<f64> = test_item_ids
            .iter()
            .filter_map(|id| per_item.get(id))
            .map(|attempt| attempt.score.percent as f64)
            .collect();

        if percents.is_empty() {
            return (0, 0.0);
        }
        let average = percents.iter().sum::<f64>() / percents.len() as f64;
        (percents.len() as u32, average)
    }
}

fn clamp_seconds(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.floor() as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::attempt::Score;
    use chrono::Duration;

    fn attempt(test_item_id: &str, percent: u32, submitted_offset_minutes: i64) -> AssessmentAttempt {
        let submitted = Utc::now() + Duration::minutes(submitted_offset_minutes);
        AssessmentAttempt {
            id: Uuid::new_v4().to_string(),
            student_id: "student-1".to_string(),
            course_id: "course-1".to_string(),
            test_item_id: test_item_id.to_string(),
            template_id: "tpl-1".to_string(),
            started_at: submitted - Duration::minutes(10),
            submitted_at: submitted,
            time_spent_seconds: 600,
            answers: vec![],
            score: Score {
                correct: percent,
                total: 100,
                percent,
            },
            topic_breakdown: BTreeMap::new(),
            recommendations_computed: vec![],
        }
    }

    #[test]
    fn latest_and_best_maps_diverge() {
        // 90% submitted earlier, 40% submitted later.
        let attempts = vec![attempt("item-1", 90, 0), attempt("item-1", 40, 5)];

        let latest = AssessmentAttemptService::reduce_latest(attempts.iter());
        assert_eq!(latest["item-1"].score.percent, 40);

        let best = AssessmentAttemptService::reduce_best(attempts.iter());
        assert_eq!(best["item-1"].score.percent, 90);
    }

    #[test]
    fn best_map_keeps_the_first_attempt_on_ties() {
        let first = attempt("item-1", 80, 0);
        let second = attempt("item-1", 80, 5);
        let attempts = vec![first.clone(), second];

        let best = AssessmentAttemptService::reduce_best(attempts.iter());
        assert_eq!(best["item-1"].id, first.id);
    }

    #[test]
    fn completion_stats_average_only_attempted_items() {
        let mut per_item = BTreeMap::new();
        per_item.insert("item-1".to_string(), attempt("item-1", 80, 0));
        per_item.insert("item-2".to_string(), attempt("item-2", 40, 0));

        let ids = vec![
            "item-1".to_string(),
            "item-2".to_string(),
            "item-3".to_string(),
        ];
        let (completed, average) =
            AssessmentAttemptService::completion_stats(&per_item, &ids);

        assert_eq!(completed, 2);
        assert_eq!(average, 60.0);
    }

    #[test]
    fn completion_stats_with_no_attempts_is_zero() {
        let per_item = BTreeMap::new();
        let ids = vec!["item-1".to_string()];
        let (completed, average) =
            AssessmentAttemptService::completion_stats(&per_item, &ids);
        assert_eq!(completed, 0);
        assert_eq!(average, 0.0);
    }

    #[test]
    fn clamp_seconds_floors_and_rejects_garbage() {
        assert_eq!(clamp_seconds(91.7), 91);
        assert_eq!(clamp_seconds(-3.0), 0);
        assert_eq!(clamp_seconds(f64::NAN), 0);
        assert_eq!(clamp_seconds(0.0), 0);
    }
}
