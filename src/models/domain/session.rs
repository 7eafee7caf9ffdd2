use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::coerce;

/// Sessions older than this (measured from `updated_at`) are treated as
/// absent on read and pruned on write.
pub const SESSION_TTL_DAYS: i64 = 14;

/// In-progress test state for one student on one course placement. There is
/// no completed state: submission records an attempt and deletes the session.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentSession {
    pub student_id: String,
    pub course_id: String,
    pub test_item_id: String,
    pub template_id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "coerce::non_negative_int")]
    pub remaining_seconds: u32,
    #[serde(default, deserialize_with = "coerce::non_negative_int")]
    pub current_question_index: u32,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    pub updated_at: DateTime<Utc>,
}

pub type SessionMap = BTreeMap<String, AssessmentSession>;

impl AssessmentSession {
    pub fn key_for(student_id: &str, course_id: &str, test_item_id: &str) -> String {
        format!("{}:{}:{}", student_id, course_id, test_item_id)
    }

    pub fn key(&self) -> String {
        Self::key_for(&self.student_id, &self.course_id, &self.test_item_id)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.updated_at > Duration::days(SESSION_TTL_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_updated_days_ago(days: i64) -> AssessmentSession {
        let now = Utc::now();
        AssessmentSession {
            student_id: "student-1".to_string(),
            course_id: "course-1".to_string(),
            test_item_id: "test-item-1".to_string(),
            template_id: "tpl-1".to_string(),
            started_at: now - Duration::days(days),
            remaining_seconds: 1200,
            current_question_index: 3,
            answers: BTreeMap::new(),
            updated_at: now - Duration::days(days),
        }
    }

    #[test]
    fn session_key_is_composite_of_its_parts() {
        let session = session_updated_days_ago(0);
        assert_eq!(session.key(), "student-1:course-1:test-item-1");
        assert_eq!(
            AssessmentSession::key_for("s", "c", "i"),
            "s:c:i".to_string()
        );
    }

    #[test]
    fn session_expiry_straddles_the_fourteen_day_boundary() {
        let now = Utc::now();
        assert!(session_updated_days_ago(15).is_expired(now));
        assert!(!session_updated_days_ago(13).is_expired(now));
    }

    #[test]
    fn corrupt_counters_clamp_on_read() {
        let raw = serde_json::json!({
            "studentId": "s-1",
            "courseId": "c-1",
            "testItemId": "i-1",
            "templateId": "t-1",
            "startedAt": "2026-03-01T10:00:00Z",
            "remainingSeconds": -30,
            "currentQuestionIndex": 2.9,
            "updatedAt": "2026-03-01T10:05:00Z"
        });

        let parsed: AssessmentSession = serde_json::from_value(raw).expect("should coerce");
        assert_eq!(parsed.remaining_seconds, 0);
        assert_eq!(parsed.current_question_index, 2);
    }
}
