use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::coerce;
use crate::models::domain::template::Recommendation;

/// A graded submission. Attempts are append-only: once written they are
/// never mutated, and only removed in bulk when their course is deleted.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentAttempt {
    pub id: String,
    pub student_id: String,
    pub course_id: String,
    pub test_item_id: String,
    pub template_id: String,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "coerce::non_negative_int")]
    pub time_spent_seconds: u32,
    #[serde(default)]
    pub answers: Vec<QuestionCheck>,
    pub score: Score,
    #[serde(default)]
    pub topic_breakdown: BTreeMap<String, TopicTally>,
    #[serde(default)]
    pub recommendations_computed: Vec<Recommendation>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionCheck {
    pub question_id: String,
    /// The answer exactly as the student typed it.
    pub raw: String,
    /// The form the answer was compared in.
    pub normalized: String,
    pub is_correct: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    #[serde(default, deserialize_with = "coerce::non_negative_int")]
    pub correct: u32,
    #[serde(default, deserialize_with = "coerce::non_negative_int")]
    pub total: u32,
    #[serde(default, deserialize_with = "coerce::non_negative_int")]
    pub percent: u32,
}

impl Score {
    pub fn from_counts(correct: u32, total: u32) -> Self {
        let percent = if total == 0 {
            0
        } else {
            ((100.0 * correct as f64) / total as f64).round() as u32
        };
        Score {
            correct,
            total,
            percent,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TopicTally {
    #[serde(default, deserialize_with = "coerce::non_negative_int")]
    pub correct: u32,
    #[serde(default, deserialize_with = "coerce::non_negative_int")]
    pub total: u32,
}

/// Bucket for questions that carry no topic id.
pub const UNASSIGNED_TOPIC: &str = "unassigned";
