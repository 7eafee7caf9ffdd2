use serde::Serialize;

use crate::models::domain::attempt::{AssessmentAttempt, QuestionCheck};
use crate::models::domain::course_content::{CourseContentItem, CourseMaterialBlock};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseContentResponse {
    pub blocks: Vec<CourseMaterialBlock>,
    pub items: Vec<CourseContentItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptResponse {
    pub attempt: AssessmentAttempt,
    pub checked: Vec<QuestionCheck>,
}

/// "How far has the student progressed": derived from latest attempts.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub completed_tests: u32,
    pub total_tests: u32,
    pub average_latest_percent: f64,
}

/// "How well has the student ever done": derived from best attempts.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeProgress {
    pub completed_tests: u32,
    pub total_tests: u32,
    pub average_best_percent: f64,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_serializes_with_camel_case_names() {
        let progress = CourseProgress {
            completed_tests: 2,
            total_tests: 5,
            average_latest_percent: 62.5,
        };

        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["completedTests"], 2);
        assert_eq!(json["totalTests"], 5);
        assert_eq!(json["averageLatestPercent"], 62.5);
    }
}
