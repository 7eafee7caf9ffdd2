use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::models::domain::template::{
    AnswerSpec, AssessmentKind, Attachment, QuestionFeedback,
};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveTemplateRequest {
    /// Absent on create; set to update an existing template.
    pub id: Option<String>,

    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub duration_minutes: u32,

    #[serde(default)]
    pub assessment_kind: AssessmentKind,

    #[validate(nested)]
    #[serde(default)]
    pub questions: Vec<QuestionInput>,

    #[serde(default)]
    pub recommendation_map: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    /// Absent for new questions; a fresh id is assigned on save.
    pub id: Option<String>,

    #[validate(length(min = 1))]
    pub prompt_text: String,

    #[serde(default)]
    pub attachments: Vec<Attachment>,

    pub answer_spec: AnswerSpec,

    #[serde(default)]
    pub feedback: QuestionFeedback,

    #[serde(default)]
    pub topic_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptRequest {
    #[validate(length(min = 1))]
    pub student_id: String,

    #[validate(length(min = 1))]
    pub course_id: String,

    #[validate(length(min = 1))]
    pub test_item_id: String,

    /// Raw answers keyed by question id, exactly as typed.
    #[serde(default)]
    pub answers: BTreeMap<String, String>,

    pub started_at: Option<DateTime<Utc>>,

    /// Clamped to a non-negative whole number of seconds on submit.
    #[serde(default)]
    pub time_spent_seconds: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveSessionRequest {
    #[validate(length(min = 1))]
    pub student_id: String,

    #[validate(length(min = 1))]
    pub course_id: String,

    #[validate(length(min = 1))]
    pub test_item_id: String,

    #[validate(length(min = 1))]
    pub template_id: String,

    #[serde(default)]
    pub remaining_seconds: f64,

    #[serde(default)]
    pub current_question_index: u32,

    #[serde(default)]
    pub answers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddTestItemRequest {
    #[validate(length(min = 1))]
    pub template_id: String,

    /// Defaults to the course's first block.
    pub block_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveItemRequest {
    /// 1-based position within the course queue.
    pub new_position: u32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlockRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlockRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveBlockRequest {
    /// 1-based position within the course's block list.
    pub new_position: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    /// The course's test item ids progress is computed over.
    #[serde(default)]
    pub test_item_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_template_request_rejects_blank_title() {
        let request = SaveTemplateRequest {
            id: None,
            title: "".to_string(),
            description: "".to_string(),
            duration_minutes: 30,
            assessment_kind: AssessmentKind::Credit,
            questions: vec![],
            recommendation_map: None,
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn question_input_requires_prompt_text() {
        let raw = serde_json::json!({
            "promptText": "",
            "answerSpec": { "type": "text", "expected": "Paris" }
        });
        let input: QuestionInput = serde_json::from_value(raw).unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn submit_attempt_request_parses_camel_case() {
        let raw = serde_json::json!({
            "studentId": "s-1",
            "courseId": "c-1",
            "testItemId": "i-1",
            "answers": { "q-1": "12.9" },
            "timeSpentSeconds": 91.7
        });
        let request: SubmitAttemptRequest = serde_json::from_value(raw).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.answers.get("q-1").map(String::as_str), Some("12.9"));
    }
}
