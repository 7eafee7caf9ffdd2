use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::coerce;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestTemplate {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "coerce::non_negative_int")]
    pub duration_minutes: u32,
    #[serde(default, deserialize_with = "coerce::assessment_kind")]
    pub assessment_kind: AssessmentKind,
    pub created_by_teacher_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Authored topic-to-recommendation mapping, kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_map: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default, deserialize_with = "coerce::template_status")]
    pub status: TemplateStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentKind {
    #[default]
    Credit,
    Exam,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStatus {
    #[default]
    Draft,
    Published,
}

impl TestTemplate {
    pub fn new_draft(
        title: &str,
        description: &str,
        duration_minutes: u32,
        assessment_kind: AssessmentKind,
        created_by_teacher_id: &str,
        questions: Vec<Question>,
    ) -> Self {
        let now = Utc::now();
        TestTemplate {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: description.to_string(),
            duration_minutes,
            assessment_kind,
            created_by_teacher_id: created_by_teacher_id.to_string(),
            created_at: now,
            updated_at: now,
            questions,
            recommendation_map: None,
            status: TemplateStatus::Draft,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub prompt: QuestionPrompt,
    pub answer_spec: AnswerSpec,
    #[serde(default)]
    pub feedback: QuestionFeedback,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPrompt {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSpec {
    /// Declared authoring intent. Grading re-detects the type from each
    /// expected value, so a stale declaration cannot misgrade an answer.
    #[serde(rename = "type", default)]
    pub answer_type: AnswerType,
    pub expected: ExpectedAnswer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<Tolerance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_rules: Option<FormatRules>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnswerType {
    #[default]
    Text,
    Number,
}

/// A single expected value or a list of accepted alternatives.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ExpectedAnswer {
    One(String),
    Many(Vec<String>),
}

impl ExpectedAnswer {
    pub fn candidates(&self) -> &[String] {
        match self {
            ExpectedAnswer::One(value) => std::slice::from_ref(value),
            ExpectedAnswer::Many(values) => values,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tolerance {
    #[serde(default)]
    pub kind: ToleranceKind,
    #[serde(default, deserialize_with = "coerce::lenient_f64")]
    pub value: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToleranceKind {
    #[default]
    Abs,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FormatRules {
    #[serde(default)]
    pub trim_spaces: bool,
    #[serde(default)]
    pub allow_comma_decimal: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct QuestionFeedback {
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<Recommendation>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Frozen copy of a template's gradeable content. Once embedded in a course
/// item it never changes, whatever happens to the source template.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSnapshot {
    pub template_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "coerce::non_negative_int")]
    pub duration_minutes: u32,
    #[serde(default, deserialize_with = "coerce::assessment_kind")]
    pub assessment_kind: AssessmentKind,
    #[serde(default)]
    pub questions: Vec<Question>,
    pub captured_at: DateTime<Utc>,
}

impl TemplateSnapshot {
    pub fn from_template(template: &TestTemplate) -> Self {
        TemplateSnapshot {
            template_id: template.id.clone(),
            title: template.title.clone(),
            description: template.description.clone(),
            duration_minutes: template.duration_minutes,
            assessment_kind: template.assessment_kind,
            questions: template.questions.clone(),
            captured_at: Utc::now(),
        }
    }
}
