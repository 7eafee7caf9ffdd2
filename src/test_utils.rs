use crate::models::domain::template::{
    AnswerSpec, AnswerType, AssessmentKind, ExpectedAnswer, Question, QuestionFeedback,
    QuestionPrompt, TestTemplate, Tolerance, ToleranceKind,
};

#[cfg(test)]
pub mod fixtures {
    use super::*;

    /// A draft template with one numeric and one text question.
    pub fn test_template(teacher_id: &str) -> TestTemplate {
        TestTemplate::new_draft(
            "Fractions and capitals",
            "Mixed warm-up",
            30,
            AssessmentKind::Credit,
            teacher_id,
            vec![
                numeric_question("q-num", "12.5", Some(0.5)),
                text_question("q-text", "Paris"),
            ],
        )
    }

    pub fn numeric_question(id: &str, expected: &str, tolerance: Option<f64>) -> Question {
        Question {
            id: id.to_string(),
            prompt: QuestionPrompt {
                text: format!("Numeric question {}", id),
                attachments: vec![],
            },
            answer_spec: AnswerSpec {
                answer_type: AnswerType::Number,
                expected: ExpectedAnswer::One(expected.to_string()),
                tolerance: tolerance.map(|value| Tolerance {
                    kind: ToleranceKind::Abs,
                    value,
                }),
                format_rules: None,
            },
            feedback: QuestionFeedback::default(),
            topic_id: None,
        }
    }

    pub fn text_question(id: &str, expected: &str) -> Question {
        Question {
            id: id.to_string(),
            prompt: QuestionPrompt {
                text: format!("Text question {}", id),
                attachments: vec![],
            },
            answer_spec: AnswerSpec {
                answer_type: AnswerType::Text,
                expected: ExpectedAnswer::One(expected.to_string()),
                tolerance: None,
                format_rules: None,
            },
            feedback: QuestionFeedback::default(),
            topic_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixture_template_has_two_questions() {
        let template = test_template("teacher-1");
        assert_eq!(template.questions.len(), 2);
        assert_eq!(template.created_by_teacher_id, "teacher-1");
    }

    #[test]
    fn test_fixture_question_ids_are_as_requested() {
        let question = numeric_question("q-7", "4", None);
        assert_eq!(question.id, "q-7");
    }
}
