use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::domain::{
    attempt::{QuestionCheck, Score, TopicTally, UNASSIGNED_TOPIC},
    template::{AnswerSpec, FormatRules, Recommendation, TemplateSnapshot, ToleranceKind},
};

/// Plain decimal literal, after any comma-to-dot substitution. Scientific
/// notation and named constants deliberately classify as text.
static NUMERIC_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d+)?|\.\d+)$").expect("numeric literal pattern"));

#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationOutcome {
    pub checked: Vec<QuestionCheck>,
    pub score: Score,
    pub topic_breakdown: BTreeMap<String, TopicTally>,
    pub recommendations: Vec<Recommendation>,
}

/// Grades raw answers against a template's frozen content. Pure: no clock,
/// no store, no randomness.
pub struct AnswerEvaluator;

impl AnswerEvaluator {
    pub fn evaluate(
        content: &TemplateSnapshot,
        raw_answers: &BTreeMap<String, String>,
    ) -> EvaluationOutcome {
        let mut checked = Vec::with_capacity(content.questions.len());
        let mut topic_breakdown: BTreeMap<String, TopicTally> = BTreeMap::new();
        let mut recommendations: Vec<Recommendation> = Vec::new();
        let mut correct = 0u32;

        for question in &content.questions {
            let raw = raw_answers.get(&question.id).cloned().unwrap_or_default();
            let (normalized, is_correct) = Self::check_answer(&question.answer_spec, &raw);

            if is_correct {
                correct += 1;
            }

            let topic = question
                .topic_id
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| UNASSIGNED_TOPIC.to_string());
            let tally = topic_breakdown.entry(topic).or_default();
            tally.total += 1;
            if is_correct {
                tally.correct += 1;
            }

            if !is_correct {
                for rec in &question.feedback.recommendations {
                    if !recommendations.iter().any(|existing| existing.id == rec.id) {
                        recommendations.push(rec.clone());
                    }
                }
            }

            checked.push(QuestionCheck {
                question_id: question.id.clone(),
                raw,
                normalized,
                is_correct,
            });
        }

        EvaluationOutcome {
            score: Score::from_counts(correct, content.questions.len() as u32),
            checked,
            topic_breakdown,
            recommendations,
        }
    }

    /// Each expected candidate is classified on its own text: numeric
    /// literal means numeric comparison, anything else means text
    /// comparison. The answer is correct if any candidate matches.
    /// `normalized` reports the comparison form against the first candidate.
    fn check_answer(spec: &AnswerSpec, raw: &str) -> (String, bool) {
        let rules = spec.format_rules.clone().unwrap_or_default();
        let candidates = spec.expected.candidates();

        let mut normalized: Option<String> = None;
        let mut is_correct = false;

        for candidate in candidates {
            if let Some(expected) = Self::parse_number(candidate, &rules) {
                let actual = Self::parse_number(raw, &rules);
                if normalized.is_none() {
                    normalized = Some(
                        actual
                            .map(|a| a.to_string())
                            .unwrap_or_else(|| raw.trim().to_string()),
                    );
                }
                let matched = match actual {
                    Some(actual) => match &spec.tolerance {
                        Some(tolerance) => match tolerance.kind {
                            ToleranceKind::Abs => (actual - expected).abs() <= tolerance.value,
                        },
                        None => actual == expected,
                    },
                    None => false,
                };
                if matched {
                    is_correct = true;
                    break;
                }
            } else {
                let expected_text = Self::normalize_text(candidate, &rules);
                let actual_text = Self::normalize_text(raw, &rules);
                if normalized.is_none() {
                    normalized = Some(actual_text.clone());
                }
                if actual_text == expected_text {
                    is_correct = true;
                    break;
                }
            }
        }

        (
            normalized.unwrap_or_else(|| raw.trim().to_string()),
            is_correct,
        )
    }

    fn parse_number(value: &str, rules: &FormatRules) -> Option<f64> {
        let trimmed = value.trim();
        let candidate = if rules.allow_comma_decimal {
            trimmed.replace(',', ".")
        } else {
            trimmed.to_string()
        };

        if NUMERIC_LITERAL.is_match(&candidate) {
            candidate.parse::<f64>().ok()
        } else {
            None
        }
    }

    fn normalize_text(value: &str, rules: &FormatRules) -> String {
        let trimmed = value.trim();
        let collapsed = if rules.trim_spaces {
            trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
        } else {
            trimmed.to_string()
        };
        collapsed.to_lowercase()
    }
}
