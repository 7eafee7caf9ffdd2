//! Lenient decoding helpers for persisted numeric and enum fields.
//!
//! Corrupt values in the stored document degrade to safe defaults on read
//! instead of failing the whole aggregate decode.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::template::{AssessmentKind, TemplateStatus};

/// Clamps any persisted value to a non-negative integer (floored).
pub fn non_negative_int<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(clamp_non_negative(&value))
}

pub(crate) fn clamp_non_negative(value: &Value) -> u32 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(f) if f.is_finite() && f > 0.0 => f.floor() as u32,
        _ => 0,
    }
}

/// Reads a float, tolerating strings and garbage (defaults to 0.0).
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|f| f.is_finite()).unwrap_or(0.0))
}

/// Unknown assessment kinds coerce to the default (`credit`).
pub fn assessment_kind<'de, D>(deserializer: D) -> Result<AssessmentKind, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value.as_str() {
        Some("exam") => AssessmentKind::Exam,
        _ => AssessmentKind::Credit,
    })
}

/// Unknown template statuses coerce to `draft`.
pub fn template_status<'de, D>(deserializer: D) -> Result<TemplateStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value.as_str() {
        Some("published") => TemplateStatus::Published,
        _ => TemplateStatus::Draft,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clamp_non_negative_floors_and_clamps() {
        assert_eq!(clamp_non_negative(&json!(45)), 45);
        assert_eq!(clamp_non_negative(&json!(3.7)), 3);
        assert_eq!(clamp_non_negative(&json!(-5)), 0);
        assert_eq!(clamp_non_negative(&json!("12")), 12);
        assert_eq!(clamp_non_negative(&json!("garbage")), 0);
        assert_eq!(clamp_non_negative(&json!(null)), 0);
        assert_eq!(clamp_non_negative(&json!([1, 2])), 0);
    }

    #[test]
    fn enum_coercion_falls_back_to_defaults() {
        #[derive(serde::Deserialize)]
        struct Probe {
            #[serde(deserialize_with = "assessment_kind")]
            kind: AssessmentKind,
            #[serde(deserialize_with = "template_status")]
            status: TemplateStatus,
        }

        let probe: Probe =
            serde_json::from_value(json!({ "kind": "midterm", "status": 7 })).unwrap();
        assert_eq!(probe.kind, AssessmentKind::Credit);
        assert_eq!(probe.status, TemplateStatus::Draft);

        let probe: Probe =
            serde_json::from_value(json!({ "kind": "exam", "status": "published" })).unwrap();
        assert_eq!(probe.kind, AssessmentKind::Exam);
        assert_eq!(probe.status, TemplateStatus::Published);
    }
}
