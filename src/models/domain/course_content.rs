use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::coerce;
use crate::models::domain::template::TemplateSnapshot;

/// One entry in a course's ordered content queue. `order` is 1-based and
/// contiguous per course; the normalizer re-stamps it on every fetch.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseContentItem {
    pub id: String,
    pub course_id: String,
    pub block_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "coerce::non_negative_int")]
    pub order: u32,
    #[serde(flatten)]
    pub payload: ContentPayload,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ContentPayload {
    #[serde(rename_all = "camelCase")]
    Lesson { lesson_id: String },
    #[serde(rename_all = "camelCase")]
    Test {
        template_id: String,
        title_snapshot: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        template_snapshot: Option<Box<TemplateSnapshot>>,
    },
}

impl CourseContentItem {
    /// Lesson items carry a construction id so the queue can be diffed
    /// against the canonical lesson list without extra bookkeeping.
    pub fn lesson_item_id(lesson_id: &str) -> String {
        format!("lesson-item-{}", lesson_id)
    }

    pub fn new_lesson(course_id: &str, block_id: &str, lesson_id: &str) -> Self {
        CourseContentItem {
            id: Self::lesson_item_id(lesson_id),
            course_id: course_id.to_string(),
            block_id: block_id.to_string(),
            created_at: Utc::now(),
            order: 0,
            payload: ContentPayload::Lesson {
                lesson_id: lesson_id.to_string(),
            },
        }
    }

    pub fn new_test(course_id: &str, block_id: &str, template_id: &str, title: &str) -> Self {
        CourseContentItem {
            id: format!("test-item-{}", Uuid::new_v4()),
            course_id: course_id.to_string(),
            block_id: block_id.to_string(),
            created_at: Utc::now(),
            order: 0,
            payload: ContentPayload::Test {
                template_id: template_id.to_string(),
                title_snapshot: title.to_string(),
                template_snapshot: None,
            },
        }
    }

    pub fn is_lesson(&self) -> bool {
        matches!(self.payload, ContentPayload::Lesson { .. })
    }

    pub fn lesson_id(&self) -> Option<&str> {
        match &self.payload {
            ContentPayload::Lesson { lesson_id } => Some(lesson_id),
            ContentPayload::Test { .. } => None,
        }
    }

    pub fn template_id(&self) -> Option<&str> {
        match &self.payload {
            ContentPayload::Lesson { .. } => None,
            ContentPayload::Test { template_id, .. } => Some(template_id),
        }
    }

    pub fn template_snapshot(&self) -> Option<&TemplateSnapshot> {
        match &self.payload {
            ContentPayload::Lesson { .. } => None,
            ContentPayload::Test {
                template_snapshot, ..
            } => template_snapshot.as_deref(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseMaterialBlock {
    pub id: String,
    pub course_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "coerce::non_negative_int")]
    pub order: u32,
}

impl CourseMaterialBlock {
    pub fn new(course_id: &str, title: &str, description: &str) -> Self {
        CourseMaterialBlock {
            id: format!("block-{}", Uuid::new_v4()),
            course_id: course_id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            order: 0,
        }
    }

    /// Synthesized when a course has no valid blocks at all.
    pub fn default_for_course(course_id: &str) -> Self {
        CourseMaterialBlock {
            id: format!("block-{}-default", course_id),
            course_id: course_id.to_string(),
            title: "Course materials".to_string(),
            description: String::new(),
            order: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_item_serializes_with_kind_tag() {
        let lesson = CourseContentItem::new_lesson("course-1", "block-1", "lesson-9");
        let json = serde_json::to_value(&lesson).unwrap();
        assert_eq!(json["kind"], "lesson");
        assert_eq!(json["lessonId"], "lesson-9");
        assert_eq!(json["id"], "lesson-item-lesson-9");

        let test = CourseContentItem::new_test("course-1", "block-1", "tpl-1", "Midterm");
        let json = serde_json::to_value(&test).unwrap();
        assert_eq!(json["kind"], "test");
        assert_eq!(json["templateId"], "tpl-1");
        assert_eq!(json["titleSnapshot"], "Midterm");
        assert!(json.get("templateSnapshot").is_none());
    }

    #[test]
    fn content_item_deserializes_both_variants() {
        let raw = json!({
            "id": "lesson-item-l1",
            "courseId": "course-1",
            "blockId": "block-1",
            "createdAt": "2026-02-01T08:00:00Z",
            "order": 2,
            "kind": "lesson",
            "lessonId": "l1"
        });
        let item: CourseContentItem = serde_json::from_value(raw).unwrap();
        assert!(item.is_lesson());
        assert_eq!(item.lesson_id(), Some("l1"));

        let raw = json!({
            "id": "test-item-abc",
            "courseId": "course-1",
            "blockId": "block-1",
            "createdAt": "2026-02-01T08:00:00Z",
            "order": "3",
            "kind": "test",
            "templateId": "tpl-7",
            "titleSnapshot": "Final"
        });
        let item: CourseContentItem = serde_json::from_value(raw).unwrap();
        assert_eq!(item.template_id(), Some("tpl-7"));
        assert_eq!(item.order, 3);
        assert!(item.template_snapshot().is_none());
    }

    #[test]
    fn default_block_is_stamped_for_the_course() {
        let block = CourseMaterialBlock::default_for_course("course-42");
        assert_eq!(block.id, "block-course-42-default");
        assert_eq!(block.course_id, "course-42");
        assert_eq!(block.order, 1);
        assert!(!block.title.trim().is_empty());
    }
}
