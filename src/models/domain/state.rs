use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::domain::attempt::AssessmentAttempt;
use crate::models::domain::course_content::{CourseContentItem, CourseMaterialBlock};
use crate::models::domain::template::TestTemplate;

/// The aggregate root persisted as one document. Every engine operation
/// reads it whole, mutates in memory, and writes it whole.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AssessmentsState {
    pub templates: Vec<TestTemplate>,
    pub course_content: BTreeMap<String, Vec<CourseContentItem>>,
    pub course_blocks: BTreeMap<String, Vec<CourseMaterialBlock>>,
    pub attempts: Vec<AssessmentAttempt>,
}

impl AssessmentsState {
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
            && self.course_content.values().all(|items| items.is_empty())
            && self.course_blocks.values().all(|blocks| blocks.is_empty())
            && self.attempts.is_empty()
    }

    pub fn template_by_id(&self, id: &str) -> Option<&TestTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn template_by_id_mut(&mut self, id: &str) -> Option<&mut TestTemplate> {
        self.templates.iter_mut().find(|t| t.id == id)
    }

    /// Course ids whose queue references the given template.
    pub fn courses_referencing_template(&self, template_id: &str) -> Vec<String> {
        self.course_content
            .iter()
            .filter(|(_, items)| {
                items
                    .iter()
                    .any(|item| item.template_id() == Some(template_id))
            })
            .map(|(course_id, _)| course_id.clone())
            .collect()
    }
}
