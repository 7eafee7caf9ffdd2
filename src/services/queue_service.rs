use std::collections::HashSet;
use std::sync::Arc;

use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{
            course_content::{ContentPayload, CourseContentItem, CourseMaterialBlock},
            state::AssessmentsState,
        },
        dto::{
            request::{
                AddTestItemRequest, CreateBlockRequest, MoveBlockRequest, MoveItemRequest,
                UpdateBlockRequest,
            },
            response::CourseContentResponse,
        },
    },
    providers::{CourseLesson, LessonProvider},
    repositories::AssessmentStateRepository,
    services::snapshot_service::TemplateSnapshotService,
};

/// Keeps each course's content queue and block list consistent: contiguous
/// 1-based ordering, valid block references, and lesson items in sync with
/// the canonical lesson list. Fetches self-heal the stored state.
pub struct ContentQueueService {
    state_repository: Arc<dyn AssessmentStateRepository>,
    lessons: Arc<dyn LessonProvider>,
}

impl ContentQueueService {
    pub fn new(
        state_repository: Arc<dyn AssessmentStateRepository>,
        lessons: Arc<dyn LessonProvider>,
    ) -> Self {
        Self {
            state_repository,
            lessons,
        }
    }

    /// Drops invalid blocks, sorts by order, synthesizes a default block for
    /// a course with none, and re-stamps order as 1..M.
    pub fn normalize_blocks(
        course_id: &str,
        blocks: &[CourseMaterialBlock],
    ) -> Vec<CourseMaterialBlock> {
        let mut valid: Vec<CourseMaterialBlock> = blocks
            .iter()
            .filter(|b| !b.id.trim().is_empty() && !b.title.trim().is_empty())
            .cloned()
            .collect();
        valid.sort_by_key(|b| b.order);

        if valid.is_empty() {
            valid.push(CourseMaterialBlock::default_for_course(course_id));
        }

        for (index, block) in valid.iter_mut().enumerate() {
            block.order = index as u32 + 1;
        }
        valid
    }

    /// Sorts by order, re-stamps 1..N, and reassigns items pointing at an
    /// unknown block to the first block.
    pub fn normalize_queue(
        items: &[CourseContentItem],
        blocks: &[CourseMaterialBlock],
    ) -> Vec<CourseContentItem> {
        let known: HashSet<&str> = blocks.iter().map(|b| b.id.as_str()).collect();

        let mut sorted = items.to_vec();
        sorted.sort_by_key(|item| item.order);

        for (index, item) in sorted.iter_mut().enumerate() {
            item.order = index as u32 + 1;
            if !known.contains(item.block_id.as_str()) {
                if let Some(first) = blocks.first() {
                    item.block_id = first.id.clone();
                }
            }
        }
        sorted
    }

    pub fn normalize_queue_with_blocks(
        course_id: &str,
        items: &[CourseContentItem],
        blocks: &[CourseMaterialBlock],
    ) -> (Vec<CourseMaterialBlock>, Vec<CourseContentItem>) {
        let blocks = Self::normalize_blocks(course_id, blocks);
        let items = Self::normalize_queue(items, &blocks);
        (blocks, items)
    }

    /// Diffs the queue's lesson items against the canonical lesson list:
    /// items whose lesson is gone are dropped, lessons without an item get
    /// one appended (in lesson order, into the default block). Test items
    /// are untouched.
    pub fn sync_lessons(
        course_id: &str,
        items: Vec<CourseContentItem>,
        lessons: &[CourseLesson],
        default_block_id: &str,
    ) -> Vec<CourseContentItem> {
        let live_ids: HashSet<&str> = lessons.iter().map(|l| l.id.as_str()).collect();

        let mut result: Vec<CourseContentItem> = items
            .into_iter()
            .filter(|item| match item.lesson_id() {
                Some(lesson_id) => live_ids.contains(lesson_id),
                None => true,
            })
            .collect();

        let present: HashSet<String> = result
            .iter()
            .filter_map(|item| item.lesson_id().map(str::to_string))
            .collect();

        let mut ordered = lessons.to_vec();
        ordered.sort_by_key(|l| l.order);

        let mut next_order = result.iter().map(|i| i.order).max().unwrap_or(0);
        for lesson in ordered {
            if present.contains(&lesson.id) {
                continue;
            }
            next_order += 1;
            let mut item = CourseContentItem::new_lesson(course_id, default_block_id, &lesson.id);
            item.order = next_order;
            result.push(item);
        }
        result
    }

    /// Serves a course's content. Runs lesson sync and normalization on
    /// every fetch; persists the corrected state only when it structurally
    /// differs from what was stored. Test items missing a snapshot are
    /// served with content filled from the live template, but that fill is
    /// never persisted: freezing happens only on template edit or delete.
    pub async fn get_course_content(&self, course_id: &str) -> AppResult<CourseContentResponse> {
        let mut state = self.state_repository.read_state().await?;
        let lessons = self.lessons.lessons_for_course(course_id).await?;

        let stored_items = state
            .course_content
            .get(course_id)
            .cloned()
            .unwrap_or_default();
        let stored_blocks = state
            .course_blocks
            .get(course_id)
            .cloned()
            .unwrap_or_default();

        let blocks = Self::normalize_blocks(course_id, &stored_blocks);
        let synced = Self::sync_lessons(course_id, stored_items.clone(), &lessons, &blocks[0].id);
        let items = Self::normalize_queue(&synced, &blocks);

        if blocks != stored_blocks || items != stored_items {
            log::warn!("self-healing content queue for course '{}'", course_id);
            state
                .course_content
                .insert(course_id.to_string(), items.clone());
            state
                .course_blocks
                .insert(course_id.to_string(), blocks.clone());
            self.state_repository
                .write_state(&state, "self-heal course content")
                .await?;
        }

        let items = items
            .into_iter()
            .map(|item| Self::fill_snapshot_for_serving(item, &state))
            .collect();

        Ok(CourseContentResponse { blocks, items })
    }

    fn fill_snapshot_for_serving(
        mut item: CourseContentItem,
        state: &AssessmentsState,
    ) -> CourseContentItem {
        if let ContentPayload::Test {
            template_id,
            template_snapshot,
            ..
        } = &mut item.payload
        {
            if template_snapshot.is_none() {
                if let Some(template) = state.template_by_id(template_id) {
                    *template_snapshot =
                        Some(Box::new(TemplateSnapshotService::capture(template)));
                }
            }
        }
        item
    }

    pub async fn add_test_item(
        &self,
        course_id: &str,
        request: AddTestItemRequest,
    ) -> AppResult<CourseContentItem> {
        request.validate()?;
        let mut state = self.state_repository.read_state().await?;

        let template = state
            .template_by_id(&request.template_id)
            .filter(|t| !t.is_deleted())
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Test template with id '{}' not found",
                    request.template_id
                ))
            })?
            .clone();

        let stored_blocks = state
            .course_blocks
            .get(course_id)
            .cloned()
            .unwrap_or_default();
        let blocks = Self::normalize_blocks(course_id, &stored_blocks);

        let block_id = match &request.block_id {
            Some(block_id) => blocks
                .iter()
                .find(|b| &b.id == block_id)
                .map(|b| b.id.clone())
                .ok_or_else(|| {
                    AppError::NotFound(format!("Block with id '{}' not found", block_id))
                })?,
            None => blocks[0].id.clone(),
        };

        let mut items = state
            .course_content
            .get(course_id)
            .cloned()
            .unwrap_or_default();
        let mut item =
            CourseContentItem::new_test(course_id, &block_id, &template.id, &template.title);
        item.order = items.iter().map(|i| i.order).max().unwrap_or(0) + 1;
        items.push(item.clone());

        let items = Self::normalize_queue(&items, &blocks);
        let created = items
            .iter()
            .find(|i| i.id == item.id)
            .cloned()
            .unwrap_or(item);

        state.course_content.insert(course_id.to_string(), items);
        state.course_blocks.insert(course_id.to_string(), blocks);
        self.state_repository
            .write_state(&state, "add test item")
            .await?;
        Ok(created)
    }

    pub async fn remove_item(&self, course_id: &str, item_id: &str) -> AppResult<()> {
        let mut state = self.state_repository.read_state().await?;

        let items = state
            .course_content
            .get(course_id)
            .cloned()
            .unwrap_or_default();
        if !items.iter().any(|i| i.id == item_id) {
            return Err(AppError::NotFound(format!(
                "Content item '{}' not found in course '{}'",
                item_id, course_id
            )));
        }

        let remaining: Vec<CourseContentItem> =
            items.into_iter().filter(|i| i.id != item_id).collect();
        let (blocks, remaining) = Self::normalize_queue_with_blocks(
            course_id,
            &remaining,
            &state.course_blocks.get(course_id).cloned().unwrap_or_default(),
        );

        state.course_content.insert(course_id.to_string(), remaining);
        state.course_blocks.insert(course_id.to_string(), blocks);
        self.state_repository
            .write_state(&state, "remove content item")
            .await
    }

    /// Splice-and-renumber. `new_position` is 1-based and clamps to the
    /// queue bounds.
    pub async fn move_item(
        &self,
        course_id: &str,
        item_id: &str,
        request: MoveItemRequest,
    ) -> AppResult<Vec<CourseContentItem>> {
        let mut state = self.state_repository.read_state().await?;

        let (blocks, mut items) = Self::normalize_queue_with_blocks(
            course_id,
            &state
                .course_content
                .get(course_id)
                .cloned()
                .unwrap_or_default(),
            &state.course_blocks.get(course_id).cloned().unwrap_or_default(),
        );

        let from = items.iter().position(|i| i.id == item_id).ok_or_else(|| {
            AppError::NotFound(format!(
                "Content item '{}' not found in course '{}'",
                item_id, course_id
            ))
        })?;

        let item = items.remove(from);
        let to = (request.new_position.max(1) as usize - 1).min(items.len());
        items.insert(to, item);
        for (index, item) in items.iter_mut().enumerate() {
            item.order = index as u32 + 1;
        }

        state
            .course_content
            .insert(course_id.to_string(), items.clone());
        state.course_blocks.insert(course_id.to_string(), blocks);
        self.state_repository
            .write_state(&state, "move content item")
            .await?;
        Ok(items)
    }

    pub async fn create_block(
        &self,
        course_id: &str,
        request: CreateBlockRequest,
    ) -> AppResult<CourseMaterialBlock> {
        request.validate()?;
        let mut state = self.state_repository.read_state().await?;

        let mut blocks = Self::normalize_blocks(
            course_id,
            &state.course_blocks.get(course_id).cloned().unwrap_or_default(),
        );
        let mut block = CourseMaterialBlock::new(course_id, &request.title, &request.description);
        block.order = blocks.len() as u32 + 1;
        blocks.push(block.clone());

        state.course_blocks.insert(course_id.to_string(), blocks);
        self.state_repository
            .write_state(&state, "create block")
            .await?;
        Ok(block)
    }

    pub async fn update_block(
        &self,
        course_id: &str,
        block_id: &str,
        request: UpdateBlockRequest,
    ) -> AppResult<CourseMaterialBlock> {
        request.validate()?;
        let mut state = self.state_repository.read_state().await?;

        let mut blocks = Self::normalize_blocks(
            course_id,
            &state.course_blocks.get(course_id).cloned().unwrap_or_default(),
        );
        let block = blocks
            .iter_mut()
            .find(|b| b.id == block_id)
            .ok_or_else(|| AppError::NotFound(format!("Block with id '{}' not found", block_id)))?;

        block.title = request.title;
        block.description = request.description;
        let updated = block.clone();

        state.course_blocks.insert(course_id.to_string(), blocks);
        self.state_repository
            .write_state(&state, "update block")
            .await?;
        Ok(updated)
    }

    /// Removing a block moves its items to the first remaining block. A
    /// course never ends up without a block: the default is re-synthesized.
    pub async fn delete_block(&self, course_id: &str, block_id: &str) -> AppResult<()> {
        let mut state = self.state_repository.read_state().await?;

        let blocks = Self::normalize_blocks(
            course_id,
            &state.course_blocks.get(course_id).cloned().unwrap_or_default(),
        );
        if !blocks.iter().any(|b| b.id == block_id) {
            return Err(AppError::NotFound(format!(
                "Block with id '{}' not found",
                block_id
            )));
        }

        let remaining: Vec<CourseMaterialBlock> =
            blocks.into_iter().filter(|b| b.id != block_id).collect();
        // Orphaned items are reassigned to the first block by queue
        // normalization against the reduced block list.
        let (blocks, items) = Self::normalize_queue_with_blocks(
            course_id,
            &state
                .course_content
                .get(course_id)
                .cloned()
                .unwrap_or_default(),
            &remaining,
        );

        state.course_content.insert(course_id.to_string(), items);
        state.course_blocks.insert(course_id.to_string(), blocks);
        self.state_repository
            .write_state(&state, "delete block")
            .await
    }

    pub async fn move_block(
        &self,
        course_id: &str,
        block_id: &str,
        request: MoveBlockRequest,
    ) -> AppResult<Vec<CourseMaterialBlock>> {
        let mut state = self.state_repository.read_state().await?;

        let mut blocks = Self::normalize_blocks(
            course_id,
            &state.course_blocks.get(course_id).cloned().unwrap_or_default(),
        );
        let from = blocks.iter().position(|b| b.id == block_id).ok_or_else(|| {
            AppError::NotFound(format!("Block with id '{}' not found", block_id))
        })?;

        let block = blocks.remove(from);
        let to = (request.new_position.max(1) as usize - 1).min(blocks.len());
        blocks.insert(to, block);
        for (index, block) in blocks.iter_mut().enumerate() {
            block.order = index as u32 + 1;
        }

        state
            .course_blocks
            .insert(course_id.to_string(), blocks.clone());
        self.state_repository
            .write_state(&state, "move block")
            .await?;
        Ok(blocks)
    }

    /// Deletes a course's queue, blocks, and attempts in one pass. This is
    /// the only operation that ever removes attempts.
    pub async fn delete_course_content(&self, course_id: &str) -> AppResult<()> {
        let mut state = self.state_repository.read_state().await?;

        state.course_content.remove(course_id);
        state.course_blocks.remove(course_id);
        state.attempts.retain(|attempt| attempt.course_id != course_id);

        self.state_repository
            .write_state(&state, "delete course content")
            .await
    }
}
