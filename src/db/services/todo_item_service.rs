//! Store operations on todo items.
//!
//! Mutations follow validate, load, concurrency check, apply, persist. The
//! tag comparison and the write are separate statements; two writers racing
//! inside that window both succeed and the last write wins.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QuerySelect, Set,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::entities::{prelude::TodoItem, todo_item};
use crate::db::models::{TodoDraft, TodoPatchDocument};
use crate::db::query::TodoQuery;
use crate::services::validation::{self, ValidationErrors};
use crate::services::{etag, label_codec};

#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Todo item not found: {0}")]
    NotFound(Uuid),
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("Precondition failed for todo item {0}")]
    PreconditionFailed(Uuid),
}

#[derive(Debug)]
pub struct TodoPage {
    pub items: Vec<todo_item::Model>,
    /// Matching rows before paging.
    pub total: u64,
}

pub struct TodoItemService;

impl TodoItemService {
    pub async fn list(db: &DatabaseConnection, query: &TodoQuery) -> Result<TodoPage, TodoError> {
        let select = query.select();
        let total = select.clone().count(db).await?;
        let items = select
            .offset(query.offset())
            .limit(query.page_size)
            .all(db)
            .await?;
        debug!(total, returned = items.len(), page = query.page, "Listed todo items.");
        Ok(TodoPage { items, total })
    }

    /// Soft-deleted items are reported as not found.
    pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<todo_item::Model, TodoError> {
        TodoItem::find_by_id(id)
            .filter(todo_item::Column::IsDeleted.eq(false))
            .one(db)
            .await?
            .ok_or(TodoError::NotFound(id))
    }

    pub async fn create(
        db: &DatabaseConnection,
        draft: TodoDraft,
        now: DateTime<Utc>,
    ) -> Result<todo_item::Model, TodoError> {
        validation::validate(&draft, now)
            .into_result()
            .map_err(TodoError::Validation)?;

        let mut new_item = todo_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_at: Set(etag::truncate(now)),
            updated_at: Set(None),
            is_deleted: Set(false),
            deleted_at: Set(None),
            ..Default::default()
        };
        apply_draft(&mut new_item, draft);

        let item = new_item.insert(db).await?;
        info!(item_id = %item.id, "Todo item created.");
        Ok(item)
    }

    /// Full replacement of the mutable fields.
    pub async fn replace(
        db: &DatabaseConnection,
        id: Uuid,
        if_match: Option<&str>,
        draft: TodoDraft,
        now: DateTime<Utc>,
    ) -> Result<todo_item::Model, TodoError> {
        validation::validate(&draft, now)
            .into_result()
            .map_err(TodoError::Validation)?;
        let existing = Self::load_for_mutation(db, id, if_match).await?;
        let item = Self::persist_draft(db, existing, draft, now).await?;
        info!(item_id = %item.id, "Todo item replaced.");
        Ok(item)
    }

    /// Applies a JSON Patch document to a working copy of the item and
    /// persists the result only if it validates.
    pub async fn patch(
        db: &DatabaseConnection,
        id: Uuid,
        if_match: Option<&str>,
        patch: &json_patch::Patch,
        now: DateTime<Utc>,
    ) -> Result<todo_item::Model, TodoError> {
        let existing = Self::load_for_mutation(db, id, if_match).await?;

        let mut document = serde_json::to_value(TodoPatchDocument::from(&existing))?;
        json_patch::patch(&mut document, &patch.0).map_err(|e| {
            TodoError::Validation(ValidationErrors::single("patch", e.to_string()))
        })?;
        let patched: TodoPatchDocument = serde_json::from_value(document).map_err(|e| {
            TodoError::Validation(ValidationErrors::single(
                "patch",
                format!("Patched item is invalid: {e}"),
            ))
        })?;

        let draft = TodoDraft::from(patched);
        validation::validate_patched(&draft, now, existing.due_at)
            .into_result()
            .map_err(TodoError::Validation)?;

        let item = Self::persist_draft(db, existing, draft, now).await?;
        info!(item_id = %item.id, "Todo item patched.");
        Ok(item)
    }

    pub async fn toggle_complete(
        db: &DatabaseConnection,
        id: Uuid,
        if_match: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<todo_item::Model, TodoError> {
        let existing = Self::load_for_mutation(db, id, if_match).await?;
        let modified_at = etag::next_modified_at(existing.last_modified(), now);
        let completed = !existing.is_completed;

        let mut active_item: todo_item::ActiveModel = existing.into();
        active_item.is_completed = Set(completed);
        active_item.updated_at = Set(Some(modified_at));

        let item = active_item.update(db).await?;
        info!(item_id = %item.id, completed, "Todo item completion toggled.");
        Ok(item)
    }

    /// Flags the item as deleted; the row is kept.
    pub async fn soft_delete(
        db: &DatabaseConnection,
        id: Uuid,
        if_match: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), TodoError> {
        let existing = Self::load_for_mutation(db, id, if_match).await?;
        let deleted_at = etag::next_modified_at(existing.last_modified(), now);

        let mut active_item: todo_item::ActiveModel = existing.into();
        active_item.is_deleted = Set(true);
        active_item.deleted_at = Set(Some(deleted_at));
        active_item.updated_at = Set(Some(deleted_at));

        active_item.update(db).await?;
        info!(item_id = %id, "Todo item soft-deleted.");
        Ok(())
    }

    /// Incomplete, non-deleted items whose due date is before `now`.
    pub async fn count_overdue(db: &DatabaseConnection, now: DateTime<Utc>) -> Result<u64, DbErr> {
        TodoItem::find()
            .filter(todo_item::Column::IsCompleted.eq(false))
            .filter(todo_item::Column::IsDeleted.eq(false))
            .filter(todo_item::Column::DueAt.is_not_null())
            .filter(todo_item::Column::DueAt.lt(etag::truncate(now)))
            .count(db)
            .await
    }

    async fn load_for_mutation(
        db: &DatabaseConnection,
        id: Uuid,
        if_match: Option<&str>,
    ) -> Result<todo_item::Model, TodoError> {
        let item = Self::get(db, id).await?;
        let current = etag::for_item(&item);
        match if_match {
            Some(presented) if etag::matches(presented, &current) => Ok(item),
            _ => {
                debug!(item_id = %id, presented = ?if_match, current = %current, "Concurrency tag mismatch.");
                Err(TodoError::PreconditionFailed(id))
            }
        }
    }

    async fn persist_draft(
        db: &DatabaseConnection,
        existing: todo_item::Model,
        draft: TodoDraft,
        now: DateTime<Utc>,
    ) -> Result<todo_item::Model, TodoError> {
        let modified_at = etag::next_modified_at(existing.last_modified(), now);

        let mut active_item: todo_item::ActiveModel = existing.into();
        apply_draft(&mut active_item, draft);
        active_item.updated_at = Set(Some(modified_at));

        Ok(active_item.update(db).await?)
    }
}

/// Sets every client-editable column, and the folded filter columns that
/// shadow them, from a validated draft.
fn apply_draft(active_item: &mut todo_item::ActiveModel, draft: TodoDraft) {
    let title = draft.title.trim().to_string();
    let description = clean_description(draft.description);
    let labels = label_codec::encode(&draft.labels);

    active_item.title_folded = Set(label_codec::fold(&title));
    active_item.description_folded = Set(description.as_deref().map(label_codec::fold));
    active_item.labels_folded = Set(labels.as_deref().map(label_codec::fold));
    active_item.title = Set(title);
    active_item.description = Set(description);
    active_item.is_completed = Set(draft.is_completed);
    active_item.due_at = Set(draft.due_at.map(etag::truncate));
    active_item.priority = Set(draft.priority);
    active_item.labels = Set(labels);
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}
