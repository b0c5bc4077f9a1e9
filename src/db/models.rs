use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::entities::todo_item;
use crate::db::enums::Priority;

/// A candidate item state, as supplied by a client or produced by a patch,
/// before validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TodoDraft {
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub due_at: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub labels: Vec<String>,
}

/// The JSON view a patch document is applied to. Only mutable fields are
/// present, so operations on `/id` or `/createdAt` fail to deserialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TodoPatchDocument {
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub due_at: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub labels: Vec<String>,
}

impl From<&todo_item::Model> for TodoPatchDocument {
    fn from(model: &todo_item::Model) -> Self {
        Self {
            title: model.title.clone(),
            description: model.description.clone(),
            is_completed: model.is_completed,
            due_at: model.due_at,
            priority: model.priority,
            labels: model.label_list(),
        }
    }
}

impl From<TodoPatchDocument> for TodoDraft {
    fn from(document: TodoPatchDocument) -> Self {
        Self {
            title: document.title,
            description: document.description,
            is_completed: document.is_completed,
            due_at: document.due_at,
            priority: document.priority,
            labels: document.labels,
        }
    }
}
