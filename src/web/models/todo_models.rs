use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::entities::todo_item;
use crate::db::enums::Priority;
use crate::db::models::TodoDraft;
use crate::db::query::TodoQuery;

/// Raw `GET /items` query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemsParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
    pub is_completed: Option<bool>,
    pub label: Option<String>,
    pub priority: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

impl ListItemsParams {
    pub fn to_query(&self) -> TodoQuery {
        TodoQuery::from_raw(
            self.page,
            self.page_size,
            self.search.as_deref(),
            self.is_completed,
            self.label.as_deref(),
            self.priority.as_deref(),
            self.sort_by.as_deref(),
            self.sort_dir.as_deref(),
        )
    }

    /// Relative link to another page of the same listing.
    pub fn page_link(&self, query: &TodoQuery, page: u64) -> String {
        let mut pairs = vec![
            format!("page={page}"),
            format!("pageSize={}", query.page_size),
        ];
        let mut push = |name: &str, value: Option<&str>| {
            if let Some(value) = value {
                pairs.push(format!("{name}={}", urlencoding::encode(value)));
            }
        };
        push("search", self.search.as_deref());
        push(
            "isCompleted",
            self.is_completed.map(|c| if c { "true" } else { "false" }),
        );
        push("label", self.label.as_deref());
        push("priority", self.priority.as_deref());
        push("sortBy", self.sort_by.as_deref());
        push("sortDir", self.sort_dir.as_deref());
        format!("/items?{}", pairs.join("&"))
    }
}

/// Body of `POST /items` and `PUT /items/{id}`. A missing title is reported
/// by validation rather than as a malformed body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPayload {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl From<TodoPayload> for TodoDraft {
    fn from(payload: TodoPayload) -> Self {
        Self {
            title: payload.title,
            description: payload.description,
            is_completed: payload.is_completed,
            due_at: payload.due_at,
            priority: payload.priority,
            labels: payload.labels,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItemResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub labels: Vec<String>,
}

impl From<&todo_item::Model> for TodoItemResponse {
    fn from(model: &todo_item::Model) -> Self {
        Self {
            id: model.id,
            title: model.title.clone(),
            description: model.description.clone(),
            is_completed: model.is_completed,
            due_at: model.due_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
            priority: model.priority,
            labels: model.label_list(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}
