use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::enums::Priority;
use crate::services::label_codec;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "todo_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "String(StringLen::N(200))")]
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub is_completed: bool,
    pub due_at: Option<ChronoDateTimeUtc>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: Option<ChronoDateTimeUtc>,
    pub is_deleted: bool,
    pub deleted_at: Option<ChronoDateTimeUtc>,
    pub priority: Priority,
    // Comma-delimited, see `services::label_codec`.
    #[sea_orm(column_type = "Text", nullable)]
    pub labels: Option<String>,
    // Case-folded copies of the text columns, matched by list filters.
    #[sea_orm(column_type = "Text")]
    pub title_folded: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description_folded: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub labels_folded: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn label_list(&self) -> Vec<String> {
        label_codec::decode(self.labels.as_deref())
    }

    /// Timestamp the concurrency tag is derived from.
    pub fn last_modified(&self) -> ChronoDateTimeUtc {
        self.updated_at.unwrap_or(self.created_at)
    }
}
