//! Listing filters, paging and ordering for todo items, and their translation
//! into a SeaORM select.

use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{ColumnTrait, Condition, EntityTrait, Order, QueryFilter, QueryOrder, Select};
use std::str::FromStr;

use crate::db::entities::todo_item::{self, Column};
use crate::db::enums::Priority;
use crate::services::label_codec;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 200;
/// Highest page whose offset still fits the store's signed 64-bit binding.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PAGE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    DueAt,
    Priority,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    fn column(self) -> Column {
        match self {
            SortField::Title => Column::Title,
            SortField::DueAt => Column::DueAt,
            SortField::Priority => Column::Priority,
            SortField::CreatedAt => Column::CreatedAt,
            SortField::UpdatedAt => Column::UpdatedAt,
        }
    }
}

impl FromStr for SortField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(SortField::Title),
            "dueat" => Ok(SortField::DueAt),
            "priority" => Ok(SortField::Priority),
            "createdat" => Ok(SortField::CreatedAt),
            "updatedat" => Ok(SortField::UpdatedAt),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoQuery {
    pub page: u64,
    pub page_size: u64,
    pub search: Option<String>,
    pub is_completed: Option<bool>,
    pub label: Option<String>,
    pub priority: Option<Priority>,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
}

impl Default for TodoQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: None,
            is_completed: None,
            label: None,
            priority: None,
            sort_field: SortField::CreatedAt,
            sort_direction: SortDirection::Desc,
        }
    }
}

impl TodoQuery {
    /// Builds a query from raw request values, applying defaults and clamps.
    /// Pages beyond `MAX_PAGE` are capped. Unparseable priorities are dropped;
    /// an unknown sort field or direction falls back to `createdAt desc`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_raw(
        page: Option<i64>,
        page_size: Option<i64>,
        search: Option<&str>,
        is_completed: Option<bool>,
        label: Option<&str>,
        priority: Option<&str>,
        sort_by: Option<&str>,
        sort_dir: Option<&str>,
    ) -> Self {
        let page = page.unwrap_or(1).clamp(1, MAX_PAGE as i64) as u64;
        let page_size = page_size
            .unwrap_or(DEFAULT_PAGE_SIZE as i64)
            .clamp(1, MAX_PAGE_SIZE as i64) as u64;

        let non_blank = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let field = sort_by.map(SortField::from_str).unwrap_or(Ok(SortField::CreatedAt));
        let direction = sort_dir
            .map(SortDirection::from_str)
            .unwrap_or(Ok(SortDirection::Desc));
        let (sort_field, sort_direction) = match (field, direction) {
            (Ok(field), Ok(direction)) => (field, direction),
            _ => (SortField::CreatedAt, SortDirection::Desc),
        };

        Self {
            page,
            page_size,
            search: non_blank(search),
            is_completed,
            label: non_blank(label),
            priority: priority.and_then(|p| p.parse().ok()),
            sort_field,
            sort_direction,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self, total: u64) -> bool {
        self.page.saturating_mul(self.page_size) < total
    }

    /// The filtered and ordered select, without paging. Soft-deleted rows are
    /// always excluded.
    pub fn select(&self) -> Select<todo_item::Entity> {
        let mut select = todo_item::Entity::find().filter(Column::IsDeleted.eq(false));

        if let Some(is_completed) = self.is_completed {
            select = select.filter(Column::IsCompleted.eq(is_completed));
        }

        // Folded columns are written with the same folding as the term, so
        // matching does not depend on the backend's LOWER().
        if let Some(search) = &self.search {
            let pattern = format!("%{}%", escape_like(&label_codec::fold(search), '\\'));
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::col(Column::TitleFolded)
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::col(Column::DescriptionFolded)
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }

        if let Some(label) = &self.label {
            let delimiter = label_codec::DELIMITER;
            let pattern = format!(
                "%{delimiter}{}{delimiter}%",
                escape_like(&label_codec::fold(label), LABEL_ESCAPE)
            );
            select = select.filter(Expr::cust_with_values(
                format!("('{delimiter}' || labels_folded || '{delimiter}') LIKE ? ESCAPE '{LABEL_ESCAPE}'"),
                [pattern],
            ));
        }

        if let Some(priority) = self.priority {
            select = select.filter(Column::Priority.eq(priority));
        }

        let order = match self.sort_direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };
        select = select.order_by(self.sort_field.column(), order);
        if self.sort_field != SortField::CreatedAt {
            select = select.order_by_desc(Column::CreatedAt);
        }
        select.order_by_asc(Column::Id)
    }
}

const LABEL_ESCAPE: char = '!';

fn escape_like(value: &str, escape: char) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '%' || c == '_' || c == escape {
            escaped.push(escape);
        }
        escaped.push(c);
    }
    escaped
}
