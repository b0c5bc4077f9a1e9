//! SeaORM entities mapping the service's tables.

pub mod todo_item;

pub mod prelude {
    pub use super::todo_item::ActiveModel as TodoItemActiveModel;
    pub use super::todo_item::Column as TodoItemColumn;
    pub use super::todo_item::Entity as TodoItem;
    pub use super::todo_item::Model as TodoItemModel;
}
