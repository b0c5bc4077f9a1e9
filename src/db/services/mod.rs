pub mod todo_item_service;

pub use todo_item_service::{TodoError, TodoItemService, TodoPage};
