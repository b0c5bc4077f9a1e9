use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Schema};
use tracing::info;

use crate::db::entities::todo_item;

/// Creates the `todo_items` table and its listing index when they are missing.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut table = schema.create_table_from_entity(todo_item::Entity);
    table.if_not_exists();
    db.execute(backend.build(&table)).await?;

    let index = Index::create()
        .name("idx_todo_items_deleted_created")
        .table(todo_item::Entity)
        .col(todo_item::Column::IsDeleted)
        .col(todo_item::Column::CreatedAt)
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&index)).await?;

    info!(backend = ?backend, "Database schema is ready.");
    Ok(())
}
