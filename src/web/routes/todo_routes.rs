use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::db::services::TodoItemService;
use crate::services::etag;
use crate::web::models::AuthenticatedUser;
use crate::web::models::todo_models::{
    ListItemsParams, PagedResponse, TodoItemResponse, TodoPayload,
};
use crate::web::{AppError, AppState};

pub fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/items", get(list_items))
        .route("/items/{id}", get(get_item))
}

pub fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/items", post(create_item))
        .route(
            "/items/{id}",
            patch(patch_item).put(replace_item).delete(delete_item),
        )
        .route("/items/{id}/complete", patch(toggle_complete))
}

fn if_match(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::IF_MATCH)
        .and_then(|value| value.to_str().ok())
}

async fn list_items(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ListItemsParams>,
) -> Result<Json<PagedResponse<TodoItemResponse>>, AppError> {
    let query = params.to_query();
    let page = TodoItemService::list(&app_state.db_pool, &query).await?;

    Ok(Json(PagedResponse {
        items: page.items.iter().map(TodoItemResponse::from).collect(),
        total: page.total,
        page: query.page,
        page_size: query.page_size,
        next: query
            .has_next(page.total)
            .then(|| params.page_link(&query, query.page + 1)),
        prev: query
            .has_previous()
            .then(|| params.page_link(&query, query.page - 1)),
    }))
}

async fn get_item(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let item = TodoItemService::get(&app_state.db_pool, id).await?;
    let tag = etag::for_item(&item);

    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|presented| etag::matches(presented, &tag));
    if not_modified {
        debug!(item_id = %id, "Conditional GET matched; returning 304.");
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, tag)]).into_response());
    }

    Ok(([(header::ETAG, tag)], Json(TodoItemResponse::from(&item))).into_response())
}

async fn create_item(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(payload): Json<TodoPayload>,
) -> Result<impl IntoResponse, AppError> {
    let item = TodoItemService::create(&app_state.db_pool, payload.into(), Utc::now()).await?;
    debug!(item_id = %item.id, actor = %user.subject, "Create request completed.");

    Ok((
        StatusCode::CREATED,
        [
            (header::ETAG, etag::for_item(&item)),
            (header::LOCATION, format!("/items/{}", item.id)),
        ],
        Json(TodoItemResponse::from(&item)),
    ))
}

async fn replace_item(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<TodoPayload>,
) -> Result<impl IntoResponse, AppError> {
    let item = TodoItemService::replace(
        &app_state.db_pool,
        id,
        if_match(&headers),
        payload.into(),
        Utc::now(),
    )
    .await?;
    debug!(item_id = %id, actor = %user.subject, "Replace request completed.");
    Ok((StatusCode::NO_CONTENT, [(header::ETAG, etag::for_item(&item))]))
}

async fn patch_item(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(document): Json<json_patch::Patch>,
) -> Result<impl IntoResponse, AppError> {
    let item = TodoItemService::patch(
        &app_state.db_pool,
        id,
        if_match(&headers),
        &document,
        Utc::now(),
    )
    .await?;
    debug!(item_id = %id, actor = %user.subject, "Patch request completed.");
    Ok((StatusCode::NO_CONTENT, [(header::ETAG, etag::for_item(&item))]))
}

async fn toggle_complete(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let item = TodoItemService::toggle_complete(
        &app_state.db_pool,
        id,
        if_match(&headers),
        Utc::now(),
    )
    .await?;
    debug!(item_id = %id, actor = %user.subject, "Toggle request completed.");
    Ok((StatusCode::NO_CONTENT, [(header::ETAG, etag::for_item(&item))]))
}

async fn delete_item(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    TodoItemService::soft_delete(&app_state.db_pool, id, if_match(&headers), Utc::now()).await?;
    debug!(item_id = %id, actor = %user.subject, "Delete request completed.");
    Ok(StatusCode::NO_CONTENT)
}
