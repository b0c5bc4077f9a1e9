#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use todo_backend::db::entities::todo_item;
use todo_backend::db::enums::Priority;
use todo_backend::db::schema;
use todo_backend::server::config::ServerConfig;
use todo_backend::services::auth_service;
use todo_backend::web::{AppState, create_axum_router};

pub const JWT_SECRET: &str = "integration-test-secret";

pub async fn setup_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(opt)
        .await
        .expect("in-memory sqlite should connect");
    schema::ensure_schema(&db)
        .await
        .expect("schema should be created");
    db
}

pub fn test_config(rate_limit_permits: u32) -> ServerConfig {
    ServerConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        cors_allowed_origins: Vec::new(),
        rate_limit_permits,
        rate_limit_window_secs: 60,
        overdue_poll_interval_secs: 60,
        log_dir: "logs".to_string(),
        db_max_connections: 1,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn etag(&self) -> String {
        self.headers
            .get(header::ETAG)
            .expect("response should carry an ETag")
            .to_str()
            .unwrap()
            .to_string()
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    pub token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_rate_limit(0).await
    }

    pub async fn with_rate_limit(permits: u32) -> Self {
        let db = setup_db().await;
        let state = Arc::new(AppState::new(db.clone(), Arc::new(test_config(permits))));
        let token = auth_service::issue_token("tester", JWT_SECRET, chrono::Duration::hours(1))
            .expect("token should be issued");
        Self {
            router: create_axum_router(state),
            db,
            token,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should be readable")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    /// Authenticated request with an optional `If-Match` header and JSON body.
    pub async fn mutate(
        &self,
        method: Method,
        uri: &str,
        if_match: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        if let Some(tag) = if_match {
            builder = builder.header(header::IF_MATCH, tag);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn create(&self, body: Value) -> TestResponse {
        let response = self.mutate(Method::POST, "/items", None, Some(body)).await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response
    }
}

/// Inserts a row directly, bypassing validation.
pub async fn insert_raw(
    db: &DatabaseConnection,
    title: &str,
    due_at: Option<DateTime<Utc>>,
    is_completed: bool,
    is_deleted: bool,
) -> todo_item::Model {
    let now = Utc::now();
    todo_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        description: Set(None),
        is_completed: Set(is_completed),
        due_at: Set(due_at.map(todo_backend::services::etag::truncate)),
        created_at: Set(todo_backend::services::etag::truncate(now)),
        updated_at: Set(None),
        is_deleted: Set(is_deleted),
        deleted_at: Set(is_deleted.then_some(now)),
        priority: Set(Priority::Medium),
        labels: Set(None),
        title_folded: Set(title.to_lowercase()),
        description_folded: Set(None),
        labels_folded: Set(None),
    }
    .insert(db)
    .await
    .expect("raw insert should succeed")
}
