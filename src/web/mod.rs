use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::server::config::ServerConfig;
use crate::web::middleware::{auth, rate_limit};
use crate::web::routes::{health_routes, todo_routes};

pub use crate::web::error::AppError;
use crate::web::middleware::rate_limit::RateLimiter;

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub config: Arc<ServerConfig>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(db_pool: DatabaseConnection, config: Arc<ServerConfig>) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(
            config.rate_limit_permits,
            config.rate_limit_window(),
        ));
        Self {
            db_pool,
            config,
            rate_limiter,
        }
    }
}

fn create_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin.");
                None
            }
        })
        .collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::IF_MATCH,
            header::IF_NONE_MATCH,
        ])
        .expose_headers(vec![header::ETAG, header::LOCATION])
}

pub fn create_axum_router(app_state: Arc<AppState>) -> Router {
    let cors = create_cors_layer(&app_state.config);

    let items = todo_routes::create_public_router()
        .merge(
            todo_routes::create_protected_router()
                .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            rate_limit::rate_limit,
        ));

    Router::new()
        .merge(health_routes::create_health_router())
        .merge(items)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
