use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::warn;

use crate::web::AppState;

pub fn create_health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health/live", get(liveness))
        .route("/health/ready", get(readiness))
}

async fn liveness() -> Json<Value> {
    Json(json!({ "status": "Healthy" }))
}

async fn readiness(State(app_state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match app_state.db_pool.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "Healthy" }))),
        Err(e) => {
            warn!(error = %e, "Readiness check failed: database unreachable.");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "Unhealthy" })),
            )
        }
    }
}
