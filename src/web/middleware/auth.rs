use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::warn;

use crate::services::auth_service;
use crate::web::models::AuthenticatedUser;
use crate::web::{AppState, error::AppError};

/// Requires a valid bearer token, from the `Authorization` header or the
/// `token` cookie.
pub async fn auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .or_else(|| jar.get("token").map(|c| c.value().to_string()))
        .ok_or(AppError::InvalidCredentials)?;

    let claims = auth_service::verify_token(&token, &state.config.jwt_secret).map_err(|e| {
        warn!(error = ?e, "JWT decoding error during auth middleware.");
        AppError::InvalidCredentials
    })?;

    req.extensions_mut().insert(AuthenticatedUser {
        subject: claims.sub,
    });
    Ok(next.run(req).await)
}
