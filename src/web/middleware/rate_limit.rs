//! Fixed-window request limiting keyed by client address.

use axum::{
    body::Body as AxumBody,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::web::{AppState, error::AppError};

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

pub struct RateLimiter {
    permits: u32,
    window: Duration,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    /// `permits == 0` disables limiting.
    pub fn new(permits: u32, window: Duration) -> Self {
        Self {
            permits,
            window,
            windows: DashMap::new(),
        }
    }

    /// Records a request from `key` at `now`. On rejection returns how long
    /// until the key's window resets.
    pub fn check(&self, key: &str, now: Instant) -> Result<(), Duration> {
        if self.permits == 0 {
            return Ok(());
        }
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        let elapsed = now.saturating_duration_since(entry.started);
        if elapsed >= self.window {
            entry.started = now;
            entry.count = 0;
        }
        if entry.count >= self.permits {
            return Err(self.window.saturating_sub(now.saturating_duration_since(entry.started)));
        }
        entry.count += 1;
        Ok(())
    }

    /// Drops windows that have already expired.
    pub fn purge_expired(&self, now: Instant) {
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < self.window);
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

fn client_key(req: &Request<AxumBody>) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    let key = client_key(&req);
    if let Err(retry_after) = state.rate_limiter.check(&key, Instant::now()) {
        debug!(client = %key, "Rate limit exceeded.");
        return Err(AppError::TooManyRequests {
            retry_after_secs: retry_after.as_secs().max(1),
        });
    }
    Ok(next.run(req).await)
}
