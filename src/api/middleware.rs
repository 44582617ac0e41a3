use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::api::state::AppState;
use crate::config::Config;
use crate::db::SessionRepository;
use crate::error::AppError;

/// Id of the authenticated caller, inserted by [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Auth("You are not logged in! Please log in to get access.".to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Auth("Invalid Authorization format".to_string()))
}

/// Authentication middleware - validates session tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?.to_string();

    let session = SessionRepository::get_active(&state.db, &token)
        .await?
        .ok_or_else(|| AppError::Auth("Invalid or expired session".to_string()))?;

    request.extensions_mut().insert(CurrentUser(session.user_id));

    Ok(next.run(request).await)
}

/// Fixed-window request counter per client IP.
#[derive(Clone)]
pub struct RateLimiter {
    // IP -> (count, window_start)
    state: Arc<Mutex<HashMap<IpAddr, (u32, Instant)>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.rate_limit_max, config.rate_limit_window_secs)
    }

    /// Counts one request from `ip`. Once the window is used up, returns how
    /// long until it resets.
    pub async fn check(&self, ip: IpAddr) -> Result<(), Duration> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        let entry = state.entry(ip).or_insert((0, now));

        let elapsed = now.duration_since(entry.1);
        if elapsed > self.window {
            *entry = (1, now);
            return Ok(());
        }

        if entry.0 < self.max_requests {
            entry.0 += 1;
            Ok(())
        } else {
            Err(self.window - elapsed)
        }
    }

    /// Drops clients whose window ended long ago.
    pub async fn cleanup(&self) {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state.retain(|_, (_, start)| now.duration_since(*start) <= self.window * 2);
    }
}

/// Rejects a client over its quota with 429 and a `Retry-After` hint.
pub async fn rate_limit_middleware(
    limiter: Arc<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Served without connect info (tests), every request counts as loopback
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    if let Err(wait) = limiter.check(ip).await {
        tracing::debug!("🚫 Rate limit hit for {}", ip);
        // round up so clients never retry early
        let retry_after_secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
        return Err(AppError::RateLimited { retry_after_secs });
    }

    Ok(next.run(request).await)
}
