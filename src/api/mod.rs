pub mod auth;
pub mod matches;
pub mod mentors;
pub mod messages;
pub mod middleware;
pub mod relay;
pub mod state;
pub mod users;
pub mod validation;

pub use middleware::{CurrentUser, RateLimiter};
pub use state::AppState;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, Uri},
    middleware::{self as axum_middleware, Next},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::error::AppError;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    database: String,
}

pub fn create_router(state: AppState, rate_limiter: Arc<RateLimiter>) -> Router {
    let protected = Router::new()
        // Auth
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Users
        .route("/users", get(users::list_users))
        .route("/users/matches", get(users::my_matches))
        .route("/users/me", patch(users::update_me).delete(users::delete_me))
        .route("/users/like/:id", post(users::like_user))
        .route("/users/dislike/:id", post(users::dislike_user))
        .route("/users/:id", get(users::get_user))
        // Match records
        .route("/matches", get(matches::list_matches).post(matches::create_match))
        .route("/matches/my-matches", get(matches::my_matches))
        .route(
            "/matches/:id",
            get(matches::get_match)
                .patch(matches::update_match)
                .delete(matches::delete_match),
        )
        // Mentorship
        .route("/mentors", get(mentors::list_mentors).post(mentors::become_mentor))
        .route("/mentors/me", get(mentors::my_dashboard).patch(mentors::update_me))
        .route("/mentors/me/accept-request", post(mentors::accept_request))
        .route("/mentors/me/decline-request", post(mentors::decline_request))
        .route("/mentors/my-mentors", get(mentors::my_mentors))
        .route("/mentors/:id", get(mentors::get_mentor))
        .route("/mentors/:id/request", post(mentors::request_mentorship))
        // Messages
        .route("/messages", post(messages::send_message))
        .route("/messages/conversations", get(messages::list_conversations))
        .route("/messages/conversation/:user_id", get(messages::get_conversation))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let api = Router::new()
        .route("/health", get(health))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .merge(protected)
        .layer(axum_middleware::from_fn(move |req: Request, next: Next| {
            let limiter = rate_limiter.clone();
            middleware::rate_limit_middleware(limiter, req, next)
        }));

    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let cors = cors_layer(&state.config);

    Router::new()
        .nest("/api/v1", api)
        .route("/ws", get(relay::relay_ws))
        .fallback(not_found)
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let Some(origin) = config
        .frontend_url
        .as_deref()
        .and_then(|url| HeaderValue::from_str(url).ok())
    else {
        return CorsLayer::permissive();
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
        .allow_credentials(true)
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::error!("❌ Health check database query failed: {}", e);
            "disconnected"
        }
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database.to_string(),
        }),
    )
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Can't find {} on this server!", uri.path()))
}
