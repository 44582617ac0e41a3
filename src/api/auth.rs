use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{bearer_token, CurrentUser};
use crate::api::state::AppState;
use crate::api::validation::{
    clean_interests, validate_bio, validate_branch, validate_email, validate_name, validate_password,
    validate_year,
};
use crate::crypto::{digest_password, verify_password};
use crate::db::{self, NewUser, SessionRepository, User, UserProfile, UserRepository};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub branch: String,
    pub year: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub bio: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: i64,
    pub user: User,
}

async fn issue_session(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let session = SessionRepository::create(&state.db, &user.id, state.config.session_expiry_hours).await?;

    Ok(AuthResponse {
        token: session.token,
        expires_at: session.expires_at,
        user,
    })
}

/// POST /api/v1/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let name = validate_name(&req.name)?;
    let email = validate_email(&req.email, state.config.allowed_email_domain.as_deref())?;
    validate_password(&req.password, &req.password_confirm)?;
    let branch = validate_branch(&req.branch)?;
    let year = validate_year(&req.year)?;
    let bio = validate_bio(&req.bio)?;

    if UserRepository::get_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::Conflict("User with this email already exists".to_string()));
    }

    let digest = digest_password(&req.password)?;

    let user = UserRepository::create(
        &state.db,
        NewUser {
            name,
            email,
            branch,
            year,
            bio,
            interests: clean_interests(req.interests),
        },
        &digest,
    )
    .await?;

    tracing::info!("👤 New user registered: {}", user.id);

    let response = issue_session(&state, user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("Please provide email and password!".to_string()));
    }
    let email = req.email.trim().to_lowercase();

    let invalid = || AppError::Auth("Incorrect email or password".to_string());

    let user = UserRepository::get_by_email(&state.db, &email)
        .await?
        .filter(|u| u.active)
        .ok_or_else(invalid)?;

    if !verify_password(&req.password, &user.password_hash, &user.password_salt)? {
        return Err(invalid());
    }

    UserRepository::touch_last_active(&state.db, &user.id).await?;

    Ok(Json(issue_session(&state, user).await?))
}

/// POST /api/v1/auth/logout (requires auth)
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let token = bearer_token(&headers)?;
    SessionRepository::delete(&state.db, token).await?;

    Ok(Json(serde_json::json!({"success": true})))
}

/// GET /api/v1/auth/me (requires auth)
pub async fn me(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = db::load_profile(&state.db, &user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No user found with that ID".to_string()))?;

    Ok(Json(profile))
}
