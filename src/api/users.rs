use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use crate::api::middleware::CurrentUser;
use crate::api::state::AppState;
use crate::api::validation::{
    clean_interests, validate_bio, validate_branch, validate_email, validate_name, validate_year,
};
use crate::db::{ProfileChanges, Relation, RelationshipRepository, SessionRepository, User, UserRepository};
use crate::error::AppError;
use crate::matching::LikeOutcome;

/// Only these fields may be changed through `PATCH /users/me`; anything else
/// in the body is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub branch: Option<String>,
    pub year: Option<String>,
    pub interests: Option<Vec<String>>,
    pub bio: Option<String>,
    pub profile_photo: Option<String>,
}

/// GET /api/v1/users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = UserRepository::list_active_except(&state.db, &user_id).await?;
    Ok(Json(users))
}

/// GET /api/v1/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    let user = UserRepository::get_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("No user found with that ID".to_string()))?;

    Ok(Json(user))
}

/// PATCH /api/v1/users/me
pub async fn update_me(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<UpdateMeRequest>,
) -> Result<Json<User>, AppError> {
    let domain = state.config.allowed_email_domain.as_deref();

    let changes = ProfileChanges {
        name: req.name.as_deref().map(validate_name).transpose()?,
        email: req.email.as_deref().map(|e| validate_email(e, domain)).transpose()?,
        branch: req.branch.as_deref().map(validate_branch).transpose()?,
        year: req.year.as_deref().map(validate_year).transpose()?,
        bio: req.bio.as_deref().map(validate_bio).transpose()?,
        interests: req.interests.map(clean_interests),
        profile_photo: req.profile_photo.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
    };

    let user = UserRepository::update_profile(&state.db, &user_id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("No user found with that ID".to_string()))?;

    Ok(Json(user))
}

/// DELETE /api/v1/users/me
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<StatusCode, AppError> {
    UserRepository::deactivate(&state.db, &user_id).await?;
    let ended = SessionRepository::delete_for_user(&state.db, &user_id).await?;
    tracing::info!("👋 User deactivated: {} ({} sessions ended)", user_id, ended);

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/users/like/:id
pub async fn like_user(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(target_id): Path<String>,
) -> Result<Json<LikeOutcome>, AppError> {
    let outcome = state.matchmaker.like(&user_id, &target_id).await?;
    Ok(Json(outcome))
}

/// POST /api/v1/users/dislike/:id
pub async fn dislike_user(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(target_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.matchmaker.dislike(&user_id, &target_id).await?;
    Ok(Json(serde_json::json!({})))
}

/// GET /api/v1/users/matches
pub async fn my_matches(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = RelationshipRepository::member_users(&state.db, Relation::Matches, &user_id).await?;
    Ok(Json(users))
}
