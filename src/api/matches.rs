use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use crate::api::middleware::CurrentUser;
use crate::api::state::AppState;
use crate::api::validation::clean_interests;
use crate::db::{MatchRecord, MatchRecordChanges, MatchRecordRepository, MatchStatus, UserRepository};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    pub user2_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMatchRequest {
    pub status: Option<MatchStatus>,
    pub match_score: Option<i64>,
    pub common_interests: Option<Vec<String>>,
    pub last_message: Option<String>,
}

async fn find_record(state: &AppState, id: &str) -> Result<MatchRecord, AppError> {
    MatchRecordRepository::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("No match found with that ID".to_string()))
}

async fn find_own_record(state: &AppState, id: &str, user_id: &str) -> Result<MatchRecord, AppError> {
    let record = find_record(state, id).await?;
    if !record.involves(user_id) {
        return Err(AppError::Forbidden(
            "You do not have permission to perform this action".to_string(),
        ));
    }
    Ok(record)
}

/// POST /api/v1/matches
pub async fn create_match(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<CreateMatchRequest>,
) -> Result<(StatusCode, Json<MatchRecord>), AppError> {
    if req.user2_id == user_id {
        return Err(AppError::Validation("You cannot match with yourself".to_string()));
    }

    UserRepository::get_by_id(&state.db, &req.user2_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No user found with that ID".to_string()))?;

    let record = MatchRecordRepository::create(&state.db, &user_id, &req.user2_id).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/matches
pub async fn list_matches(State(state): State<AppState>) -> Result<Json<Vec<MatchRecord>>, AppError> {
    Ok(Json(MatchRecordRepository::list_all(&state.db).await?))
}

/// GET /api/v1/matches/my-matches
pub async fn my_matches(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<Vec<MatchRecord>>, AppError> {
    let records = MatchRecordRepository::list_for_user(&state.db, &user_id, MatchStatus::Matched).await?;
    Ok(Json(records))
}

/// GET /api/v1/matches/:id
pub async fn get_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MatchRecord>, AppError> {
    Ok(Json(find_record(&state, &id).await?))
}

/// PATCH /api/v1/matches/:id
pub async fn update_match(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateMatchRequest>,
) -> Result<Json<MatchRecord>, AppError> {
    if let Some(score) = req.match_score {
        if !(0..=100).contains(&score) {
            return Err(AppError::Validation("Match score must be between 0 and 100".to_string()));
        }
    }

    find_own_record(&state, &id, &user_id).await?;

    let changes = MatchRecordChanges {
        status: req.status,
        match_score: req.match_score,
        common_interests: req.common_interests.map(clean_interests),
        last_message: req.last_message.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()),
    };

    let record = MatchRecordRepository::update(&state.db, &id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("No match found with that ID".to_string()))?;

    Ok(Json(record))
}

/// DELETE /api/v1/matches/:id
pub async fn delete_match(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    find_own_record(&state, &id, &user_id).await?;

    if !MatchRecordRepository::delete(&state.db, &id).await? {
        return Err(AppError::NotFound("No match found with that ID".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
