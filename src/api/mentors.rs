use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::CurrentUser;
use crate::api::state::AppState;
use crate::api::validation::{clean_interests, validate_max_mentees, validate_required, validate_url};
use crate::db::{
    MentorChanges, MentorFilter, MentorProfile, MentorRepository, MentorshipRequest, NewMentorProfile,
    RequestStatus, UserRepository,
};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BecomeMentorRequest {
    pub current_company: String,
    pub current_position: String,
    pub years_of_experience: String,
    pub industry: String,
    pub university: String,
    pub degree: String,
    pub graduation_year: String,
    #[serde(default)]
    pub mentorship_areas: Vec<String>,
    pub availability: String,
    pub max_mentees: i64,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
}

/// Only these fields may be changed through `PATCH /mentors/me`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMentorRequest {
    pub current_company: Option<String>,
    pub current_position: Option<String>,
    pub mentorship_areas: Option<Vec<String>>,
    pub availability: Option<String>,
    pub max_mentees: Option<i64>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub is_mentor_active: Option<bool>,
}

/// Query string of `GET /mentors`. `mentorshipAreas` is comma separated.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryQuery {
    pub search: Option<String>,
    pub company: Option<String>,
    pub industry: Option<String>,
    pub mentorship_areas: Option<String>,
    pub experience: Option<String>,
}

impl From<DirectoryQuery> for MentorFilter {
    fn from(query: DirectoryQuery) -> Self {
        let text = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let areas = query
            .mentorship_areas
            .map(|raw| clean_interests(raw.split(',').map(str::to_string).collect()))
            .filter(|areas| !areas.is_empty());

        MentorFilter {
            search: text(query.search),
            company: text(query.company),
            industry: text(query.industry),
            areas,
            experience: text(query.experience),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRef {
    pub student_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorDashboard {
    pub profile: MentorProfile,
    pub pending_requests: Vec<MentorshipRequest>,
    pub mentees: Vec<MentorshipRequest>,
}

fn no_profile() -> AppError {
    AppError::NotFound("You do not have a mentor profile".to_string())
}

/// POST /api/v1/mentors
pub async fn become_mentor(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<BecomeMentorRequest>,
) -> Result<(StatusCode, Json<MentorProfile>), AppError> {
    let profile = NewMentorProfile {
        current_company: validate_required("Current company", &req.current_company)?,
        current_position: validate_required("Current position", &req.current_position)?,
        years_of_experience: validate_required("Years of experience", &req.years_of_experience)?,
        industry: validate_required("Industry", &req.industry)?,
        university: validate_required("University", &req.university)?,
        degree: validate_required("Degree", &req.degree)?,
        graduation_year: validate_required("Graduation year", &req.graduation_year)?,
        mentorship_areas: clean_interests(req.mentorship_areas),
        availability: validate_required("Availability", &req.availability)?,
        max_mentees: validate_max_mentees(req.max_mentees)?,
        linkedin_url: validate_url(req.linkedin_url)?,
        github_url: validate_url(req.github_url)?,
        portfolio_url: validate_url(req.portfolio_url)?,
    };

    let mentor = MentorRepository::create(&state.db, &user_id, profile).await?;
    tracing::info!("🎓 New mentor: {}", user_id);

    Ok((StatusCode::CREATED, Json(mentor)))
}

/// GET /api/v1/mentors
pub async fn list_mentors(
    State(state): State<AppState>,
    Query(query): Query<DirectoryQuery>,
) -> Result<Json<Vec<MentorProfile>>, AppError> {
    let filter = MentorFilter::from(query);
    Ok(Json(MentorRepository::directory(&state.db, &filter).await?))
}

/// GET /api/v1/mentors/me
pub async fn my_dashboard(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<MentorDashboard>, AppError> {
    let profile = MentorRepository::get(&state.db, &user_id).await?.ok_or_else(no_profile)?;

    Ok(Json(MentorDashboard {
        profile,
        pending_requests: MentorRepository::requests(&state.db, &user_id, RequestStatus::Pending).await?,
        mentees: MentorRepository::requests(&state.db, &user_id, RequestStatus::Accepted).await?,
    }))
}

/// PATCH /api/v1/mentors/me
pub async fn update_me(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<UpdateMentorRequest>,
) -> Result<Json<MentorProfile>, AppError> {
    let changes = MentorChanges {
        current_company: req
            .current_company
            .as_deref()
            .map(|v| validate_required("Current company", v))
            .transpose()?,
        current_position: req
            .current_position
            .as_deref()
            .map(|v| validate_required("Current position", v))
            .transpose()?,
        mentorship_areas: req.mentorship_areas.map(clean_interests),
        availability: req
            .availability
            .as_deref()
            .map(|v| validate_required("Availability", v))
            .transpose()?,
        max_mentees: req.max_mentees.map(validate_max_mentees).transpose()?,
        linkedin_url: validate_url(req.linkedin_url)?,
        github_url: validate_url(req.github_url)?,
        portfolio_url: validate_url(req.portfolio_url)?,
        is_mentor_active: req.is_mentor_active,
    };

    let mentor = MentorRepository::update(&state.db, &user_id, changes)
        .await?
        .ok_or_else(no_profile)?;

    Ok(Json(mentor))
}

/// GET /api/v1/mentors/my-mentors
pub async fn my_mentors(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<Vec<MentorProfile>>, AppError> {
    Ok(Json(MentorRepository::mentors_of(&state.db, &user_id).await?))
}

/// GET /api/v1/mentors/:id
pub async fn get_mentor(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(mentor_id): Path<String>,
) -> Result<Json<MentorProfile>, AppError> {
    if mentor_id != user_id {
        MentorRepository::record_view(&state.db, &mentor_id).await?;
    }

    let mentor = MentorRepository::get(&state.db, &mentor_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No mentor found with that ID".to_string()))?;

    Ok(Json(mentor))
}

/// POST /api/v1/mentors/:id/request
pub async fn request_mentorship(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(mentor_id): Path<String>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    if mentor_id == user_id {
        return Err(AppError::Validation("You cannot mentor yourself".to_string()));
    }

    MentorRepository::get_available(&state.db, &mentor_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No available mentor found with that ID".to_string()))?;

    MentorRepository::request(&state.db, &mentor_id, &user_id).await?;
    tracing::debug!("🙋 {} asked {} for mentorship", user_id, mentor_id);

    Ok((StatusCode::CREATED, Json(serde_json::json!({"status": RequestStatus::Pending}))))
}

/// POST /api/v1/mentors/me/accept-request
pub async fn accept_request(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<StudentRef>,
) -> Result<Json<MentorshipRequest>, AppError> {
    UserRepository::get_by_id(&state.db, &req.student_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No user found with that ID".to_string()))?;

    let mentee = MentorRepository::accept(&state.db, &user_id, &req.student_id).await?;
    tracing::info!("🤝 {} now mentors {}", user_id, req.student_id);

    Ok(Json(mentee))
}

/// POST /api/v1/mentors/me/decline-request
pub async fn decline_request(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<StudentRef>,
) -> Result<StatusCode, AppError> {
    if !MentorRepository::decline(&state.db, &user_id, &req.student_id).await? {
        return Err(AppError::NotFound("No pending request from this student".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
