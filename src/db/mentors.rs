use sqlx::types::Json;
use sqlx::{Pool, Sqlite, SqliteExecutor};

use crate::db::models::{MentorProfile, MentorshipRequest, RequestStatus};
use crate::error::AppError;

/// Most mentors a directory query returns.
pub const DIRECTORY_LIMIT: i64 = 50;

const SELECT_MENTOR: &str = r#"
SELECT m.user_id, u.name, u.profile_photo, u.bio,
       m.current_company, m.current_position, m.years_of_experience, m.industry,
       m.university, m.degree, m.graduation_year, m.mentorship_areas, m.availability,
       m.max_mentees, m.linkedin_url, m.github_url, m.portfolio_url, m.is_mentor_active,
       m.completed_sessions, m.rating, m.profile_views,
       (SELECT COUNT(*) FROM mentorship_requests r
        WHERE r.mentor_id = m.user_id AND r.status = 'accepted') AS mentee_count,
       m.created_at, m.updated_at
FROM mentor_profiles m
JOIN users u ON m.user_id = u.id
"#;

const SELECT_REQUEST: &str = r#"
SELECT r.student_id, u.name AS student_name, u.profile_photo AS student_photo,
       u.branch, u.year, r.status, r.requested_at, r.accepted_at
FROM mentorship_requests r
JOIN users u ON r.student_id = u.id
"#;

/// Fields accepted when a user becomes a mentor, already validated.
#[derive(Debug, Clone)]
pub struct NewMentorProfile {
    pub current_company: String,
    pub current_position: String,
    pub years_of_experience: String,
    pub industry: String,
    pub university: String,
    pub degree: String,
    pub graduation_year: String,
    pub mentorship_areas: Vec<String>,
    pub availability: String,
    pub max_mentees: i64,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
}

/// Partial mentor update; `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct MentorChanges {
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

/// Directory filters. Text filters match case-insensitively as substrings;
/// `industry` and `experience` must match exactly; a mentor matches
/// `areas` when it offers any one of them.
#[derive(Debug, Clone, Default)]
pub struct MentorFilter {
    pub search: Option<String>,
    pub company: Option<String>,
    pub industry: Option<String>,
    pub areas: Option<Vec<String>>,
    pub experience: Option<String>,
}

pub struct MentorRepository;

impl MentorRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        user_id: &str,
        profile: NewMentorProfile,
    ) -> Result<MentorProfile, AppError> {
        let now = chrono::Utc::now().timestamp_millis();

        sqlx::query(
            r#"
INSERT INTO mentor_profiles (
    user_id, current_company, current_position, years_of_experience, industry,
    university, degree, graduation_year, mentorship_areas, availability, max_mentees,
    linkedin_url, github_url, portfolio_url, created_at, updated_at
)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&profile.current_company)
        .bind(&profile.current_position)
        .bind(&profile.years_of_experience)
        .bind(&profile.industry)
        .bind(&profile.university)
        .bind(&profile.degree)
        .bind(&profile.graduation_year)
        .bind(Json(&profile.mentorship_areas))
        .bind(&profile.availability)
        .bind(profile.max_mentees)
        .bind(&profile.linkedin_url)
        .bind(&profile.github_url)
        .bind(&profile.portfolio_url)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("You already have a mentor profile".to_string())
            }
            other => AppError::Database(other),
        })?;

        Self::get(pool, user_id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch created mentor profile".to_string()))
    }

    pub async fn get<'e, E: SqliteExecutor<'e>>(
        exec: E,
        user_id: &str,
    ) -> Result<Option<MentorProfile>, AppError> {
        let sql = format!("{SELECT_MENTOR} WHERE m.user_id = ?");

        let profile = sqlx::query_as::<_, MentorProfile>(&sql)
            .bind(user_id)
            .fetch_optional(exec)
            .await?;

        Ok(profile)
    }

    /// A mentor students can currently find and ask: both the account and
    /// the mentor profile are active.
    pub async fn get_available<'e, E: SqliteExecutor<'e>>(
        exec: E,
        user_id: &str,
    ) -> Result<Option<MentorProfile>, AppError> {
        let sql = format!("{SELECT_MENTOR} WHERE m.user_id = ? AND u.active = 1 AND m.is_mentor_active = 1");

        let profile = sqlx::query_as::<_, MentorProfile>(&sql)
            .bind(user_id)
            .fetch_optional(exec)
            .await?;

        Ok(profile)
    }

    pub async fn update(
        pool: &Pool<Sqlite>,
        user_id: &str,
        changes: MentorChanges,
    ) -> Result<Option<MentorProfile>, AppError> {
        let result = sqlx::query(
            r#"
UPDATE mentor_profiles SET
    current_company = COALESCE(?, current_company),
    current_position = COALESCE(?, current_position),
    mentorship_areas = COALESCE(?, mentorship_areas),
    availability = COALESCE(?, availability),
    max_mentees = COALESCE(?, max_mentees),
    linkedin_url = COALESCE(?, linkedin_url),
    github_url = COALESCE(?, github_url),
    portfolio_url = COALESCE(?, portfolio_url),
    is_mentor_active = COALESCE(?, is_mentor_active),
    updated_at = ?
WHERE user_id = ?
            "#,
        )
        .bind(changes.current_company)
        .bind(changes.current_position)
        .bind(changes.mentorship_areas.map(Json))
        .bind(changes.availability)
        .bind(changes.max_mentees)
        .bind(changes.linkedin_url)
        .bind(changes.github_url)
        .bind(changes.portfolio_url)
        .bind(changes.is_mentor_active)
        .bind(chrono::Utc::now().timestamp_millis())
        .bind(user_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::get(pool, user_id).await
    }

    /// Available mentors matching `filter`, best rated first.
    pub async fn directory<'e, E: SqliteExecutor<'e>>(
        exec: E,
        filter: &MentorFilter,
    ) -> Result<Vec<MentorProfile>, AppError> {
        let sql = format!(
            r#"{SELECT_MENTOR}
WHERE u.active = 1 AND m.is_mentor_active = 1
  AND (?1 IS NULL OR instr(lower(u.name), lower(?1)) > 0
                  OR instr(lower(m.current_company), lower(?1)) > 0)
  AND (?2 IS NULL OR instr(lower(m.current_company), lower(?2)) > 0)
  AND (?3 IS NULL OR m.industry = ?3)
  AND (?4 IS NULL OR EXISTS (
        SELECT 1 FROM json_each(m.mentorship_areas) offered
        WHERE offered.value IN (SELECT value FROM json_each(?4))))
  AND (?5 IS NULL OR m.years_of_experience = ?5)
ORDER BY m.rating DESC, m.completed_sessions DESC, m.created_at
LIMIT ?6"#
        );

        let mentors = sqlx::query_as::<_, MentorProfile>(&sql)
            .bind(filter.search.as_deref())
            .bind(filter.company.as_deref())
            .bind(filter.industry.as_deref())
            .bind(filter.areas.as_ref().map(Json))
            .bind(filter.experience.as_deref())
            .bind(DIRECTORY_LIMIT)
            .fetch_all(exec)
            .await?;

        Ok(mentors)
    }

    pub async fn record_view<'e, E: SqliteExecutor<'e>>(exec: E, user_id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE mentor_profiles SET profile_views = profile_views + 1 WHERE user_id = ?")
            .bind(user_id)
            .execute(exec)
            .await?;

        Ok(())
    }

    /// Files a pending request from `student_id`. Asking again, or asking a
    /// mentor one already has, is a conflict.
    pub async fn request<'e, E: SqliteExecutor<'e>>(
        exec: E,
        mentor_id: &str,
        student_id: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
INSERT INTO mentorship_requests (mentor_id, student_id, status, requested_at)
VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(mentor_id)
        .bind(student_id)
        .bind(RequestStatus::Pending)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(exec)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("You have already contacted this mentor".to_string())
            }
            other => AppError::Database(other),
        })?;

        Ok(())
    }

    /// Requests to `mentor_id` in `status`, oldest first.
    pub async fn requests<'e, E: SqliteExecutor<'e>>(
        exec: E,
        mentor_id: &str,
        status: RequestStatus,
    ) -> Result<Vec<MentorshipRequest>, AppError> {
        let sql = format!("{SELECT_REQUEST} WHERE r.mentor_id = ? AND r.status = ? ORDER BY r.requested_at, r.rowid");

        let requests = sqlx::query_as::<_, MentorshipRequest>(&sql)
            .bind(mentor_id)
            .bind(status)
            .fetch_all(exec)
            .await?;

        Ok(requests)
    }

    /// Mentors that accepted `student_id`.
    pub async fn mentors_of<'e, E: SqliteExecutor<'e>>(
        exec: E,
        student_id: &str,
    ) -> Result<Vec<MentorProfile>, AppError> {
        let sql = format!(
            "{SELECT_MENTOR} JOIN mentorship_requests mr ON mr.mentor_id = m.user_id \
             WHERE mr.student_id = ? AND mr.status = 'accepted' ORDER BY mr.accepted_at"
        );

        let mentors = sqlx::query_as::<_, MentorProfile>(&sql)
            .bind(student_id)
            .fetch_all(exec)
            .await?;

        Ok(mentors)
    }

    /// Moves a pending request into the mentor's mentees, unless that would
    /// exceed `max_mentees`. Runs under one write transaction so concurrent
    /// accepts cannot overshoot the limit.
    pub async fn accept(
        pool: &Pool<Sqlite>,
        mentor_id: &str,
        student_id: &str,
    ) -> Result<MentorshipRequest, AppError> {
        let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

        let max_mentees: i64 = sqlx::query_scalar("SELECT max_mentees FROM mentor_profiles WHERE user_id = ?")
            .bind(mentor_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("You do not have a mentor profile".to_string()))?;

        let status: RequestStatus = sqlx::query_scalar(
            "SELECT status FROM mentorship_requests WHERE mentor_id = ? AND student_id = ?",
        )
        .bind(mentor_id)
        .bind(student_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("No mentorship request from this student".to_string()))?;

        if status == RequestStatus::Accepted {
            return Err(AppError::Conflict("This student is already your mentee".to_string()));
        }

        let mentees: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM mentorship_requests WHERE mentor_id = ? AND status = 'accepted'",
        )
        .bind(mentor_id)
        .fetch_one(&mut *tx)
        .await?;

        if mentees >= max_mentees {
            return Err(AppError::Conflict(format!(
                "You already mentor the maximum of {} students",
                max_mentees
            )));
        }

        sqlx::query(
            "UPDATE mentorship_requests SET status = ?, accepted_at = ? WHERE mentor_id = ? AND student_id = ?",
        )
        .bind(RequestStatus::Accepted)
        .bind(chrono::Utc::now().timestamp_millis())
        .bind(mentor_id)
        .bind(student_id)
        .execute(&mut *tx)
        .await?;

        let sql = format!("{SELECT_REQUEST} WHERE r.mentor_id = ? AND r.student_id = ?");
        let request = sqlx::query_as::<_, MentorshipRequest>(&sql)
            .bind(mentor_id)
            .bind(student_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(request)
    }

    /// Drops a pending request. Returns `false` when there was none.
    pub async fn decline<'e, E: SqliteExecutor<'e>>(
        exec: E,
        mentor_id: &str,
        student_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM mentorship_requests WHERE mentor_id = ? AND student_id = ? AND status = 'pending'",
        )
        .bind(mentor_id)
        .bind(student_id)
        .execute(exec)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
