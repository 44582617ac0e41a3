use sqlx::types::Json;
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::crypto::PasswordDigest;
use crate::db::models::User;
use crate::error::AppError;

/// Fields accepted at signup, already validated.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub branch: String,
    pub year: String,
    pub bio: String,
    pub interests: Vec<String>,
}

/// Partial profile update; `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub branch: Option<String>,
    pub year: Option<String>,
    pub bio: Option<String>,
    pub interests: Option<Vec<String>>,
    pub profile_photo: Option<String>,
}

pub struct UserRepository;

impl UserRepository {
    pub async fn create<'e, E: SqliteExecutor<'e>>(
        exec: E,
        new_user: NewUser,
        digest: &PasswordDigest,
    ) -> Result<User, AppError> {
        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp_millis();

        let user = sqlx::query_as::<_, User>(
            r#"
INSERT INTO users (id, name, email, password_hash, password_salt, branch, year, bio, interests, last_active, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(digest.hash.as_slice())
        .bind(digest.salt.as_slice())
        .bind(&new_user.branch)
        .bind(&new_user.year)
        .bind(&new_user.bio)
        .bind(Json(&new_user.interests))
        .bind(created_at)
        .bind(created_at)
        .fetch_one(exec)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("User with this email already exists".to_string())
            }
            other => AppError::Database(other),
        })?;

        Ok(user)
    }

    pub async fn get_by_email<'e, E: SqliteExecutor<'e>>(
        exec: E,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(exec)
            .await?;

        Ok(user)
    }

    pub async fn get_by_id<'e, E: SqliteExecutor<'e>>(
        exec: E,
        id: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(exec)
            .await?;

        Ok(user)
    }

    /// Active users other than `exclude_id`, oldest first.
    pub async fn list_active_except<'e, E: SqliteExecutor<'e>>(
        exec: E,
        exclude_id: &str,
    ) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id <> ? AND active = 1 ORDER BY created_at, rowid",
        )
        .bind(exclude_id)
        .fetch_all(exec)
        .await?;

        Ok(users)
    }

    pub async fn update_profile<'e, E: SqliteExecutor<'e>>(
        exec: E,
        id: &str,
        changes: ProfileChanges,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
UPDATE users SET
    name = COALESCE(?, name),
    email = COALESCE(?, email),
    branch = COALESCE(?, branch),
    year = COALESCE(?, year),
    bio = COALESCE(?, bio),
    interests = COALESCE(?, interests),
    profile_photo = COALESCE(?, profile_photo)
WHERE id = ?
RETURNING *
            "#,
        )
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.branch)
        .bind(changes.year)
        .bind(changes.bio)
        .bind(changes.interests.map(Json))
        .bind(changes.profile_photo)
        .bind(id)
        .fetch_optional(exec)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("User with this email already exists".to_string())
            }
            other => AppError::Database(other),
        })?;

        Ok(user)
    }

    pub async fn deactivate<'e, E: SqliteExecutor<'e>>(exec: E, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET active = 0 WHERE id = ?")
            .bind(id)
            .execute(exec)
            .await?;

        Ok(())
    }

    pub async fn touch_last_active<'e, E: SqliteExecutor<'e>>(exec: E, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_active = ? WHERE id = ?")
            .bind(chrono::Utc::now().timestamp_millis())
            .bind(id)
            .execute(exec)
            .await?;

        Ok(())
    }
}
