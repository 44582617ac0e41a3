use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::db::models::Session;
use crate::error::AppError;

const MILLIS_PER_HOUR: i64 = 3_600_000;

pub struct SessionRepository;

impl SessionRepository {
    pub async fn create<'e, E: SqliteExecutor<'e>>(
        exec: E,
        user_id: &str,
        expiry_hours: i64,
    ) -> Result<Session, AppError> {
        let created_at = chrono::Utc::now().timestamp_millis();

        let session = sqlx::query_as::<_, Session>(
            r#"
INSERT INTO sessions (id, user_id, token, expires_at, created_at)
VALUES (?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(Uuid::new_v4().simple().to_string())
        .bind(created_at + expiry_hours * MILLIS_PER_HOUR)
        .bind(created_at)
        .fetch_one(exec)
        .await?;

        Ok(session)
    }

    /// Unexpired session for `token` whose account is still active. A
    /// deactivated account's sessions stop resolving without being deleted.
    pub async fn get_active<'e, E: SqliteExecutor<'e>>(
        exec: E,
        token: &str,
    ) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
SELECT s.* FROM sessions s
JOIN users u ON u.id = s.user_id
WHERE s.token = ? AND s.expires_at > ? AND u.active = 1
            "#,
        )
        .bind(token)
        .bind(chrono::Utc::now().timestamp_millis())
        .fetch_optional(exec)
        .await?;

        Ok(session)
    }

    pub async fn delete<'e, E: SqliteExecutor<'e>>(exec: E, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(exec)
            .await?;

        Ok(())
    }

    /// Ends every session of `user_id`; returns how many there were.
    pub async fn delete_for_user<'e, E: SqliteExecutor<'e>>(exec: E, user_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(exec)
            .await?;

        Ok(result.rows_affected())
    }

    /// Returns how many sessions were removed.
    pub async fn cleanup_expired<'e, E: SqliteExecutor<'e>>(exec: E) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(chrono::Utc::now().timestamp_millis())
            .execute(exec)
            .await?;

        Ok(result.rows_affected())
    }
}
