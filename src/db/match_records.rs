use sqlx::types::Json;
use sqlx::{Pool, Sqlite, SqliteExecutor};
use uuid::Uuid;

use crate::db::models::{MatchRecord, MatchRecordRow, MatchStatus};
use crate::error::AppError;

const SELECT_MATCH_RECORD: &str = r#"
SELECT m.id,
       m.user1_id, a.name AS user1_name, a.profile_photo AS user1_photo,
       m.user2_id, b.name AS user2_name, b.profile_photo AS user2_photo,
       m.status, m.match_score, m.common_interests, m.last_message, m.last_message_at,
       m.created_at, m.updated_at
FROM match_records m
JOIN users a ON m.user1_id = a.id
JOIN users b ON m.user2_id = b.id
"#;

/// Order-independent key for a user pair.
pub fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}:{}", a, b)
    } else {
        format!("{}:{}", b, a)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchRecordChanges {
    pub status: Option<MatchStatus>,
    pub match_score: Option<i64>,
    pub common_interests: Option<Vec<String>>,
    pub last_message: Option<String>,
}

pub struct MatchRecordRepository;

impl MatchRecordRepository {
    pub async fn create(pool: &Pool<Sqlite>, user1_id: &str, user2_id: &str) -> Result<MatchRecord, AppError> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().timestamp_millis();

        sqlx::query(
            r#"
INSERT INTO match_records (id, user1_id, user2_id, pair_key, status, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user1_id)
        .bind(user2_id)
        .bind(pair_key(user1_id, user2_id))
        .bind(MatchStatus::Pending)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("A match between these users already exists".to_string())
            }
            other => AppError::Database(other),
        })?;

        Self::get_by_id(pool, &id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch created match".to_string()))
    }

    pub async fn get_by_id<'e, E: SqliteExecutor<'e>>(
        exec: E,
        id: &str,
    ) -> Result<Option<MatchRecord>, AppError> {
        let sql = format!("{SELECT_MATCH_RECORD} WHERE m.id = ?");

        let row = sqlx::query_as::<_, MatchRecordRow>(&sql)
            .bind(id)
            .fetch_optional(exec)
            .await?;

        Ok(row.map(MatchRecord::from))
    }

    pub async fn list_all<'e, E: SqliteExecutor<'e>>(exec: E) -> Result<Vec<MatchRecord>, AppError> {
        let sql = format!("{SELECT_MATCH_RECORD} ORDER BY m.created_at, m.rowid");

        let rows = sqlx::query_as::<_, MatchRecordRow>(&sql).fetch_all(exec).await?;

        Ok(rows.into_iter().map(MatchRecord::from).collect())
    }

    pub async fn list_for_user<'e, E: SqliteExecutor<'e>>(
        exec: E,
        user_id: &str,
        status: MatchStatus,
    ) -> Result<Vec<MatchRecord>, AppError> {
        let sql = format!(
            "{SELECT_MATCH_RECORD} WHERE (m.user1_id = ?1 OR m.user2_id = ?1) AND m.status = ?2 \
             ORDER BY m.created_at, m.rowid"
        );

        let rows = sqlx::query_as::<_, MatchRecordRow>(&sql)
            .bind(user_id)
            .bind(status)
            .fetch_all(exec)
            .await?;

        Ok(rows.into_iter().map(MatchRecord::from).collect())
    }

    pub async fn update(
        pool: &Pool<Sqlite>,
        id: &str,
        changes: MatchRecordChanges,
    ) -> Result<Option<MatchRecord>, AppError> {
        let now = chrono::Utc::now().timestamp_millis();
        let last_message_at = changes.last_message.as_ref().map(|_| now);

        let result = sqlx::query(
            r#"
UPDATE match_records SET
    status = COALESCE(?, status),
    match_score = COALESCE(?, match_score),
    common_interests = COALESCE(?, common_interests),
    last_message = COALESCE(?, last_message),
    last_message_at = COALESCE(?, last_message_at),
    updated_at = ?
WHERE id = ?
            "#,
        )
        .bind(changes.status)
        .bind(changes.match_score)
        .bind(changes.common_interests.map(Json))
        .bind(changes.last_message)
        .bind(last_message_at)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::get_by_id(pool, id).await
    }

    /// Returns `false` when no record had that id.
    pub async fn delete<'e, E: SqliteExecutor<'e>>(exec: E, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM match_records WHERE id = ?")
            .bind(id)
            .execute(exec)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_order_independent() {
        assert_eq!(pair_key("alice", "bob"), pair_key("bob", "alice"));
        assert_eq!(pair_key("alice", "bob"), "alice:bob");
    }
}
