use sqlx::{Pool, Sqlite, SqliteExecutor};
use uuid::Uuid;

use crate::db::models::Message;
use crate::error::AppError;

const SELECT_MESSAGE: &str = r#"
SELECT m.id, m.sender_id, s.name AS sender_name, m.receiver_id, r.name AS receiver_name,
       m.content, m.read, m.created_at
FROM messages m
JOIN users s ON m.sender_id = s.id
JOIN users r ON m.receiver_id = r.id
"#;

pub struct MessageRepository;

impl MessageRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
    ) -> Result<Message, AppError> {
        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp_millis();

        sqlx::query(
            r#"
INSERT INTO messages (id, sender_id, receiver_id, content, read, created_at)
VALUES (?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&id)
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content)
        .bind(created_at)
        .execute(pool)
        .await?;

        // Fetch with names joined
        let message = Self::get_by_id(pool, &id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch created message".to_string()))?;

        Ok(message)
    }

    pub async fn get_by_id<'e, E: SqliteExecutor<'e>>(
        exec: E,
        id: &str,
    ) -> Result<Option<Message>, AppError> {
        let sql = format!("{SELECT_MESSAGE} WHERE m.id = ?");

        let message = sqlx::query_as::<_, Message>(&sql)
            .bind(id)
            .fetch_optional(exec)
            .await?;

        Ok(message)
    }

    /// Both directions between two users, oldest first.
    pub async fn conversation<'e, E: SqliteExecutor<'e>>(
        exec: E,
        user_a: &str,
        user_b: &str,
    ) -> Result<Vec<Message>, AppError> {
        let sql = format!(
            r#"
{SELECT_MESSAGE}
WHERE (m.sender_id = ?1 AND m.receiver_id = ?2)
   OR (m.sender_id = ?2 AND m.receiver_id = ?1)
ORDER BY m.created_at ASC, m.rowid ASC
            "#
        );

        let messages = sqlx::query_as::<_, Message>(&sql)
            .bind(user_a)
            .bind(user_b)
            .fetch_all(exec)
            .await?;

        Ok(messages)
    }

    pub async fn last_between<'e, E: SqliteExecutor<'e>>(
        exec: E,
        user_a: &str,
        user_b: &str,
    ) -> Result<Option<Message>, AppError> {
        let sql = format!(
            r#"
{SELECT_MESSAGE}
WHERE (m.sender_id = ?1 AND m.receiver_id = ?2)
   OR (m.sender_id = ?2 AND m.receiver_id = ?1)
ORDER BY m.created_at DESC, m.rowid DESC
LIMIT 1
            "#
        );

        let message = sqlx::query_as::<_, Message>(&sql)
            .bind(user_a)
            .bind(user_b)
            .fetch_optional(exec)
            .await?;

        Ok(message)
    }

    pub async fn count_unread<'e, E: SqliteExecutor<'e>>(
        exec: E,
        sender_id: &str,
        receiver_id: &str,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages WHERE sender_id = ? AND receiver_id = ? AND read = 0",
        )
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_one(exec)
        .await?;

        Ok(count)
    }

    /// Flags every unread message from `sender_id` to `receiver_id` as read.
    pub async fn mark_read<'e, E: SqliteExecutor<'e>>(
        exec: E,
        sender_id: &str,
        receiver_id: &str,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE messages SET read = 1 WHERE sender_id = ? AND receiver_id = ? AND read = 0",
        )
        .bind(sender_id)
        .bind(receiver_id)
        .execute(exec)
        .await?;

        Ok(result.rows_affected())
    }
}
