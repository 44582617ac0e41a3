use sqlx::SqliteExecutor;

use crate::db::models::User;
use crate::error::AppError;

/// One of the three per-user relationship sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Likes,
    Dislikes,
    Matches,
}

impl Relation {
    fn table(self) -> &'static str {
        match self {
            Relation::Likes => "user_likes",
            Relation::Dislikes => "user_dislikes",
            Relation::Matches => "user_matches",
        }
    }
}

/// Set-valued storage for likes, dislikes and matches.
///
/// Every write is an `INSERT OR IGNORE`, so adding an existing member is a
/// no-op and membership never duplicates. Nothing here removes members.
pub struct RelationshipRepository;

impl RelationshipRepository {
    /// Adds `other_id` to `user_id`'s set. Returns `false` if it was already there.
    pub async fn add<'e, E: SqliteExecutor<'e>>(
        exec: E,
        relation: Relation,
        user_id: &str,
        other_id: &str,
    ) -> Result<bool, AppError> {
        let sql = format!(
            "INSERT OR IGNORE INTO {} (user_id, other_id, created_at) VALUES (?, ?, ?)",
            relation.table()
        );

        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(other_id)
            .bind(chrono::Utc::now().timestamp_millis())
            .execute(exec)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn contains<'e, E: SqliteExecutor<'e>>(
        exec: E,
        relation: Relation,
        user_id: &str,
        other_id: &str,
    ) -> Result<bool, AppError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE user_id = ? AND other_id = ?)",
            relation.table()
        );

        let exists = sqlx::query_scalar::<_, bool>(&sql)
            .bind(user_id)
            .bind(other_id)
            .fetch_one(exec)
            .await?;

        Ok(exists)
    }

    /// Member ids in insertion order.
    pub async fn members<'e, E: SqliteExecutor<'e>>(
        exec: E,
        relation: Relation,
        user_id: &str,
    ) -> Result<Vec<String>, AppError> {
        let sql = format!(
            "SELECT other_id FROM {} WHERE user_id = ? ORDER BY created_at, rowid",
            relation.table()
        );

        let ids = sqlx::query_scalar::<_, String>(&sql)
            .bind(user_id)
            .fetch_all(exec)
            .await?;

        Ok(ids)
    }

    /// Members resolved to user rows.
    pub async fn member_users<'e, E: SqliteExecutor<'e>>(
        exec: E,
        relation: Relation,
        user_id: &str,
    ) -> Result<Vec<User>, AppError> {
        let sql = format!(
            r#"
SELECT u.* FROM {} r
JOIN users u ON u.id = r.other_id
WHERE r.user_id = ?
ORDER BY r.created_at, r.rowid
            "#,
            relation.table()
        );

        let users = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_all(exec)
            .await?;

        Ok(users)
    }
}
