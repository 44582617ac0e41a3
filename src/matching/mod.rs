//! Mutual-match reconciliation.
//!
//! A like is a directed edge stored in the liker's `likes` set. When the
//! target already likes the actor, both users are added to each other's
//! `matches` set. Sets only grow: there is no unlike or unmatch.

pub mod locks;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use sqlx::{Pool, Sqlite, SqliteConnection};

use crate::db::{Relation, RelationshipRepository, User, UserRepository};
use crate::error::AppError;

pub use locks::PairLocks;

/// How the writes of a single `like` reach the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchWriteMode {
    /// All writes commit together or not at all.
    #[default]
    Transactional,
    /// Each write autocommits on its own. A failure between the two match
    /// writes leaves the match recorded on one side only.
    Sequential,
}

impl FromStr for MatchWriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "transactional" => Ok(MatchWriteMode::Transactional),
            "sequential" => Ok(MatchWriteMode::Sequential),
            other => Err(format!(
                "unknown match write mode '{}' (expected transactional or sequential)",
                other
            )),
        }
    }
}

impl fmt::Display for MatchWriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchWriteMode::Transactional => f.write_str("transactional"),
            MatchWriteMode::Sequential => f.write_str("sequential"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
    pub is_match: bool,
    pub user: User,
}

#[derive(Clone)]
pub struct Matchmaker {
    pool: Pool<Sqlite>,
    locks: PairLocks,
    mode: MatchWriteMode,
}

impl Matchmaker {
    pub fn new(pool: Pool<Sqlite>, mode: MatchWriteMode) -> Self {
        Self {
            pool,
            locks: PairLocks::new(),
            mode,
        }
    }

    pub fn locks(&self) -> &PairLocks {
        &self.locks
    }

    /// Records that `actor_id` likes `target_id` and reports whether this
    /// completed a mutual match.
    pub async fn like(&self, actor_id: &str, target_id: &str) -> Result<LikeOutcome, AppError> {
        if actor_id == target_id {
            return Err(AppError::Validation("You cannot like yourself".to_string()));
        }

        let _pair = self.locks.acquire(actor_id, target_id).await;

        let outcome = match self.mode {
            MatchWriteMode::Transactional => {
                // Take the write lock up front so a busy database waits
                // out the busy timeout instead of failing the upgrade.
                let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
                let outcome = apply_like(&mut *tx, actor_id, target_id).await?;
                tx.commit().await?;
                outcome
            }
            MatchWriteMode::Sequential => {
                let mut conn = self.pool.acquire().await?;
                apply_like(&mut *conn, actor_id, target_id).await?
            }
        };

        if outcome.is_match {
            tracing::debug!("💘 {} and {} matched", actor_id, target_id);
        } else {
            tracing::debug!("👍 {} liked {}", actor_id, target_id);
        }

        Ok(outcome)
    }

    /// Adds `target_id` to the actor's dislikes. Likes and matches are untouched.
    pub async fn dislike(&self, actor_id: &str, target_id: &str) -> Result<(), AppError> {
        if actor_id == target_id {
            return Err(AppError::Validation("You cannot dislike yourself".to_string()));
        }

        let _pair = self.locks.acquire(actor_id, target_id).await;

        UserRepository::get_by_id(&self.pool, target_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No user found with that ID".to_string()))?;

        RelationshipRepository::add(&self.pool, Relation::Dislikes, actor_id, target_id).await?;
        tracing::debug!("👎 {} passed on {}", actor_id, target_id);

        Ok(())
    }
}

async fn apply_like(
    conn: &mut SqliteConnection,
    actor_id: &str,
    target_id: &str,
) -> Result<LikeOutcome, AppError> {
    let target = UserRepository::get_by_id(&mut *conn, target_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No user found with that ID".to_string()))?;

    if RelationshipRepository::contains(&mut *conn, Relation::Likes, actor_id, target_id).await? {
        return Err(AppError::Conflict("You have already liked this user".to_string()));
    }

    RelationshipRepository::add(&mut *conn, Relation::Likes, actor_id, target_id).await?;

    let is_match =
        RelationshipRepository::contains(&mut *conn, Relation::Likes, target_id, actor_id).await?;

    if is_match {
        RelationshipRepository::add(&mut *conn, Relation::Matches, actor_id, target_id).await?;
        RelationshipRepository::add(&mut *conn, Relation::Matches, target_id, actor_id).await?;
    }

    Ok(LikeOutcome {
        is_match,
        user: target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_write_mode() {
        assert_eq!("transactional".parse::<MatchWriteMode>(), Ok(MatchWriteMode::Transactional));
        assert_eq!("Sequential".parse::<MatchWriteMode>(), Ok(MatchWriteMode::Sequential));
        assert!("eventual".parse::<MatchWriteMode>().is_err());
    }

    #[test]
    fn test_write_mode_display_round_trips() {
        for mode in [MatchWriteMode::Transactional, MatchWriteMode::Sequential] {
            assert_eq!(mode.to_string().parse::<MatchWriteMode>(), Ok(mode));
        }
    }
}
