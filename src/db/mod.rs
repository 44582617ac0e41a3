pub mod match_records;
pub mod mentors;
pub mod messages;
pub mod models;
pub mod relationships;
pub mod sessions;
pub mod users;

use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::config::Config;
use crate::error::AppError;

pub use match_records::{MatchRecordChanges, MatchRecordRepository};
pub use mentors::{MentorChanges, MentorFilter, MentorRepository, NewMentorProfile};
pub use messages::MessageRepository;
pub use models::{
    MatchRecord, MatchStatus, MentorProfile, MentorshipRequest, Message, Participant, RequestStatus, Session,
    User, UserProfile,
};
pub use relationships::{Relation, RelationshipRepository};
pub use sessions::SessionRepository;
pub use users::{NewUser, ProfileChanges, UserRepository};

/// Opens the SQLite pool described by `config`.
pub async fn connect(config: &Config) -> Result<Pool<Sqlite>, AppError> {
    let options: SqliteConnectOptions = config
        .database_url
        .parse::<SqliteConnectOptions>()?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Loads a user with its likes, dislikes and matches.
pub async fn load_profile(pool: &Pool<Sqlite>, user_id: &str) -> Result<Option<UserProfile>, AppError> {
    let Some(user) = UserRepository::get_by_id(pool, user_id).await? else {
        return Ok(None);
    };

    Ok(Some(UserProfile {
        likes: RelationshipRepository::members(pool, Relation::Likes, user_id).await?,
        dislikes: RelationshipRepository::members(pool, Relation::Dislikes, user_id).await?,
        matches: RelationshipRepository::members(pool, Relation::Matches, user_id).await?,
        user,
    }))
}
