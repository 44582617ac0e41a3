use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

pub const YEARS: [&str; 7] = ["1st", "2nd", "3rd", "4th", "5th", "Masters", "PhD"];

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: Vec<u8>,
    #[serde(skip_serializing, default)]
    pub password_salt: Vec<u8>,
    pub branch: String,
    pub year: String,
    pub bio: String,
    pub profile_photo: String,
    pub interests: Json<Vec<String>>,
    #[serde(skip_serializing, default)]
    pub active: bool,
    pub last_active: i64,
    pub created_at: i64,
}

/// A user together with its relationship sets.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
    pub matches: Vec<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String, // Joined from users table
    pub receiver_id: String,
    pub receiver_name: String, // Joined from users table
    pub content: String,
    pub read: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Matched,
    Rejected,
    Expired,
}

/// Display fields of a user referenced from another record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub profile_photo: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: String,
    pub user1: Participant,
    pub user2: Participant,
    pub status: MatchStatus,
    pub match_score: Option<i64>,
    pub common_interests: Vec<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl MatchRecord {
    pub fn involves(&self, user_id: &str) -> bool {
        self.user1.id == user_id || self.user2.id == user_id
    }
}

/// Flat row behind [`MatchRecord`], with both users joined in.
#[derive(Debug, FromRow)]
pub(crate) struct MatchRecordRow {
    pub id: String,
    pub user1_id: String,
    pub user1_name: String,
    pub user1_photo: String,
    pub user2_id: String,
    pub user2_name: String,
    pub user2_photo: String,
    pub status: MatchStatus,
    pub match_score: Option<i64>,
    pub common_interests: Json<Vec<String>>,
    pub last_message: Option<String>,
    pub last_message_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<MatchRecordRow> for MatchRecord {
    fn from(row: MatchRecordRow) -> Self {
        MatchRecord {
            id: row.id,
            user1: Participant {
                id: row.user1_id,
                name: row.user1_name,
                profile_photo: row.user1_photo,
            },
            user2: Participant {
                id: row.user2_id,
                name: row.user2_name,
                profile_photo: row.user2_photo,
            },
            status: row.status,
            match_score: row.match_score,
            common_interests: row.common_interests.0,
            last_message: row.last_message,
            last_message_at: row.last_message_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A mentor's profile with the owning user's display fields joined in.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorProfile {
    pub user_id: String,
    pub name: String,
    pub profile_photo: String,
    pub bio: String,
    pub current_company: String,
    pub current_position: String,
    pub years_of_experience: String,
    pub industry: String,
    pub university: String,
    pub degree: String,
    pub graduation_year: String,
    pub mentorship_areas: Json<Vec<String>>,
    pub availability: String,
    pub max_mentees: i64,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub is_mentor_active: bool,
    pub completed_sessions: i64,
    pub rating: f64,
    pub profile_views: i64,
    pub mentee_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
}

/// A mentorship request seen from the mentor's side.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorshipRequest {
    pub student_id: String,
    pub student_name: String,
    pub student_photo: String,
    pub branch: String,
    pub year: String,
    pub status: RequestStatus,
    pub requested_at: i64,
    pub accepted_at: Option<i64>,
}
