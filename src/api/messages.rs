use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::CurrentUser;
use crate::api::state::AppState;
use crate::db::{Message, MessageRepository, Relation, RelationshipRepository, User, UserRepository};
use crate::error::AppError;

const MAX_MESSAGE_LEN: usize = 4096;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub receiver_id: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub user: User,
    pub last_message: Option<Message>,
    pub unread_count: i64,
}

async fn ensure_matched(state: &AppState, user_id: &str, other_id: &str, action: &str) -> Result<(), AppError> {
    if !RelationshipRepository::contains(&state.db, Relation::Matches, user_id, other_id).await? {
        return Err(AppError::Forbidden(format!("You can only {} matched users", action)));
    }
    Ok(())
}

/// POST /api/v1/messages
pub async fn send_message(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("Message cannot be empty".to_string()));
    }
    if content.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::Validation("Message must be 1-4096 characters".to_string()));
    }

    UserRepository::get_by_id(&state.db, &req.receiver_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No user found with that ID".to_string()))?;

    ensure_matched(&state, &user_id, &req.receiver_id, "message").await?;

    let message = MessageRepository::create(&state.db, &user_id, &req.receiver_id, content).await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /api/v1/messages/conversation/:userId
///
/// The response reflects read flags as they were before this call; unread
/// messages from the other user are marked read afterwards.
pub async fn get_conversation(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(other_id): Path<String>,
) -> Result<Json<Vec<Message>>, AppError> {
    ensure_matched(&state, &user_id, &other_id, "view conversations with").await?;

    let messages = MessageRepository::conversation(&state.db, &user_id, &other_id).await?;
    MessageRepository::mark_read(&state.db, &other_id, &user_id).await?;

    Ok(Json(messages))
}

/// GET /api/v1/messages/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<Vec<ConversationSummary>>, AppError> {
    let matches = RelationshipRepository::member_users(&state.db, Relation::Matches, &user_id).await?;

    let mut conversations = Vec::with_capacity(matches.len());
    for other in matches {
        let last_message = MessageRepository::last_between(&state.db, &user_id, &other.id).await?;
        let unread_count = MessageRepository::count_unread(&state.db, &other.id, &user_id).await?;
        conversations.push(ConversationSummary {
            user: other,
            last_message,
            unread_count,
        });
    }

    // Most recent first; conversations without messages last
    conversations.sort_by(|a, b| {
        let a_at = a.last_message.as_ref().map(|m| m.created_at);
        let b_at = b.last_message.as_ref().map(|m| m.created_at);
        b_at.cmp(&a_at)
    });

    Ok(Json(conversations))
}
