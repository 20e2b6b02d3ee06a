//! Messaging endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use pictogram_common::AppResult;
use serde::{Deserialize, Serialize};

use super::users::UserResponse;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Message representation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    pub created_at: String,
}

impl From<pictogram_db::entities::message::Model> for MessageResponse {
    fn from(m: pictogram_db::entities::message::Model) -> Self {
        Self {
            id: m.id,
            sender_id: m.sender_id,
            receiver_id: m.receiver_id,
            content: m.content,
            created_at: m.created_at.to_rfc3339(),
        }
    }
}

/// Conversation summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub partner: UserResponse,
    pub last_message: Option<MessageResponse>,
}

/// List the authenticated user's conversations, with the latest message
/// of each.
async fn list_conversations(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ConversationResponse>>> {
    let summaries = state.messaging_service.get_conversations(user.id).await?;

    Ok(ApiResponse::ok(
        summaries
            .into_iter()
            .map(|s| ConversationResponse {
                partner: s.partner.into(),
                last_message: s.last_message.map(Into::into),
            })
            .collect(),
    ))
}

/// List every user a conversation can be started with.
async fn list_candidates(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let users = state
        .messaging_service
        .get_message_candidates(user.id)
        .await?;

    Ok(ApiResponse::ok(users.into_iter().map(Into::into).collect()))
}

/// Get the conversation with another user, oldest first.
async fn history(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(partner_id): Path<i64>,
) -> AppResult<ApiResponse<Vec<MessageResponse>>> {
    let messages = state
        .messaging_service
        .get_conversation(user.id, partner_id)
        .await?;

    Ok(ApiResponse::ok(
        messages.into_iter().map(Into::into).collect(),
    ))
}

/// Send message request.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Send a direct message to another user.
///
/// The message is persisted and, when the receiver has a live streaming
/// connection, delivered in real time.
async fn send(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(partner_id): Path<i64>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<ApiResponse<MessageResponse>> {
    let message = state
        .messaging_service
        .send_message(user.id, partner_id, &req.content)
        .await?;

    Ok(ApiResponse::ok(message.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_conversations))
        .route("/users", get(list_candidates))
        .route("/history/{user_id}", get(history).post(send))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_message_response_serializes_camel_case() {
        let model = pictogram_db::entities::message::Model {
            id: 1,
            sender_id: 2,
            receiver_id: 3,
            content: "hello".to_string(),
            created_at: Utc::now().into(),
        };

        let json = serde_json::to_value(MessageResponse::from(model)).unwrap();

        assert_eq!(json["senderId"], 2);
        assert_eq!(json["receiverId"], 3);
        assert_eq!(json["content"], "hello");
    }
}
