//! Messaging service for direct messages.

use crate::services::event_publisher::EventPublisherService;
use pictogram_common::{AppError, AppResult};
use pictogram_db::{
    entities::{message, user},
    repositories::{MessageRepository, UserRepository},
};
use sea_orm::{NotSet, Set};

/// Maximum message length in characters.
const MAX_MESSAGE_LENGTH: usize = 500;

/// Conversation summary for listing.
pub struct ConversationSummary {
    pub partner: user::Model,
    pub last_message: Option<message::Model>,
}

/// Messaging service.
#[derive(Clone)]
pub struct MessagingService {
    message_repo: MessageRepository,
    user_repo: UserRepository,
    event_publisher: Option<EventPublisherService>,
}

impl MessagingService {
    /// Create a new messaging service.
    #[must_use]
    pub const fn new(message_repo: MessageRepository, user_repo: UserRepository) -> Self {
        Self {
            message_repo,
            user_repo,
            event_publisher: None,
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Send a direct message.
    ///
    /// The message is persisted before any real-time delivery is attempted,
    /// so a receiver without a live connection still sees it in the
    /// conversation history. A routing failure is logged but never fails
    /// the send.
    pub async fn send_message(
        &self,
        sender_id: i64,
        receiver_id: i64,
        content: &str,
    ) -> AppResult<message::Model> {
        if content.trim().is_empty() {
            return Err(AppError::Validation(
                "Message content cannot be empty".to_string(),
            ));
        }
        if content.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(AppError::Validation(format!(
                "Message content exceeds {MAX_MESSAGE_LENGTH} characters"
            )));
        }

        // Receiver must exist before anything is persisted
        self.user_repo
            .find_by_id(receiver_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(receiver_id.to_string()))?;

        let sender = self.user_repo.get_by_id(sender_id).await?;

        let model = message::ActiveModel {
            id: NotSet,
            sender_id: Set(sender_id),
            receiver_id: Set(receiver_id),
            content: Set(content.to_string()),
            created_at: NotSet,
        };

        let message = self.message_repo.create(model).await?;

        if let Some(ref event_publisher) = self.event_publisher
            && let Err(e) = event_publisher
                .publish_direct_message(
                    message.id,
                    sender_id,
                    &sender.username,
                    receiver_id,
                    &message.content,
                )
                .await
        {
            tracing::warn!(error = %e, message_id = message.id, "Failed to publish direct message event");
        }

        Ok(message)
    }

    /// Get the full conversation with another user, oldest first.
    ///
    /// Both participants see the same sequence.
    pub async fn get_conversation(
        &self,
        user_id: i64,
        partner_id: i64,
    ) -> AppResult<Vec<message::Model>> {
        self.user_repo.get_by_id(partner_id).await?;
        self.message_repo.find_conversation(user_id, partner_id).await
    }

    /// Get conversation summaries (users with message history, plus the
    /// latest message of each conversation).
    pub async fn get_conversations(&self, user_id: i64) -> AppResult<Vec<ConversationSummary>> {
        let partner_ids = self.message_repo.find_conversation_partners(user_id).await?;

        let mut summaries = Vec::new();
        for partner_id in partner_ids {
            if let Some(partner) = self.user_repo.find_by_id(partner_id).await? {
                let last_message = self
                    .message_repo
                    .find_latest_in_conversation(user_id, partner_id)
                    .await?;
                summaries.push(ConversationSummary {
                    partner,
                    last_message,
                });
            }
        }

        Ok(summaries)
    }

    /// Get every user a conversation could be started with (all users
    /// other than the current one).
    pub async fn get_message_candidates(&self, user_id: i64) -> AppResult<Vec<user::Model>> {
        self.user_repo.find_all_except(user_id).await
    }
}
