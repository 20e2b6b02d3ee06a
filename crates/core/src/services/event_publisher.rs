//! Event publisher service.
//!
//! Provides an abstraction for publishing real-time events.
//! The in-process implementation is [`crate::services::presence::PresenceRouter`].

use async_trait::async_trait;
use pictogram_common::AppResult;
use std::sync::Arc;

/// Trait for publishing real-time events.
///
/// This allows the core services to publish events
/// without directly depending on the routing implementation.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a direct message event to the receiver.
    async fn publish_direct_message(
        &self,
        message_id: i64,
        sender_id: i64,
        sender_username: &str,
        receiver_id: i64,
        content: &str,
    ) -> AppResult<()>;

    /// Publish a followed event to the followee.
    async fn publish_followed(&self, follower_id: i64, followee_id: i64) -> AppResult<()>;

    /// Publish an unfollowed event to the followee.
    async fn publish_unfollowed(&self, follower_id: i64, followee_id: i64) -> AppResult<()>;
}

/// A no-op implementation of `EventPublisher` for testing or when real-time events are disabled.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish_direct_message(
        &self,
        _message_id: i64,
        _sender_id: i64,
        _sender_username: &str,
        _receiver_id: i64,
        _content: &str,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn publish_followed(&self, _follower_id: i64, _followee_id: i64) -> AppResult<()> {
        Ok(())
    }

    async fn publish_unfollowed(&self, _follower_id: i64, _followee_id: i64) -> AppResult<()> {
        Ok(())
    }
}

/// Wrapper for boxed `EventPublisher` trait object.
pub type EventPublisherService = Arc<dyn EventPublisher>;
