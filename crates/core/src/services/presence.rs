//! Presence router for real-time streaming connections.
//!
//! Tracks which streaming connections belong to which per-user channel and
//! fans events out to every live connection in a channel. A user with
//! multiple open connections (several tabs or devices) receives each event
//! once per connection. Delivery is in-process and at-most-once: events
//! published while a channel has no connections are dropped.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use pictogram_common::AppResult;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::services::event_publisher::EventPublisher;

/// Identifier of a streaming channel. Each user has one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(i64);

impl ChannelId {
    /// The private channel of a user.
    #[must_use]
    pub const fn user(user_id: i64) -> Self {
        Self(user_id)
    }

    /// The user this channel belongs to.
    #[must_use]
    pub const fn user_id(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

/// Identifier of a single streaming connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh connection ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Event types for real-time updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "camelCase")]
pub enum StreamEvent {
    /// A direct message was received.
    #[serde(rename_all = "camelCase")]
    ReceiveMessage {
        message_id: i64,
        sender_id: i64,
        sender_username: String,
        content: String,
    },
    /// Someone started following the channel's user.
    #[serde(rename_all = "camelCase")]
    Followed { follower_id: i64 },
    /// Someone stopped following the channel's user.
    #[serde(rename_all = "camelCase")]
    Unfollowed { follower_id: i64 },
}

type Rooms = HashMap<ChannelId, HashMap<ConnectionId, mpsc::UnboundedSender<StreamEvent>>>;

/// In-process connection registry and event router.
#[derive(Clone, Default)]
pub struct PresenceRouter {
    rooms: Arc<RwLock<Rooms>>,
}

impl PresenceRouter {
    /// Create an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection in a channel.
    ///
    /// Events published to the channel after this call are delivered to
    /// `tx` until the connection disconnects or drops its receiver.
    pub async fn join(
        &self,
        channel: ChannelId,
        connection: ConnectionId,
        tx: mpsc::UnboundedSender<StreamEvent>,
    ) {
        let mut rooms = self.rooms.write().await;
        rooms.entry(channel).or_default().insert(connection, tx);
        tracing::debug!(%channel, %connection, "Connection joined channel");
    }

    /// Remove a connection from every channel it joined.
    ///
    /// Channels left empty are dropped from the registry.
    pub async fn disconnect(&self, connection: ConnectionId) {
        let mut rooms = self.rooms.write().await;
        rooms.retain(|channel, members| {
            if members.remove(&connection).is_some() {
                tracing::debug!(%channel, %connection, "Connection left channel");
            }
            !members.is_empty()
        });
    }

    /// Deliver an event to every live connection in a channel.
    ///
    /// Connections whose receiver has been dropped are pruned. Returns the
    /// number of connections the event was delivered to; zero means the
    /// event was dropped.
    pub async fn publish(&self, channel: ChannelId, event: StreamEvent) -> usize {
        let mut rooms = self.rooms.write().await;
        let Some(members) = rooms.get_mut(&channel) else {
            return 0;
        };

        let mut delivered = 0;
        members.retain(|connection, tx| {
            if tx.send(event.clone()).is_ok() {
                delivered += 1;
                true
            } else {
                tracing::debug!(%channel, %connection, "Pruning dead connection");
                false
            }
        });

        if members.is_empty() {
            rooms.remove(&channel);
        }

        delivered
    }

    /// Number of live connections in a channel.
    pub async fn connection_count(&self, channel: ChannelId) -> usize {
        self.rooms
            .read()
            .await
            .get(&channel)
            .map_or(0, HashMap::len)
    }
}

#[async_trait]
impl EventPublisher for PresenceRouter {
    async fn publish_direct_message(
        &self,
        message_id: i64,
        sender_id: i64,
        sender_username: &str,
        receiver_id: i64,
        content: &str,
    ) -> AppResult<()> {
        let delivered = self
            .publish(
                ChannelId::user(receiver_id),
                StreamEvent::ReceiveMessage {
                    message_id,
                    sender_id,
                    sender_username: sender_username.to_string(),
                    content: content.to_string(),
                },
            )
            .await;
        tracing::debug!(message_id, receiver_id, delivered, "Routed direct message");
        Ok(())
    }

    async fn publish_followed(&self, follower_id: i64, followee_id: i64) -> AppResult<()> {
        self.publish(
            ChannelId::user(followee_id),
            StreamEvent::Followed { follower_id },
        )
        .await;
        Ok(())
    }

    async fn publish_unfollowed(&self, follower_id: i64, followee_id: i64) -> AppResult<()> {
        self.publish(
            ChannelId::user(followee_id),
            StreamEvent::Unfollowed { follower_id },
        )
        .await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn message_event(content: &str) -> StreamEvent {
        StreamEvent::ReceiveMessage {
            message_id: 1,
            sender_id: 2,
            sender_username: "alice".to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_publish_delivers_to_all_connections_in_channel() {
        let router = PresenceRouter::new();
        let channel = ChannelId::user(1);

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        router.join(channel, ConnectionId::new(), tx1).await;
        router.join(channel, ConnectionId::new(), tx2).await;

        let delivered = router.publish(channel, message_event("hi")).await;

        assert_eq!(delivered, 2);
        assert_eq!(rx1.recv().await.unwrap(), message_event("hi"));
        assert_eq!(rx2.recv().await.unwrap(), message_event("hi"));
    }

    #[tokio::test]
    async fn test_publish_to_empty_channel_drops_event() {
        let router = PresenceRouter::new();

        let delivered = router.publish(ChannelId::user(42), message_event("hi")).await;

        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_publish_does_not_cross_channels() {
        let router = PresenceRouter::new();

        let (tx, mut rx) = mpsc::unbounded_channel();
        router.join(ChannelId::user(1), ConnectionId::new(), tx).await;

        let delivered = router.publish(ChannelId::user(2), message_event("hi")).await;

        assert_eq!(delivered, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_disconnect_removes_connection() {
        let router = PresenceRouter::new();
        let channel = ChannelId::user(1);
        let connection = ConnectionId::new();

        let (tx, _rx) = mpsc::unbounded_channel();
        router.join(channel, connection, tx).await;
        assert_eq!(router.connection_count(channel).await, 1);

        router.disconnect(connection).await;
        assert_eq!(router.connection_count(channel).await, 0);
    }

    #[tokio::test]
    async fn test_publish_prunes_dropped_receivers() {
        let router = PresenceRouter::new();
        let channel = ChannelId::user(1);

        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        router.join(channel, ConnectionId::new(), tx1).await;
        router.join(channel, ConnectionId::new(), tx2).await;
        drop(rx1);

        let delivered = router.publish(channel, message_event("hi")).await;

        assert_eq!(delivered, 1);
        assert_eq!(router.connection_count(channel).await, 1);
        assert_eq!(rx2.recv().await.unwrap(), message_event("hi"));
    }

    #[tokio::test]
    async fn test_followed_event_routes_to_followee_channel() {
        let router = PresenceRouter::new();

        let (tx, mut rx) = mpsc::unbounded_channel();
        router.join(ChannelId::user(7), ConnectionId::new(), tx).await;

        router.publish_followed(3, 7).await.unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            StreamEvent::Followed { follower_id: 3 }
        );
    }

    #[test]
    fn test_stream_event_serializes_tagged() {
        let json = serde_json::to_value(message_event("hello")).unwrap();

        assert_eq!(json["type"], "receiveMessage");
        assert_eq!(json["body"]["senderUsername"], "alice");
        assert_eq!(json["body"]["content"], "hello");
    }
}
