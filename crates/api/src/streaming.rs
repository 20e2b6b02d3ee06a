//! WebSocket streaming API.
//!
//! A connection authenticates with its `i` query parameter, then sends a
//! `join` frame to bind itself to the user's own channel. Direct messages
//! sent while the connection is joined arrive as `receiveMessage` frames.

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use pictogram_core::{ChannelId, ConnectionId, StreamEvent};
use pictogram_db::entities::user;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::middleware::AppState;

/// Streaming query parameters.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Access token for authentication.
    #[serde(rename = "i")]
    pub token: Option<String>,
}

/// Client-to-server message.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Bind this connection to the authenticated user's channel.
    Join,
    /// Send a direct message.
    #[serde(rename_all = "camelCase")]
    SendMessage { receiver_id: i64, message: String },
}

/// Server-to-client message.
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "body", rename_all = "camelCase")]
pub enum ServerMessage {
    /// The join was accepted.
    Connected,
    /// A direct message arrived.
    ReceiveMessage { message: String, sender: String },
    /// Someone started following.
    #[serde(rename_all = "camelCase")]
    Followed { user_id: i64 },
    /// Someone stopped following.
    #[serde(rename_all = "camelCase")]
    Unfollowed { user_id: i64 },
    /// An operation failed.
    Error { code: String, message: String },
}

impl From<StreamEvent> for ServerMessage {
    fn from(event: StreamEvent) -> Self {
        match event {
            StreamEvent::ReceiveMessage {
                sender_username,
                content,
                ..
            } => Self::ReceiveMessage {
                message: content,
                sender: sender_username,
            },
            StreamEvent::Followed { follower_id } => Self::Followed {
                user_id: follower_id,
            },
            StreamEvent::Unfollowed { follower_id } => Self::Unfollowed {
                user_id: follower_id,
            },
        }
    }
}

/// WebSocket handler for streaming.
pub async fn streaming_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<StreamQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, query, state))
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, query: StreamQuery, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Streaming requires an authenticated identity
    let user = match &query.token {
        Some(token) => match state.user_service.authenticate_by_token(token).await {
            Ok(u) => u,
            Err(e) => {
                warn!(error = %e, "Streaming auth failed");
                let _ = send_message(&mut sender, &error_frame("UNAUTHORIZED", "Invalid token")).await;
                return;
            }
        },
        None => {
            let _ = send_message(&mut sender, &error_frame("UNAUTHORIZED", "Token required")).await;
            return;
        }
    };

    let connection = ConnectionId::new();
    info!(user_id = user.id, %connection, "Streaming connection established");

    let (tx, mut rx) = mpsc::unbounded_channel::<StreamEvent>();

    loop {
        tokio::select! {
            // Incoming frames from the client
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                if let Some(response) =
                                    handle_client_message(client_msg, &user, connection, tx.clone(), &state).await
                                    && send_message(&mut sender, &response).await.is_err()
                                {
                                    break;
                                }
                            }
                            Err(e) => {
                                debug!(error = %e, "Failed to parse client message");
                                let frame = error_frame("BAD_REQUEST", "Malformed message");
                                if send_message(&mut sender, &frame).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            // Events routed to this connection
            Some(event) = rx.recv() => {
                if send_message(&mut sender, &ServerMessage::from(event)).await.is_err() {
                    break;
                }
            }
        }
    }

    // Tear down every channel membership for this connection
    state.presence.disconnect(connection).await;
    info!(user_id = user.id, %connection, "Streaming connection closed");
}

/// Handle a client message, returning a frame to send back if any.
async fn handle_client_message(
    msg: ClientMessage,
    user: &user::Model,
    connection: ConnectionId,
    tx: mpsc::UnboundedSender<StreamEvent>,
    state: &AppState,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Join => {
            state
                .presence
                .join(ChannelId::user(user.id), connection, tx)
                .await;
            debug!(user_id = user.id, %connection, "Joined user channel");
            Some(ServerMessage::Connected)
        }
        ClientMessage::SendMessage {
            receiver_id,
            message,
        } => match state
            .messaging_service
            .send_message(user.id, receiver_id, &message)
            .await
        {
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, user_id = user.id, "Failed to send message over streaming");
                Some(ServerMessage::Error {
                    code: e.error_code().to_string(),
                    message: e.to_string(),
                })
            }
        },
    }
}

fn error_frame(code: &str, message: &str) -> ServerMessage {
    ServerMessage::Error {
        code: code.to_string(),
        message: message.to_string(),
    }
}

async fn send_message<S>(sender: &mut S, msg: &ServerMessage) -> Result<(), ()>
where
    S: SinkExt<Message> + Unpin,
{
    let json = serde_json::to_string(msg).unwrap_or_default();
    sender.send(Message::Text(json.into())).await.map_err(|_| ())
}
