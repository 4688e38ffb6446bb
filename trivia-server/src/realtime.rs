//! The realtime gateway. Clients connect over a websocket and receive
//! session, invitation and friend events as `{ "event": ..., "data": ... }` frames.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query,
    },
    response::Response,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use trivia_collab::{realtime::ConnectionHandle, CollabEvent, PrimaryKey, UserData};
use utoipa::IntoParams;

use crate::{
    errors::ServerError,
    serialized::{Invitation, Score, ToSerialized},
    Router, ServerContext,
};

/// Events a client may send over the socket
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Binds the connection to a user so direct events reach it
    Identify { token: String },
    #[serde(rename_all = "camelCase")]
    JoinSession {
        session_id: String,
        user_id: PrimaryKey,
    },
    #[serde(rename_all = "camelCase")]
    StartGame { session_id: String },
    #[serde(rename_all = "camelCase")]
    UpdateScore {
        session_id: String,
        player_name: String,
        player_score: i64,
    },
    #[serde(rename_all = "camelCase")]
    EndGame { session_id: String },
}

/// Events pushed to the client
#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// The connection is now bound to this user
    #[serde(rename_all = "camelCase")]
    Identified { user_id: PrimaryKey },
    #[serde(rename_all = "camelCase")]
    PlayerJoined {
        session_id: String,
        user_id: PrimaryKey,
        participants: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    ScoreUpdated {
        session_id: String,
        player_name: String,
        score: i64,
        scores: Vec<Score>,
    },
    #[serde(rename_all = "camelCase")]
    GameStarted { session_id: String },
    #[serde(rename_all = "camelCase")]
    GameEnded {
        session_id: String,
        scores: Vec<Score>,
    },
    GameInvitation(Invitation),
    #[serde(rename_all = "camelCase")]
    InvitationAccepted {
        invitation_id: PrimaryKey,
        session_id: String,
        recipient_id: PrimaryKey,
        recipient_username: String,
    },
    #[serde(rename_all = "camelCase")]
    InvitationDeclined {
        invitation_id: PrimaryKey,
        recipient_id: PrimaryKey,
        recipient_username: String,
    },
    #[serde(rename_all = "camelCase")]
    FriendRequest {
        request_id: PrimaryKey,
        from_id: PrimaryKey,
        from_username: String,
    },
    Error { message: String },
}

impl ServerEvent {
    fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

impl From<CollabEvent> for ServerEvent {
    fn from(value: CollabEvent) -> Self {
        match value {
            CollabEvent::PlayerJoined {
                session_code,
                user_id,
                participants,
            } => Self::PlayerJoined {
                session_id: session_code,
                user_id,
                participants,
            },
            CollabEvent::ScoreUpdated {
                session_code,
                player_name,
                score,
                scores,
            } => Self::ScoreUpdated {
                session_id: session_code,
                player_name,
                score,
                scores: scores.to_serialized(),
            },
            CollabEvent::GameStarted { session_code } => Self::GameStarted {
                session_id: session_code,
            },
            CollabEvent::GameEnded {
                session_code,
                scores,
            } => Self::GameEnded {
                session_id: session_code,
                scores: scores.to_serialized(),
            },
            CollabEvent::GameInvitation { invitation } => {
                Self::GameInvitation(invitation.to_serialized())
            }
            CollabEvent::InvitationAccepted {
                invitation_id,
                session_code,
                recipient_id,
                recipient_username,
            } => Self::InvitationAccepted {
                invitation_id,
                session_id: session_code,
                recipient_id,
                recipient_username,
            },
            CollabEvent::InvitationDeclined {
                invitation_id,
                recipient_id,
                recipient_username,
            } => Self::InvitationDeclined {
                invitation_id,
                recipient_id,
                recipient_username,
            },
            CollabEvent::FriendRequest {
                request_id,
                from_id,
                from_username,
            } => Self::FriendRequest {
                request_id,
                from_id,
                from_username,
            },
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SocketQuery {
    /// Identifies the connection right away, same as sending `identify`
    token: Option<String>,
}

/// The server side of one socket connection
struct Gateway {
    context: ServerContext,
    handle: ConnectionHandle,
    user: Option<UserData>,
    /// Replies that only concern this connection
    replies: UnboundedSender<ServerEvent>,
}

impl Gateway {
    fn reply(&self, event: ServerEvent) {
        let _ = self.replies.send(event);
    }

    async fn identify(&mut self, token: &str) {
        let user = match self.context.collab.auth.authorize(token).await {
            Ok(user) => user,
            Err(err) => {
                self.reply(ServerEvent::error(ServerError::from(err).to_string()));
                return;
            }
        };

        if let Some(previous) = self.user.take() {
            self.context
                .collab
                .context
                .channels
                .forget(previous.id, self.handle.id);
        }

        self.context
            .collab
            .context
            .channels
            .identify(user.id, self.handle.clone());

        debug!("Connection {} identified as {}", self.handle.id, user.username);
        self.reply(ServerEvent::Identified { user_id: user.id });
        self.user = Some(user);
    }

    async fn handle_text(&mut self, text: &str) {
        let event = match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => event,
            Err(err) => {
                self.reply(ServerEvent::error(format!("Invalid event: {}", err)));
                return;
            }
        };

        let collab = self.context.collab.clone();

        let result = match event {
            ClientEvent::Identify { token } => {
                self.identify(&token).await;
                return;
            }
            ClientEvent::JoinSession {
                session_id,
                user_id,
            } => match collab.sessions.session(&session_id).await {
                Ok(_) => {
                    collab
                        .context
                        .session_channels
                        .subscribe(&session_id, self.handle.clone());

                    collab.sessions.join_session(&session_id, user_id).await
                }
                Err(err) => Err(err),
            },
            ClientEvent::StartGame { session_id } => {
                collab.sessions.start_session(&session_id).await
            }
            ClientEvent::UpdateScore {
                session_id,
                player_name,
                player_score,
            } => {
                collab
                    .sessions
                    .update_score(&session_id, &player_name, player_score)
                    .await
            }
            ClientEvent::EndGame { session_id } => collab.sessions.end_session(&session_id).await,
        };

        if let Err(err) = result {
            self.reply(ServerEvent::error(ServerError::from(err).to_string()));
        }
    }

    fn close(self) {
        let context = &self.context.collab.context;

        if let Some(user) = &self.user {
            context.channels.forget(user.id, self.handle.id);
        }

        context.session_channels.unsubscribe_all(self.handle.id);
    }
}

#[utoipa::path(
    get,
    path = "/socket",
    tag = "realtime",
    params(SocketQuery),
    responses(
        (status = 101, description = "Upgrades to a websocket carrying realtime events")
    )
)]
async fn socket(
    context: ServerContext,
    Query(query): Query<SocketQuery>,
    upgrade: WebSocketUpgrade,
) -> Response {
    upgrade.on_upgrade(move |socket| handle_socket(socket, context, query.token))
}

async fn handle_socket(socket: WebSocket, context: ServerContext, token: Option<String>) {
    let (mut sink, mut stream) = socket.split();

    let (handle, mut events) = ConnectionHandle::new();
    let (replies, mut pending_replies) = unbounded_channel::<ServerEvent>();

    info!("Socket connection {} opened", handle.id);

    let send_task = tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                Some(event) = events.recv() => ServerEvent::from(event),
                Some(event) = pending_replies.recv() => event,
                else => break,
            };

            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(err) => {
                    warn!("Failed to serialize socket event: {}", err);
                    continue;
                }
            };

            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut gateway = Gateway {
        context,
        handle,
        user: None,
        replies,
    };

    if let Some(token) = token {
        gateway.identify(&token).await;
    }

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => gateway.handle_text(&text).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                debug!("Socket connection {} errored: {}", gateway.handle.id, err);
                break;
            }
        }
    }

    info!("Socket connection {} closed", gateway.handle.id);

    gateway.close();
    send_task.abort();
}

pub fn router() -> Router {
    Router::new().route("/", get(socket))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_client_events_parse() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "updateScore",
            "data": { "sessionId": "ABC234", "playerName": "alice", "playerScore": 7 }
        }))
        .expect("parses");

        match event {
            ClientEvent::UpdateScore {
                session_id,
                player_name,
                player_score,
            } => {
                assert_eq!(session_id, "ABC234");
                assert_eq!(player_name, "alice");
                assert_eq!(player_score, 7);
            }
            other => panic!("Unexpected event {:?}", other),
        }

        let event: ClientEvent = serde_json::from_value(json!({
            "event": "joinSession",
            "data": { "sessionId": "ABC234", "userId": 3 }
        }))
        .expect("parses");

        assert!(
            matches!(event, ClientEvent::JoinSession { user_id: 3, .. }),
            "join carries the user id"
        );
    }

    #[test]
    fn test_unknown_client_event_is_rejected() {
        let result = serde_json::from_str::<ClientEvent>(r#"{"event":"dance","data":{}}"#);
        assert!(result.is_err(), "unknown events do not parse");
    }

    #[test]
    fn test_server_event_frames() {
        let event = ServerEvent::from(CollabEvent::GameStarted {
            session_code: "ABC234".to_string(),
        });

        assert_eq!(
            serde_json::to_value(&event).expect("serializes"),
            json!({ "event": "gameStarted", "data": { "sessionId": "ABC234" } })
        );

        let event = ServerEvent::from(CollabEvent::FriendRequest {
            request_id: 1,
            from_id: 2,
            from_username: "bob".to_string(),
        });

        assert_eq!(
            serde_json::to_value(&event).expect("serializes"),
            json!({
                "event": "friendRequest",
                "data": { "requestId": 1, "fromId": 2, "fromUsername": "bob" }
            })
        );

        assert_eq!(
            serde_json::to_value(ServerEvent::error("Session not found")).expect("serializes"),
            json!({ "event": "error", "data": { "message": "Session not found" } })
        );
    }
}
