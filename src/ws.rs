//! WebSocket handler — the realtime entry point.
//!
//! Flow per connection:
//! 1. Verify the bearer token from the upgrade request (refused with 401
//!    before any socket exists on failure)
//! 2. Register the session; admins are enrolled in the fan-out channel
//! 3. Enter message loop: create_room / join_room / edit
//! 4. On disconnect: unregister, stopping any further relay to this peer

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::CollabError;
use crate::session::ConnectionId;
use crate::state::AppState;
use crate::types::{ClientMessage, Identity, ServerMessage};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    token: Option<String>,
}

/// Axum handler for GET /ws — verifies the token, then upgrades.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(token) = params.token else {
        warn!("ws upgrade refused: no token provided");
        return (StatusCode::UNAUTHORIZED, "no token provided").into_response();
    };

    let identity = match state.verifier.verify(&token) {
        Ok(identity) => identity,
        Err(e) => {
            warn!("ws upgrade refused: {e}");
            return (StatusCode::UNAUTHORIZED, e.to_string()).into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, identity))
        .into_response()
}

/// Per-connection loop. The identity is already verified and immutable
/// for the connection's lifetime.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, identity: Identity) {
    let conn_id = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();

    // All outbound traffic (acks, relays, fan-out) goes through one
    // unbounded queue per connection; a slow socket never blocks a sender.
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.sessions.register(conn_id, identity.clone(), tx);

    info!(conn_id = %conn_id, user = %identity.email, role = ?identity.role, "connected");

    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!("outbound serialize error: {e}");
                    continue;
                }
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Err(e) = handle_client_message(&text, conn_id, &identity, &state).await {
                    warn!(conn_id = %conn_id, "message error: {e}");
                    // Room-scoped error; the connection stays up.
                    state.sessions.send_to(
                        conn_id,
                        ServerMessage::RoomError {
                            message: e.to_string(),
                        },
                    );
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_)) => { /* axum auto-pongs */ }
            Ok(_) => { /* binary frames ignored */ }
            Err(e) => {
                warn!(conn_id = %conn_id, "ws recv error: {e}");
                break;
            }
        }
    }

    // Synchronous removal: no further relay targets this connection.
    // In-flight checkpoints already spawned are left to complete.
    state.sessions.unregister(conn_id);
    writer.abort();
    info!(conn_id = %conn_id, user = %identity.email, "disconnected");
}

/// Dispatch one inbound frame. Returns Err only for malformed frames;
/// domain failures (unknown room, storage trouble) are answered with
/// `room_error` directly and do not bubble.
pub async fn handle_client_message(
    text: &str,
    conn_id: ConnectionId,
    identity: &Identity,
    state: &Arc<AppState>,
) -> Result<(), CollabError> {
    let msg: ClientMessage = serde_json::from_str(text)
        .map_err(|e| CollabError::Protocol(format!("invalid message: {e}")))?;

    match msg {
        ClientMessage::CreateRoom => match state.registry.create(identity).await {
            Ok(room_id) => {
                state
                    .sessions
                    .send_to(conn_id, ServerMessage::RoomCreated { room_id });
            }
            Err(e) => {
                error!(conn_id = %conn_id, "room create failed: {e}");
                state.sessions.send_to(
                    conn_id,
                    ServerMessage::RoomError {
                        message: "Failed to create room".into(),
                    },
                );
            }
        },
        ClientMessage::JoinRoom { room_id } => match state.registry.lookup(&room_id).await {
            Ok(room) => {
                state.sessions.join_room(conn_id, &room_id);
                info!(conn_id = %conn_id, user = %identity.email, room_id = %room_id, "joined room");
                state.sessions.send_to(
                    conn_id,
                    ServerMessage::LoadDocument {
                        content: room.content,
                    },
                );
            }
            Err(CollabError::RoomNotFound(_)) => {
                state.sessions.send_to(
                    conn_id,
                    ServerMessage::RoomError {
                        message: "Invalid room ID".into(),
                    },
                );
            }
            // Storage trouble during lookup fails closed, same as an
            // unknown room from the caller's perspective.
            Err(e) => {
                error!(conn_id = %conn_id, room_id = %room_id, "room lookup failed: {e}");
                state.sessions.send_to(
                    conn_id,
                    ServerMessage::RoomError {
                        message: "Failed to join room".into(),
                    },
                );
            }
        },
        ClientMessage::Edit(edit) => {
            // Relay is synchronous; the checkpoint handle is dropped here
            // (fire-and-forget persistence).
            let _ = state.router.on_edit(conn_id, edit);
        }
    }

    Ok(())
}
