//! Wire protocol types for the collaboration socket.
//!
//! Covers: create_room, join_room, edit (client → server) and
//! room_created, load_document, room_error, receive_changes,
//! draft_saved, draft_deleted (server → client).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════
// Identity
// ═══════════════════════════════════════════════════════════════

/// Caller identity extracted from a verified bearer token.
/// Bound once per connection; never persisted by this service
/// (the external user store owns it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

// ═══════════════════════════════════════════════════════════════
// Client → Server messages
// ═══════════════════════════════════════════════════════════════

/// Top-level envelope from client.
/// The `type` field is used to dispatch.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom,
    JoinRoom { room_id: String },
    Edit(EditMsg),
}

/// An edit event: an opaque delta for the peers plus the sender's
/// full document snapshot for the persistence checkpoint.
#[derive(Debug, Deserialize)]
pub struct EditMsg {
    pub room_id: String,
    pub delta: serde_json::Value,
    pub content: String,
}

// ═══════════════════════════════════════════════════════════════
// Server → Client messages
// ═══════════════════════════════════════════════════════════════

/// Top-level envelope to client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Ack for create_room.
    RoomCreated { room_id: String },
    /// Sent to the joining connection with the room's last snapshot.
    LoadDocument { content: String },
    /// Room-scoped failure; the connection stays up and may retry.
    RoomError { message: String },
    /// An edit relayed from another room member.
    ReceiveChanges { delta: serde_json::Value },
    /// Admin fan-out: a draft was durably saved.
    DraftSaved { draft: Draft },
    /// Admin fan-out: a draft was deleted.
    DraftDeleted { id: i64 },
}

// ═══════════════════════════════════════════════════════════════
// Drafts
// ═══════════════════════════════════════════════════════════════

/// A saved letter draft. The author email is denormalized so the
/// admin fan-out payload needs no join against the user store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Draft {
    pub id: i64,
    pub user_id: i64,
    pub email: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
