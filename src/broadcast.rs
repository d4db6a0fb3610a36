//! Broadcast router — edit relay among room peers plus the persistence
//! checkpoint.
//!
//! The relay happens first and synchronously against the membership map;
//! the checkpoint is spawned fire-and-forget afterwards. Checkpoint order
//! and broadcast order are deliberately uncoupled: two racing senders
//! persist whichever full snapshot lands last, independent of which delta
//! reached peers last. Low broadcast latency is favored over strict
//! persistence consistency.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::rooms::RoomRegistry;
use crate::session::{ConnectionId, SessionManager};
use crate::types::{EditMsg, ServerMessage};

#[derive(Clone)]
pub struct BroadcastRouter {
    sessions: Arc<SessionManager>,
    registry: RoomRegistry,
}

impl BroadcastRouter {
    pub fn new(sessions: Arc<SessionManager>, registry: RoomRegistry) -> Self {
        Self { sessions, registry }
    }

    /// Relay an edit to every other member of the room, then persist the
    /// sender's full snapshot.
    ///
    /// Edits from connections that are not members of the room are dropped
    /// without touching peers or storage. The sender never sees its own
    /// delta echoed back.
    ///
    /// Returns the checkpoint task handle so callers that need to observe
    /// persistence (tests) can await it; the socket loop drops it.
    pub fn on_edit(&self, sender: ConnectionId, edit: EditMsg) -> Option<JoinHandle<()>> {
        let EditMsg {
            room_id,
            delta,
            content,
        } = edit;

        if !self.sessions.is_member(sender, &room_id) {
            warn!(conn_id = %sender, room_id = %room_id, "edit from non-member dropped");
            return None;
        }

        let delivered =
            self.sessions
                .relay_to_peers(&room_id, sender, &ServerMessage::ReceiveChanges { delta });
        debug!(room_id = %room_id, peers = delivered, "edit relayed");

        // Checkpoint failures are logged only: the broadcast already
        // happened and the sender must not be disconnected over storage.
        let registry = self.registry.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = registry.checkpoint(&room_id, &content).await {
                warn!(room_id = %room_id, "checkpoint failed: {e}");
            }
        }))
    }
}
