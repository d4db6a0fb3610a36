//! Room registry — validity checks, creation, and snapshot checkpoints.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::error::CollabError;
use crate::store::{RoomRecord, RoomStore};
use crate::types::Identity;

/// Durable mapping from room id to its latest snapshot and creator.
///
/// Room ids are opaque on the wire; internally they are UUIDv4 strings,
/// so collisions are negligible. Any authenticated connection may join
/// any valid room id — creator-only joins are deliberately not enforced.
#[derive(Clone)]
pub struct RoomRegistry {
    store: Arc<dyn RoomStore>,
}

impl RoomRegistry {
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self { store }
    }

    /// Create a room with empty content. The caller becomes the creator.
    pub async fn create(&self, creator: &Identity) -> Result<String, CollabError> {
        let room_id = Uuid::new_v4().to_string();
        self.store
            .create(RoomRecord {
                room_id: room_id.clone(),
                creator_id: creator.id,
                content: String::new(),
            })
            .await?;
        info!(room_id = %room_id, creator = %creator.email, "room created");
        Ok(room_id)
    }

    /// Look up a room; unknown ids yield `RoomNotFound`.
    pub async fn lookup(&self, room_id: &str) -> Result<RoomRecord, CollabError> {
        self.store
            .find(room_id)
            .await?
            .ok_or_else(|| CollabError::RoomNotFound(room_id.into()))
    }

    /// Replace the room's persisted snapshot. Last-write-wins; no
    /// optimistic-concurrency check.
    pub async fn checkpoint(&self, room_id: &str, content: &str) -> Result<(), CollabError> {
        self.store.update_content(room_id, content).await
    }
}
