//! Persistence collaborators.
//!
//! The realtime core never talks to Postgres directly; it goes through
//! these traits so the registry can be backed by sqlx in production and
//! by in-memory maps in tests and local dev.

mod memory;
mod postgres;

pub use memory::{MemoryDraftStore, MemoryRoomStore};
pub use postgres::{PgDraftStore, PgRoomStore, MIGRATOR};

use crate::error::CollabError;
use crate::types::Draft;

/// Persisted room row: id, creator, last checkpointed snapshot.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RoomRecord {
    pub room_id: String,
    pub creator_id: i64,
    pub content: String,
}

/// Room persistence. `update_content` must support at-least-once
/// delivery under last-write-wins.
#[async_trait::async_trait]
pub trait RoomStore: Send + Sync {
    async fn create(&self, room: RoomRecord) -> Result<(), CollabError>;

    async fn find(&self, room_id: &str) -> Result<Option<RoomRecord>, CollabError>;

    /// Full replace of the room's snapshot. `RoomNotFound` when no such row.
    async fn update_content(&self, room_id: &str, content: &str) -> Result<(), CollabError>;
}

/// Draft persistence, keyed by owner. The realtime core only consumes the
/// payloads this store returns; the draft UX lives outside this service.
#[async_trait::async_trait]
pub trait DraftStore: Send + Sync {
    async fn create(&self, user_id: i64, email: &str, content: &str)
        -> Result<Draft, CollabError>;

    async fn list(&self, user_id: i64) -> Result<Vec<Draft>, CollabError>;

    /// Delete a draft owned by `user_id`. `DraftNotFound` when no row
    /// matches both id and owner.
    async fn delete(&self, id: i64, user_id: i64) -> Result<(), CollabError>;
}
