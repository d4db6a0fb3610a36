//! In-memory stores for tests and local development.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use dashmap::DashMap;

use crate::error::CollabError;
use crate::types::Draft;

use super::{DraftStore, RoomRecord, RoomStore};

#[derive(Default)]
pub struct MemoryRoomStore {
    rooms: DashMap<String, RoomRecord>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RoomStore for MemoryRoomStore {
    async fn create(&self, room: RoomRecord) -> Result<(), CollabError> {
        self.rooms.insert(room.room_id.clone(), room);
        Ok(())
    }

    async fn find(&self, room_id: &str) -> Result<Option<RoomRecord>, CollabError> {
        Ok(self.rooms.get(room_id).map(|r| r.value().clone()))
    }

    async fn update_content(&self, room_id: &str, content: &str) -> Result<(), CollabError> {
        match self.rooms.get_mut(room_id) {
            Some(mut room) => {
                room.content = content.to_string();
                Ok(())
            }
            None => Err(CollabError::RoomNotFound(room_id.into())),
        }
    }
}

#[derive(Default)]
pub struct MemoryDraftStore {
    drafts: DashMap<i64, Draft>,
    next_id: AtomicI64,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl DraftStore for MemoryDraftStore {
    async fn create(
        &self,
        user_id: i64,
        email: &str,
        content: &str,
    ) -> Result<Draft, CollabError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let draft = Draft {
            id,
            user_id,
            email: email.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.drafts.insert(id, draft.clone());
        Ok(draft)
    }

    async fn list(&self, user_id: i64) -> Result<Vec<Draft>, CollabError> {
        let mut drafts: Vec<Draft> = self
            .drafts
            .iter()
            .filter(|d| d.user_id == user_id)
            .map(|d| d.value().clone())
            .collect();
        drafts.sort_by_key(|d| std::cmp::Reverse(d.created_at));
        Ok(drafts)
    }

    async fn delete(&self, id: i64, user_id: i64) -> Result<(), CollabError> {
        let removed = self
            .drafts
            .remove_if(&id, |_, draft| draft.user_id == user_id);
        if removed.is_none() {
            return Err(CollabError::DraftNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn draft_ids_are_sequential() {
        let store = MemoryDraftStore::new();
        let a = store.create(1, "a@example.com", "first").await.unwrap();
        let b = store.create(1, "a@example.com", "second").await.unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn delete_requires_matching_owner() {
        let store = MemoryDraftStore::new();
        let draft = store.create(1, "a@example.com", "mine").await.unwrap();

        assert!(matches!(
            store.delete(draft.id, 2).await,
            Err(CollabError::DraftNotFound(_))
        ));
        store.delete(draft.id, 1).await.unwrap();
        assert!(store.list(1).await.unwrap().is_empty());
    }
}
