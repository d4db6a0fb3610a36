//! Postgres-backed stores.
//!
//! Uses sqlx with compile-time-unchecked queries (runtime-checked)
//! to avoid needing a live DB at compile time.

use sqlx::PgPool;

use crate::error::CollabError;
use crate::types::Draft;

use super::{DraftStore, RoomRecord, RoomStore};

/// Embedded schema migrations, applied at startup. Migration files are
/// multi-statement; the migrator runs them outside the prepared-statement
/// protocol, which rejects more than one command per statement.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct PgRoomStore {
    pool: PgPool,
}

impl PgRoomStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RoomStore for PgRoomStore {
    async fn create(&self, room: RoomRecord) -> Result<(), CollabError> {
        sqlx::query("INSERT INTO rooms (room_id, creator_id, content) VALUES ($1, $2, $3)")
            .bind(&room.room_id)
            .bind(room.creator_id)
            .bind(&room.content)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find(&self, room_id: &str) -> Result<Option<RoomRecord>, CollabError> {
        let row = sqlx::query_as::<_, RoomRecord>(
            "SELECT room_id, creator_id, content FROM rooms WHERE room_id = $1",
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_content(&self, room_id: &str, content: &str) -> Result<(), CollabError> {
        let result = sqlx::query("UPDATE rooms SET content = $2 WHERE room_id = $1")
            .bind(room_id)
            .bind(content)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CollabError::RoomNotFound(room_id.into()));
        }
        Ok(())
    }
}

pub struct PgDraftStore {
    pool: PgPool,
}

impl PgDraftStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DraftStore for PgDraftStore {
    async fn create(
        &self,
        user_id: i64,
        email: &str,
        content: &str,
    ) -> Result<Draft, CollabError> {
        let draft = sqlx::query_as::<_, Draft>(
            r#"
            INSERT INTO drafts (user_id, email, content)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, email, content, created_at
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(draft)
    }

    async fn list(&self, user_id: i64) -> Result<Vec<Draft>, CollabError> {
        let drafts = sqlx::query_as::<_, Draft>(
            r#"
            SELECT id, user_id, email, content, created_at
            FROM drafts
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(drafts)
    }

    async fn delete(&self, id: i64, user_id: i64) -> Result<(), CollabError> {
        let result = sqlx::query("DELETE FROM drafts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CollabError::DraftNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrator_embeds_the_full_schema() {
        let init = MIGRATOR
            .migrations
            .iter()
            .find(|m| m.description.as_ref() == "init")
            .expect("init migration must be embedded");

        assert_eq!(init.version, 1);
        assert!(init.sql.contains("CREATE TABLE IF NOT EXISTS rooms"));
        assert!(init.sql.contains("CREATE TABLE IF NOT EXISTS drafts"));
        assert!(init.sql.contains("drafts_user_idx"));
    }
}
