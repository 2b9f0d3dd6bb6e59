use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::notes::repo_types::{NewNote, Note};

const LIST_BY_OWNER_SQL: &str = r#"
    SELECT id, user_id, video_url, video_id, title, content, created_at, updated_at
      FROM study_notes
     WHERE user_id = $1
     ORDER BY created_at DESC, id DESC
"#;

#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn insert(&self, new: NewNote) -> anyhow::Result<Note>;
    /// Notes owned by `user_id`, newest first.
    async fn list_by_owner(&self, user_id: Uuid) -> anyhow::Result<Vec<Note>>;
    /// Delete `note_id` only if it belongs to `user_id`. Returns whether a row went away.
    async fn delete_by_owner(&self, note_id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgNoteStore {
    db: PgPool,
}

impl PgNoteStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn insert(&self, new: NewNote) -> anyhow::Result<Note> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO study_notes (user_id, video_url, video_id, title, content)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, video_url, video_id, title, content, created_at, updated_at
            "#,
        )
        .bind(new.user_id)
        .bind(&new.video_url)
        .bind(&new.video_id)
        .bind(&new.title)
        .bind(&new.content)
        .fetch_one(&self.db)
        .await
        .context("insert study note")?;
        Ok(note)
    }

    async fn list_by_owner(&self, user_id: Uuid) -> anyhow::Result<Vec<Note>> {
        let rows = sqlx::query_as::<_, Note>(LIST_BY_OWNER_SQL)
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list study notes by owner")?;
        Ok(rows)
    }

    async fn delete_by_owner(&self, note_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            DELETE FROM study_notes
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(note_id)
        .bind(user_id)
        .execute(&self.db)
        .await
        .context("delete study note")?;
        Ok(res.rows_affected() > 0)
    }
}
