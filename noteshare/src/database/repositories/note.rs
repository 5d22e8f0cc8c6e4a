//! Note repository for database operations.

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::push_id_list;
use crate::Result;
use crate::database::models::{NewNote, NoteDbModel, NoteTypeDbModel, TimelineNoteRow};
use crate::database::time::now_ms;

/// Filter and page for a recipient's timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineQuery {
    /// Recipient whose active shares are listed.
    pub user_id: i64,
    /// Notes created before this instant (epoch ms) are outside the window.
    pub since_ms: i64,
    /// Restrict to these note types; empty means all enabled types.
    pub type_ids: Vec<i64>,
    pub limit: i64,
    pub offset: i64,
}

/// Note repository trait.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Create a new note.
    async fn create(&self, note: &NewNote) -> Result<NoteDbModel>;

    /// Get a note by its ID.
    async fn get_by_id(&self, id: i64) -> Result<Option<NoteDbModel>>;

    /// List notes authored by `sender_id`, newest first.
    async fn list_by_sender(&self, sender_id: i64, limit: i64, offset: i64)
    -> Result<Vec<NoteDbModel>>;

    /// Find a note type by its ID.
    async fn find_type_by_id(&self, id: i64) -> Result<Option<NoteTypeDbModel>>;

    /// Notes actively shared with a user, newest first.
    ///
    /// Soft-deleted shares, notes of disabled types and notes older than the
    /// query window are excluded.
    async fn timeline(&self, query: &TimelineQuery) -> Result<Vec<TimelineNoteRow>>;
}

/// SQLx implementation of NoteRepository.
pub struct SqlxNoteRepository {
    pool: SqlitePool,
}

impl SqlxNoteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for SqlxNoteRepository {
    async fn create(&self, note: &NewNote) -> Result<NoteDbModel> {
        let created = sqlx::query_as::<_, NoteDbModel>(
            r#"
            INSERT INTO notes (sender_id, title, message, type_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(note.sender_id)
        .bind(&note.title)
        .bind(&note.message)
        .bind(note.type_id)
        .bind(now_ms())
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<NoteDbModel>> {
        let note = sqlx::query_as::<_, NoteDbModel>("SELECT * FROM notes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(note)
    }

    async fn list_by_sender(
        &self,
        sender_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NoteDbModel>> {
        let notes = sqlx::query_as::<_, NoteDbModel>(
            "SELECT * FROM notes WHERE sender_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(sender_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(notes)
    }

    async fn find_type_by_id(&self, id: i64) -> Result<Option<NoteTypeDbModel>> {
        let note_type = sqlx::query_as::<_, NoteTypeDbModel>("SELECT * FROM note_types WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(note_type)
    }

    async fn timeline(&self, query: &TimelineQuery) -> Result<Vec<TimelineNoteRow>> {
        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            r#"
            SELECT
                n.id AS note_id,
                n.title,
                n.message,
                n.type_id,
                t.name AS type_name,
                n.sender_id,
                u.username AS sender_username,
                n.created_at,
                un.created_at AS shared_at
            FROM user_notes un
            JOIN notes n ON n.id = un.note_id
            JOIN note_types t ON t.id = n.type_id
            JOIN users u ON u.id = n.sender_id
            WHERE un.deleted_at IS NULL
              AND t.disabled = FALSE
              AND un.user_id = "#,
        );
        builder.push_bind(query.user_id);
        builder.push(" AND n.created_at >= ");
        builder.push_bind(query.since_ms);

        if !query.type_ids.is_empty() {
            builder.push(" AND n.type_id IN ");
            push_id_list(&mut builder, &query.type_ids);
        }

        builder.push(" ORDER BY n.created_at DESC, n.id DESC LIMIT ");
        builder.push_bind(query.limit);
        builder.push(" OFFSET ");
        builder.push_bind(query.offset);

        let rows = builder
            .build_query_as::<TimelineNoteRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
