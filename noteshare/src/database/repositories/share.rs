//! Share record repository.
//!
//! Every read here only considers active records (`deleted_at IS NULL`).

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::push_id_list;
use crate::Result;
use crate::database::models::{ExistingShare, ShareSummaryRow, UserNoteDbModel};
use crate::database::time::now_ms;

/// Share record repository trait.
#[async_trait]
pub trait ShareRepository: Send + Sync {
    /// Insert one active share per recipient as a single atomic batch.
    ///
    /// Fails with [`crate::Error::Conflict`] if any recipient already holds an
    /// active share of the note; in that case nothing is inserted.
    async fn create_many(&self, note_id: i64, user_ids: &[i64]) -> Result<u64>;

    /// Active shares of `note_id` held by any of `user_ids`.
    async fn find_active_shares(&self, note_id: i64, user_ids: &[i64])
    -> Result<Vec<ExistingShare>>;

    /// Active shares received by `user_id` for any of `note_ids`.
    async fn find_active_received(
        &self,
        user_id: i64,
        note_ids: &[i64],
    ) -> Result<Vec<UserNoteDbModel>>;

    /// Soft-delete the active shares received by `user_id` for `note_ids`.
    async fn soft_delete(&self, user_id: i64, note_ids: &[i64]) -> Result<u64>;

    /// Active shares created at or after `since_ms`, flattened with recipient and note type.
    async fn summary_since(&self, since_ms: i64) -> Result<Vec<ShareSummaryRow>>;
}

/// SQLx implementation of ShareRepository.
pub struct SqlxShareRepository {
    pool: SqlitePool,
}

impl SqlxShareRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShareRepository for SqlxShareRepository {
    async fn create_many(&self, note_id: i64, user_ids: &[i64]) -> Result<u64> {
        if user_ids.is_empty() {
            return Ok(0);
        }

        let now = now_ms();
        // A single multi-row INSERT: SQLite applies all rows or none.
        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("INSERT INTO user_notes (user_id, note_id, created_at) ");
        builder.push_values(user_ids, |mut row, user_id| {
            row.push_bind(*user_id).push_bind(note_id).push_bind(now);
        });

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn find_active_shares(
        &self,
        note_id: i64,
        user_ids: &[i64],
    ) -> Result<Vec<ExistingShare>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            r#"
            SELECT un.user_id, u.username
            FROM user_notes un
            JOIN users u ON u.id = un.user_id
            WHERE un.deleted_at IS NULL AND un.note_id = "#,
        );
        builder.push_bind(note_id);
        builder.push(" AND un.user_id IN ");
        push_id_list(&mut builder, user_ids);
        builder.push(" ORDER BY un.user_id");

        let rows = builder
            .build_query_as::<ExistingShare>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_active_received(
        &self,
        user_id: i64,
        note_ids: &[i64],
    ) -> Result<Vec<UserNoteDbModel>> {
        if note_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT * FROM user_notes WHERE deleted_at IS NULL AND user_id = ",
        );
        builder.push_bind(user_id);
        builder.push(" AND note_id IN ");
        push_id_list(&mut builder, note_ids);

        let rows = builder
            .build_query_as::<UserNoteDbModel>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn soft_delete(&self, user_id: i64, note_ids: &[i64]) -> Result<u64> {
        if note_ids.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("UPDATE user_notes SET deleted_at = ");
        builder.push_bind(now_ms());
        builder.push(" WHERE deleted_at IS NULL AND user_id = ");
        builder.push_bind(user_id);
        builder.push(" AND note_id IN ");
        push_id_list(&mut builder, note_ids);

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn summary_since(&self, since_ms: i64) -> Result<Vec<ShareSummaryRow>> {
        let rows = sqlx::query_as::<_, ShareSummaryRow>(
            r#"
            SELECT un.user_id, u.email, u.username, t.name AS type_name
            FROM user_notes un
            JOIN users u ON u.id = un.user_id
            JOIN notes n ON n.id = un.note_id
            JOIN note_types t ON t.id = n.type_id
            WHERE un.deleted_at IS NULL AND un.created_at >= ?
            ORDER BY un.user_id, un.created_at, un.id
            "#,
        )
        .bind(since_ms)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
