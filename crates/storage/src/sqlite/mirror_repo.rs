use quiz_core::model::{ProgressKey, SessionSnapshot};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser};
use crate::repository::{ProgressMirrorRepository, StorageError};

#[async_trait::async_trait]
impl ProgressMirrorRepository for SqliteRepository {
    async fn save_mirror(
        &self,
        key: &ProgressKey,
        snapshot: &SessionSnapshot,
    ) -> Result<(), StorageError> {
        let body = serde_json::to_string(snapshot).map_err(ser)?;

        sqlx::query(
            r"
                INSERT INTO progress_mirror (
                    mirror_key, username, quiz_id, snapshot, status, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(mirror_key) DO UPDATE SET
                    snapshot = excluded.snapshot,
                    status = excluded.status,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(key.mirror_key())
        .bind(key.username.as_str())
        .bind(key.quiz_id.as_str())
        .bind(body)
        .bind(snapshot.status.as_str())
        .bind(snapshot.last_updated)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn load_mirror(&self, key: &ProgressKey) -> Result<Option<SessionSnapshot>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT snapshot
                FROM progress_mirror
                WHERE mirror_key = ?1
            ",
        )
        .bind(key.mirror_key())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let body: String = row.try_get("snapshot").map_err(ser)?;
        let snapshot = serde_json::from_str(&body).map_err(ser)?;
        Ok(Some(snapshot))
    }

    async fn purge_mirror(&self, key: &ProgressKey) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM progress_mirror WHERE mirror_key = ?1")
            .bind(key.mirror_key())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(res.rows_affected() > 0)
    }
}
