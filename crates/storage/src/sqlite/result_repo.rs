use quiz_core::model::{QuizId, QuizResult, Username};

use super::SqliteRepository;
use super::mapping::{conn, i64_from_usize, map_result_row, ser};
use crate::repository::{QuizResultRepository, QuizResultRow, StorageError};

#[async_trait::async_trait]
impl QuizResultRepository for SqliteRepository {
    async fn append_result(
        &self,
        username: &Username,
        result: &QuizResult,
    ) -> Result<i64, StorageError> {
        let history = serde_json::to_string(&result.question_history).map_err(ser)?;

        let res = sqlx::query(
            r"
                INSERT INTO quiz_results (
                    username, quiz_id, score, experience,
                    questions_answered, status, question_history, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(username.as_str())
        .bind(result.quiz_name.as_str())
        .bind(i64::from(result.score))
        .bind(i64::from(result.experience))
        .bind(i64_from_usize("questions_answered", result.questions_answered)?)
        .bind(result.status.as_str())
        .bind(history)
        .bind(result.completed_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn list_results(
        &self,
        username: &Username,
        quiz_id: Option<&QuizId>,
        limit: u32,
    ) -> Result<Vec<QuizResultRow>, StorageError> {
        let mut sql = String::from(
            r"
                SELECT
                    id, username, quiz_id, score, experience,
                    questions_answered, status, question_history, completed_at
                FROM quiz_results
                WHERE username = ?1
            ",
        );
        if quiz_id.is_some() {
            sql.push_str(" AND quiz_id = ?2 ORDER BY completed_at DESC, id DESC LIMIT ?3");
        } else {
            sql.push_str(" ORDER BY completed_at DESC, id DESC LIMIT ?2");
        }

        let mut query = sqlx::query(&sql).bind(username.as_str());
        if let Some(quiz_id) = quiz_id {
            query = query.bind(quiz_id.as_str());
        }
        query = query.bind(i64::from(limit));

        let rows = query.fetch_all(&self.pool).await.map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_result_row(&row)?);
        }
        Ok(out)
    }
}
