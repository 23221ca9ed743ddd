use quiz_core::model::{AnsweredQuestion, QuizId, QuizResult, QuizStatus, Username};
use sqlx::Row;

use crate::repository::{QuizResultRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn usize_from_i64(field: &'static str, v: i64) -> Result<usize, StorageError> {
    usize::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn i64_from_usize(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn parse_status(raw: &str) -> Result<QuizStatus, StorageError> {
    QuizStatus::parse(raw)
        .ok_or_else(|| StorageError::Serialization(format!("invalid status: {raw}")))
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizResultRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let username = Username::new(row.try_get::<String, _>("username").map_err(ser)?).map_err(ser)?;
    let quiz_name = QuizId::parse(&row.try_get::<String, _>("quiz_id").map_err(ser)?).map_err(ser)?;
    let history_json: String = row.try_get("question_history").map_err(ser)?;
    let question_history: Vec<AnsweredQuestion> =
        serde_json::from_str(&history_json).map_err(ser)?;

    let result = QuizResult {
        quiz_name,
        score: u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
        experience: u32_from_i64(
            "experience",
            row.try_get::<i64, _>("experience").map_err(ser)?,
        )?,
        question_history,
        questions_answered: usize_from_i64(
            "questions_answered",
            row.try_get::<i64, _>("questions_answered").map_err(ser)?,
        )?,
        status: parse_status(&row.try_get::<String, _>("status").map_err(ser)?)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
    };

    Ok(QuizResultRow {
        id,
        username,
        result,
    })
}
