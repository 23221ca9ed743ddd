use quiz_core::model::QuizStatus;
use services::QuizResultRow;

use crate::vm::time_fmt::format_datetime;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultRowVm {
    pub id: i64,
    pub quiz_id: String,
    pub completed_at_str: String,
    pub status_label: &'static str,
    pub score: u32,
    pub experience: u32,
    pub answered: usize,
}

impl From<&QuizResultRow> for ResultRowVm {
    fn from(row: &QuizResultRow) -> Self {
        let result = &row.result;
        Self {
            id: row.id,
            quiz_id: result.quiz_name.to_string(),
            completed_at_str: format_datetime(result.completed_at),
            status_label: match result.status {
                QuizStatus::Completed => "Completed",
                QuizStatus::Failed => "Failed",
                QuizStatus::InProgress => "In progress",
            },
            score: result.score,
            experience: result.experience,
            answered: result.questions_answered,
        }
    }
}

#[must_use]
pub fn map_result_rows(rows: &[QuizResultRow]) -> Vec<ResultRowVm> {
    rows.iter().map(ResultRowVm::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuizId, QuizResult, Session, Username};
    use quiz_core::time::fixed_now;

    #[test]
    fn rows_carry_formatted_date_and_status() {
        let quiz_id = QuizId::parse("TimeManagement").unwrap();
        let mut result = QuizResult::from_session(&quiz_id, &Session::new(), fixed_now());
        result.status = QuizStatus::Failed;
        let row = QuizResultRow {
            id: 7,
            username: Username::new("alice").unwrap(),
            result,
        };

        let vms = map_result_rows(&[row]);
        assert_eq!(vms.len(), 1);
        assert_eq!(vms[0].id, 7);
        assert_eq!(vms[0].quiz_id, "time-management");
        assert_eq!(vms[0].status_label, "Failed");
        assert_eq!(vms[0].completed_at_str, "2023-11-14 22:13 UTC");
        assert_eq!(vms[0].answered, 0);
    }
}
