use std::sync::Arc;

use chrono::{DateTime, Utc};
use quiz_core::model::{QuestionBank, QuizId, QuizResult, QuizStatus, Scenario, Session};
use quiz_core::quiz::{AnswerOutcome, QuizConfig, TOTAL_QUESTIONS, select_level};

use super::progress::RunProgress;
use crate::catalog::QuizEntry;

/// One user's attempt at one quiz.
///
/// Owns the [`Session`] exclusively; all mutation goes through
/// [`QuizService`](super::QuizService) so every answer is persisted before the
/// next scenario is shown.
#[derive(Debug, Clone)]
pub struct QuizRun {
    entry: QuizEntry,
    pub(super) session: Session,
    pub(super) question_shown_at: DateTime<Utc>,
    pub(super) last_outcome: Option<AnswerOutcome>,
    pub(super) result: Option<QuizResult>,
}

impl QuizRun {
    pub(super) fn new(entry: QuizEntry, session: Session, now: DateTime<Utc>) -> Self {
        Self {
            entry,
            session,
            question_shown_at: now,
            last_outcome: None,
            result: None,
        }
    }

    #[must_use]
    pub fn quiz_id(&self) -> &QuizId {
        self.entry.quiz_id()
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.entry.title()
    }

    #[must_use]
    pub fn bank(&self) -> &Arc<QuestionBank> {
        &self.entry.bank
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.entry.config
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn status(&self) -> QuizStatus {
        self.session.status()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.session.status().is_terminal()
    }

    /// Scenario awaiting an answer, `None` once the run is over.
    #[must_use]
    pub fn current_scenario(&self) -> Option<&Scenario> {
        if self.is_finished() {
            return None;
        }
        self.entry.bank.scenario_for(self.session.answered_count())
    }

    #[must_use]
    pub fn progress(&self) -> RunProgress {
        let answered = self.session.answered_count();
        RunProgress {
            answered,
            total: TOTAL_QUESTIONS,
            level: if self.is_finished() {
                None
            } else {
                select_level(answered).map(|slot| slot.level)
            },
            experience: self.session.experience(),
            max_xp: self.entry.config.max_xp,
            correct: self.session.correct_count(),
            status: self.session.status(),
        }
    }

    /// Outcome of the most recent answer in this run.
    #[must_use]
    pub fn last_outcome(&self) -> Option<&AnswerOutcome> {
        self.last_outcome.as_ref()
    }

    /// Final result, set once the run reached a terminal status.
    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn question_shown_at(&self) -> DateTime<Utc> {
        self.question_shown_at
    }
}
